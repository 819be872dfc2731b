pub mod config;
pub mod error;
pub mod portfolio;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use portfolio::Portfolio;
pub use types::*;
