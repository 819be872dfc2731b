pub mod stream;

pub use stream::{subscribe, BarSubscriber, SessionSummary, Subscription, Termination};
