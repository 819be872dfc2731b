mod health;
mod ws;

pub use health::health_router;
pub use ws::ws_router;
