//! OrderPass API Library
//!
//! Real-time order relay between waiter and kitchen screens, plus web push
//! notifications.

pub mod config;
pub mod error;
pub mod push;
pub mod routes;
pub mod state;
pub mod store;
pub mod websocket;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
