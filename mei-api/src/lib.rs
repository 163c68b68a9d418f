//! HTTP service for the Calcula MEI calculators, saved history and usage
//! quota.

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod routes;
pub mod state;

pub use app::build_state;
pub use config::AppConfig;
pub use routes::router;
pub use state::AppState;
