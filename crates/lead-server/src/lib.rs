pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod server;
pub mod services;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::AppError;
pub use server::{app_config, run_server};
pub use state::AppState;
