//! Configuration, paths, and logging for the Taskboard client.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_API_BASE_URL, DEFAULT_LOGIN_ROUTE, DEFAULT_LOG_LEVEL,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_with, parse_level, LogOptions};
pub use paths::Paths;
