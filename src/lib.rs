pub mod app;
pub mod app_config;
pub mod bybit;
pub mod dashboard;
pub mod error;
pub mod funding;
pub mod job;
pub mod snapshot;
pub mod storage;
pub mod time_util;

pub use error::{AppError, AppResult};

pub const ENVIRONMENT_LOCAL: &str = "local";
