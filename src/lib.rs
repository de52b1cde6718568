pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use crate::api::AppState;
pub use crate::config::AppConfig;
pub use crate::db::create_pool;
pub use crate::error::{AppError, AppResult};
pub use crate::service::{ImportService, SemaphoreService};
