//! Error handling for the iconhub library

pub mod types;

pub use types::{AppError, AppResult};
