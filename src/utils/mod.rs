// src/utils/mod.rs
pub mod debug;
pub mod diag;
pub mod error;
pub mod logging;

pub use error::AppError;
