pub mod error;
pub mod service;

pub use error::{AppError, Result};
pub use service::{Reader, Refresh};
