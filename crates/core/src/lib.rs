pub mod config;
pub mod error;
pub mod telemetry;

pub use config::{AccountAssociation, Settings};
pub use error::AppError;
