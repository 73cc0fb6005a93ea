#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod review_service;

pub use pulse_core::Clock;

pub use config::{StoreConfig, StoreLocation};
pub use error::{ConfigError, ReviewServiceError, StoreOpenError};
pub use review_service::{AddOutcome, ReviewService, UpdateOutcome};
