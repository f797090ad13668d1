//! quizgrade-client: backend clients and configuration.
//!
//! Implements the `QuizBackend` trait over HTTP and as an in-memory mock,
//! and loads the `quizgrade.toml` configuration that selects between them.

pub mod config;
pub mod error;
pub mod http;
pub mod mock;
pub mod retry;

pub use config::{create_backend, load_config, BackendConfig, QuizgradeConfig};
pub use error::BackendError;
