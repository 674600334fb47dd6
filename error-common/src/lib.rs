//! Process-level error handling for the intake forms server
//!
//! Request handling has its own error types (`FormError` in the form
//! engine, `ApiError` in the server). This crate covers what can go wrong
//! while the process starts and serves: configuration, database
//! connectivity, binding the listener.
//!
//! # Example
//!
//! ```rust
//! use error_common::{IntakeError, Result};
//!
//! fn parse_port(raw: &str) -> Result<u16> {
//!     raw.parse()
//!         .map_err(|e| IntakeError::ConfigError(format!("invalid port {raw:?}: {e}")))
//! }
//!
//! assert!(parse_port("8080").is_ok());
//! assert!(parse_port("http").is_err());
//! ```

pub mod types;

pub use types::*;
