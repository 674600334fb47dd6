//! Persistence layer for the intake form builder
//!
//! Everything lives in one table, `intake_forms`. One row flagged
//! `is_config` holds the form configuration as JSON text columns (steps,
//! fields, label overrides) plus a version counter. All other rows are
//! submissions carrying a JSON dictionary of submitted values.
//!
//! # Key Features
//!
//! - **Store Trait**: [`IntakeFormStore`] is the only seam the server talks to
//! - **Postgres**: [`PostgresIntakeStore`] on a sqlx pool with bundled migrations
//! - **In-Memory**: [`InMemoryIntakeStore`] for development and tests
//! - **Soft Delete**: submissions are flagged, never removed
//!
//! # Example Usage
//!
//! ```rust
//! use database_layer::{InMemoryIntakeStore, IntakeFormRecord, IntakeFormStore};
//!
//! # async fn demo() -> database_layer::DatabaseResult<()> {
//! let store = InMemoryIntakeStore::new();
//! let config = IntakeFormRecord::new_config("{}".into(), "[]".into(), chrono::Utc::now());
//! store.insert(&config).await?;
//! assert!(store.latest_config().await?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod memory;
pub mod models;
pub mod store;

pub use connection::{DatabasePool, PoolSettings};
pub use error::{DatabaseError, DatabaseResult};
pub use memory::InMemoryIntakeStore;
pub use models::{DailySubmissionCount, IntakeFormRecord};
pub use store::{IntakeFormStore, PostgresIntakeStore};
