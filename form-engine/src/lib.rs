//! Form schema engine for the multi-step intake form builder
//!
//! This crate holds the pure, storage-agnostic logic behind the intake form:
//! the step document stored in the configuration record's schema column, the
//! registry of admin-defined fields, fixed-field label overrides, and the
//! conditional visibility rules evaluated when a form is filled out.
//!
//! # Key Features
//!
//! - **Schema Codec**: lenient read/write of the `steps` array with
//!   normalization and default seeding
//! - **Step Layout**: add, move, rename and delete steps while keeping orders
//!   contiguous
//! - **Field Registry**: stable derived field names, soft delete and
//!   reactivation, step cascade
//! - **Conditional Visibility**: show/hide evaluation for dependent fields
//! - **Submission Mapping**: posted form values mapped back onto field names
//!
//! # Example
//!
//! ```rust
//! use form_engine::{schema, registry::FieldRegistry, field::FieldDraft};
//!
//! let (schema_json, steps) = schema::ensure_seeded_default_steps(None);
//! assert_eq!(steps.len(), 3);
//!
//! let mut registry = FieldRegistry::default();
//! let outcome = registry
//!     .add(FieldDraft::new("Preferred pharmacy", "text", 1), "admin")
//!     .unwrap();
//! assert_eq!(outcome.field().field_name, "additional_preferred_pharmacy");
//! # let _ = schema_json;
//! ```

pub mod conditional;
pub mod error;
pub mod field;
pub mod labels;
pub mod layout;
pub mod registry;
pub mod schema;
pub mod stats;
pub mod step;
pub mod submission;

pub use error::{FormError, FormResult};
pub use field::{ConditionalLogic, Field, FieldDraft, FieldOption, InputType};
pub use labels::FieldLabels;
pub use registry::FieldRegistry;
pub use step::{Step, StepGroup};
