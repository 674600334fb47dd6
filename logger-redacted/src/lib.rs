//! PII redaction for intake submissions
//!
//! Submitted intake values are personal data. Anything from a submission
//! that ends up in a log line goes through [`PiiRedactor`] first.
//!
//! # Detected Data Types
//!
//! - **Email Addresses**: user@example.com → u***@e***
//! - **Phone Numbers**: (555) 123-4567 → (***) ***-****
//! - **SSN**: 123-45-6789 → ***-**-****
//! - **Credit Cards**: 4111-1111-1111-1111 → ****-****-****-****
//! - **IP Addresses**: 192.168.1.1 → 192.***.***.1
//! - **Sensitive Fields**: whole value replaced when the field name looks like
//!   a name, contact, birth date or address
//!
//! With `hash_for_correlation` on (the default) matches become a short hash
//! such as `EMAIL[q1w2e3r4t5y=]` instead of a mask.
//!
//! # Example
//!
//! ```rust
//! use logger_redacted::PiiRedactor;
//!
//! let redactor = PiiRedactor::default();
//! let line = redactor.redact_field("additional_notes", "call 555-123-4567");
//! assert!(line.starts_with("call PHONE["));
//! ```

pub mod config;
pub mod redactor;

pub use config::RedactionConfig;
pub use redactor::PiiRedactor;
