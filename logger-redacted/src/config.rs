// Redaction configuration
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_ssn: bool,
    pub redact_credit_cards: bool,
    pub redact_ip_addresses: bool,
    /// Replace matches with a short hash instead of a mask, so the same value
    /// can be correlated across log lines
    pub hash_for_correlation: bool,
    /// Field names containing any of these (case-insensitive) are redacted
    /// wholesale, whatever their value looks like
    pub sensitive_field_markers: Vec<String>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_phones: true,
            redact_ssn: true,
            redact_credit_cards: true,
            redact_ip_addresses: true,
            hash_for_correlation: true,
            sensitive_field_markers: ["name", "birth", "dob", "address", "phone", "email", "ssn", "contact"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}
