use std::collections::BTreeMap;

use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};

use crate::config::RedactionConfig;

lazy_static! {
    static ref EMAIL_REGEX: Option<Regex> = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").ok();
    static ref PHONE_REGEX: Option<Regex> =
        Regex::new(r"(?:\+1[-.\s]?)?\(?\b[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b").ok();
    static ref SSN_REGEX: Option<Regex> = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").ok();
    static ref CREDIT_CARD_REGEX: Option<Regex> = Regex::new(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b").ok();
    static ref IP_REGEX: Option<Regex> = Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").ok();
}

/// Scrubs personal data out of submitted values before they are logged
#[derive(Debug, Clone, Default)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    /// Redacts recognised patterns inside free text
    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        // SSN and card numbers first so the phone pattern cannot eat their digits
        if self.config.redact_ssn {
            result = self.replace(&SSN_REGEX, &result, "SSN", |_| "***-**-****".to_string());
        }
        if self.config.redact_credit_cards {
            result = self.replace(&CREDIT_CARD_REGEX, &result, "CC", |_| "****-****-****-****".to_string());
        }
        if self.config.redact_emails {
            result = self.replace(&EMAIL_REGEX, &result, "EMAIL", mask_email);
        }
        if self.config.redact_phones {
            result = self.replace(&PHONE_REGEX, &result, "PHONE", |_| "(***) ***-****".to_string());
        }
        if self.config.redact_ip_addresses {
            result = self.replace(&IP_REGEX, &result, "IP", mask_ip);
        }

        result
    }

    /// Redacts one submitted value. Values of sensitive-looking fields are
    /// replaced entirely.
    pub fn redact_field(&self, field_name: &str, value: &str) -> String {
        if value.trim().is_empty() {
            return String::new();
        }
        if self.is_sensitive_field(field_name) {
            return format!("REDACTED[{}]", hash_value(value));
        }
        self.redact(value)
    }

    /// Redacted copy of a whole submission payload, suitable for a log field
    pub fn redact_submission(&self, data: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        data.iter()
            .map(|(name, value)| (name.clone(), self.redact_field(name, value)))
            .collect()
    }

    pub fn is_sensitive_field(&self, field_name: &str) -> bool {
        let lowered = field_name.to_lowercase();
        self.config
            .sensitive_field_markers
            .iter()
            .any(|marker| !marker.is_empty() && lowered.contains(&marker.to_lowercase()))
    }

    fn replace<F>(&self, pattern: &Option<Regex>, text: &str, tag: &str, mask: F) -> String
    where
        F: Fn(&str) -> String,
    {
        let Some(regex) = pattern else {
            return text.to_string();
        };
        regex
            .replace_all(text, |caps: &Captures| {
                let matched = caps.get(0).map_or("", |m| m.as_str());
                if self.config.hash_for_correlation {
                    format!("{tag}[{}]", hash_value(matched))
                } else {
                    mask(matched)
                }
            })
            .into_owned()
    }
}

fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = |s: &str| s.chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}***", first(local), first(domain))
        }
        None => "***@***".to_string(),
    }
}

fn mask_ip(ip: &str) -> String {
    let parts: Vec<&str> = ip.split('.').collect();
    match (parts.first(), parts.last()) {
        (Some(first), Some(last)) if parts.len() == 4 => format!("{first}.***.***.{last}"),
        _ => "***.***.***.***".to_string(),
    }
}

/// First 8 bytes of SHA-256, base64 encoded
fn hash_value(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    general_purpose::STANDARD.encode(digest.get(..8).unwrap_or_default())
}
