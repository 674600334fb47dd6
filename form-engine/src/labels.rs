use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{FormError, FormResult};

pub const DEFAULT_LABELS: [(&str, &str); 15] = [
    ("FullName", "Full Name"),
    ("Age", "Age"),
    ("Gender", "Gender"),
    ("DateOfBirth", "Date of Birth"),
    ("HasAllergies", "Do you have allergies?"),
    ("AllergyDescription", "Allergy Description"),
    ("CurrentMedication", "Current Medication"),
    ("HeightCm", "Height (cm)"),
    ("WeightKg", "Weight (kg)"),
    ("ContactName", "Contact Name"),
    ("Relationship", "Relationship"),
    ("PhoneNumber", "Phone Number"),
    ("HasAlternativeContact", "Alternative Contact?"),
    ("AltContactName", "Alt Contact Name"),
    ("AltPhoneNumber", "Alt Phone Number"),
];

/// Display labels for the fixed intake fields, keyed by field key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct FieldLabels(BTreeMap<String, String>);

impl Default for FieldLabels {
    fn default() -> Self {
        Self(
            DEFAULT_LABELS
                .iter()
                .map(|(key, label)| ((*key).to_string(), (*label).to_string()))
                .collect(),
        )
    }
}

impl FieldLabels {
    /// Stored overrides layered over the defaults. Unreadable JSON falls back
    /// to the defaults alone.
    pub fn from_json(raw: Option<&str>) -> Self {
        let mut labels = Self::default();
        let stored = raw
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| serde_json::from_str::<BTreeMap<String, String>>(raw).ok())
            .unwrap_or_default();
        labels.0.extend(stored);
        labels
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    /// Label for `key`, or the key itself when unknown
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.0.get(key).map_or(key, String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// # Errors
    ///
    /// [`FormError::LabelKeyNotFound`] for a key that is not a known fixed
    /// field and [`FormError::InvalidRequest`] for a blank label.
    pub fn update(&mut self, key: &str, label: &str) -> FormResult<()> {
        let label = label.trim();
        if label.is_empty() {
            return Err(FormError::invalid("Label is required"));
        }
        let slot = self.0.get_mut(key).ok_or_else(|| FormError::LabelKeyNotFound {
            key: key.to_string(),
        })?;
        *slot = label.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_fixed_fields() {
        let labels = FieldLabels::default();
        assert_eq!(labels.iter().count(), 15);
        assert_eq!(labels.label("HeightCm"), "Height (cm)");
        assert_eq!(labels.label("Unknown"), "Unknown");
    }

    #[test]
    fn stored_overrides_win() {
        let labels = FieldLabels::from_json(Some(r#"{"FullName":"Patient name"}"#));
        assert_eq!(labels.label("FullName"), "Patient name");
        assert_eq!(labels.label("Age"), "Age");

        assert_eq!(FieldLabels::from_json(Some("nope")), FieldLabels::default());
    }

    #[test]
    fn update_requires_known_key() {
        let mut labels = FieldLabels::default();
        labels.update("Gender", " Sex ").unwrap();
        assert_eq!(labels.label("Gender"), "Sex");

        let err = labels.update("ShoeSize", "Shoe size").unwrap_err();
        assert_eq!(err.to_string(), "Field key not found");
        assert!(labels.update("Gender", "  ").is_err());
    }
}
