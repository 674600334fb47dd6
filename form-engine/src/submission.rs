//! Mapping between posted form values and stored submission data

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::conditional;
use crate::field::{Field, InputType};
use crate::labels::FieldLabels;

/// Stored submission payload: field name to submitted value
pub type SubmissionData = BTreeMap<String, String>;

/// Raw `application/x-www-form-urlencoded` pairs, repeated keys included
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostedForm {
    pairs: Vec<(String, String)>,
}

impl PostedForm {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Values posted under `field_name` or the older builder's
    /// `AdditionalFields[field_name]` key
    pub fn values(&self, field_name: &str) -> Vec<&str> {
        let legacy = format!("AdditionalFields[{field_name}]");
        self.pairs
            .iter()
            .filter(|(key, _)| key == field_name || *key == legacy)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(String, String)> for PostedForm {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Picks each live field's value out of the posted form.
///
/// Checkboxes store `"true"` when any posted value is true and `"false"`
/// otherwise. Other types keep the first value. Fields that were not posted
/// at all are left out.
pub fn map_posted_values(fields: &[&Field], posted: &PostedForm) -> SubmissionData {
    let mut data = SubmissionData::new();
    for field in fields.iter().filter(|f| f.is_live()) {
        let values = posted.values(&field.field_name);
        if values.is_empty() {
            continue;
        }
        let value = if field.input_type() == InputType::Checkbox {
            let checked = values.iter().any(|v| v.trim().eq_ignore_ascii_case("true"));
            checked.to_string()
        } else {
            values.first().map(|v| (*v).to_string()).unwrap_or_default()
        };
        data.insert(field.field_name.clone(), value);
    }
    data
}

/// Picks the fixed intake fields (`FullName`, `PhoneNumber`, ...) out of the
/// posted form. Blank values are left out.
pub fn map_fixed_values(labels: &FieldLabels, posted: &PostedForm) -> SubmissionData {
    labels
        .iter()
        .filter_map(|(key, _)| {
            let value = posted.values(key).into_iter().map(str::trim).find(|v| !v.is_empty())?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// A stored fixed-field value with its current label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FixedValue {
    pub key: String,
    pub label: String,
    pub value: String,
}

pub fn fixed_detail_values(labels: &FieldLabels, data: &SubmissionData) -> Vec<FixedValue> {
    labels
        .iter()
        .filter_map(|(key, label)| {
            data.get(key).map(|value| FixedValue {
                key: key.to_string(),
                label: label.to_string(),
                value: value.clone(),
            })
        })
        .collect()
}

/// Display names of required fields that are visible but left blank.
///
/// A checkbox counts as answered only when checked.
pub fn missing_required(fields: &[&Field], data: &SubmissionData, posted: &PostedForm) -> Vec<String> {
    let visible: HashSet<Uuid> = conditional::visible_field_ids(fields, |key| posted.values(key));
    fields
        .iter()
        .filter(|f| f.is_live() && f.is_required && visible.contains(&f.field_id))
        .filter(|f| {
            let value = data.get(&f.field_name).map_or("", |v| v.trim());
            match f.input_type() {
                InputType::Checkbox => value != "true",
                _ => value.is_empty(),
            }
        })
        .map(|f| f.display_name.clone())
        .collect()
}

/// One stored value joined with the field that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionValue {
    pub field_id: Uuid,
    pub field_name: String,
    pub display_name: String,
    pub field_type: String,
    pub step: i32,
    pub value: String,
}

/// Joins stored values with current field metadata, in field order.
/// Values whose field no longer exists are not reported.
pub fn detail_values(fields: &[&Field], data: &SubmissionData) -> Vec<SubmissionValue> {
    fields
        .iter()
        .filter_map(|field| {
            data.get(&field.field_name).map(|value| SubmissionValue {
                field_id: field.field_id,
                field_name: field.field_name.clone(),
                display_name: field.display_name.clone(),
                field_type: field.field_type.clone(),
                step: field.step,
                value: value.clone(),
            })
        })
        .collect()
}

/// Lenient decode of a stored payload. Unreadable data reads as empty.
pub fn parse_submission_data(raw: Option<&str>) -> SubmissionData {
    raw.map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default()
}
