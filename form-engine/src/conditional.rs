//! Conditional show/hide evaluation
//!
//! A dependent field names the control it watches (by field name, field id or
//! a fixed field key) and the value that reveals it. Both sides are trimmed
//! and compared case-insensitively. `showWhenValue` may also be a
//! comma-separated allow-list.

use std::collections::HashSet;

use uuid::Uuid;

use crate::field::{ConditionalLogic, Field, InputType};

/// Current state of a form control as the browser would read it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlValue {
    Text(String),
    Checkbox(bool),
    /// Checked radio value, `None` when nothing is picked
    Radio(Option<String>),
}

impl ControlValue {
    pub fn as_text(&self) -> &str {
        match self {
            ControlValue::Text(text) => text,
            ControlValue::Checkbox(true) => "true",
            ControlValue::Checkbox(false) => "false",
            ControlValue::Radio(choice) => choice.as_deref().unwrap_or_default(),
        }
    }
}

fn canonical(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Whether `current` satisfies `show_when_value`
pub fn matches_show_when(show_when_value: &str, current: &str) -> bool {
    let current = canonical(current);
    let expected = canonical(show_when_value);
    if current == expected {
        return true;
    }
    expected.contains(',')
        && expected
            .split(',')
            .map(str::trim)
            .filter(|candidate| !candidate.is_empty())
            .any(|candidate| candidate == current)
}

/// Evaluates one rule. Missing or incomplete logic is always visible, and a
/// control that cannot be found reads as empty.
pub fn is_visible<F>(logic: Option<&ConditionalLogic>, read_control: F) -> bool
where
    F: Fn(&str) -> Option<ControlValue>,
{
    let Some(logic) = logic.filter(|logic| logic.is_complete()) else {
        return true;
    };
    let key = logic.depends_on_field_key.trim();
    let current = read_control(key);
    let text = current.as_ref().map_or("", ControlValue::as_text);
    matches_show_when(&logic.show_when_value, text)
}

/// Finds the field a rule points at, by derived name or by id
pub fn resolve_reference<'a>(fields: &[&'a Field], key: &str) -> Option<&'a Field> {
    let key = key.trim();
    if let Some(field) = fields.iter().find(|f| f.field_name == key) {
        return Some(*field);
    }
    let id = Uuid::parse_str(key).ok()?;
    fields.iter().find(|f| f.field_id == id).copied()
}

/// Reads a control's value out of raw submitted strings, honouring the
/// checkbox and radio reading rules of the referenced field's type
pub fn control_value(input_type: Option<InputType>, submitted: &[&str]) -> ControlValue {
    match input_type {
        Some(InputType::Checkbox) => {
            ControlValue::Checkbox(submitted.iter().any(|v| v.trim().eq_ignore_ascii_case("true")))
        }
        Some(InputType::Radio) => ControlValue::Radio(
            submitted
                .iter()
                .find(|v| !v.trim().is_empty())
                .map(|v| (*v).to_string()),
        ),
        _ => ControlValue::Text(submitted.first().map(|v| (*v).to_string()).unwrap_or_default()),
    }
}

/// Ids of the fields that are visible given the submitted values.
///
/// `submitted` returns every raw value posted under a control key. Fields
/// without conditional logic are always visible.
pub fn visible_field_ids<'v, F>(fields: &[&Field], submitted: F) -> HashSet<Uuid>
where
    F: Fn(&str) -> Vec<&'v str>,
{
    fields
        .iter()
        .filter(|field| {
            if !field.is_conditional {
                return true;
            }
            let logic = field.conditional_logic();
            is_visible(logic.as_ref(), |key| {
                let referenced = resolve_reference(fields, key);
                let posted_key = referenced.map_or(key, |f| f.field_name.as_str());
                let values = submitted(posted_key);
                Some(control_value(referenced.map(Field::input_type), &values))
            })
        })
        .map(|field| field.field_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDraft;
    use crate::registry::FieldRegistry;

    fn rule(key: &str, value: &str) -> ConditionalLogic {
        ConditionalLogic::new(key, value)
    }

    fn reading(value: ControlValue) -> impl Fn(&str) -> Option<ControlValue> {
        move |_| Some(value.clone())
    }

    #[test]
    fn equality_is_trimmed_and_case_insensitive() {
        let logic = rule("additional_smoker", "yes");
        assert!(is_visible(Some(&logic), reading(ControlValue::Text("  YES ".into()))));
        assert!(!is_visible(Some(&logic), reading(ControlValue::Text("no".into()))));
        assert!(!is_visible(Some(&logic), |_| None));
    }

    #[test]
    fn allow_list_matches_any_entry() {
        let logic = rule("additional_frequency", "daily, Weekly");
        assert!(is_visible(Some(&logic), reading(ControlValue::Text("weekly".into()))));
        assert!(is_visible(Some(&logic), reading(ControlValue::Text("DAILY".into()))));
        assert!(!is_visible(Some(&logic), reading(ControlValue::Text("monthly".into()))));
    }

    #[test]
    fn incomplete_logic_is_visible() {
        assert!(is_visible(None, |_| None));
        assert!(is_visible(Some(&rule("", "yes")), |_| None));
        assert!(is_visible(Some(&rule("a", "  ")), |_| None));
    }

    #[test]
    fn checkbox_and_radio_reading_rules() {
        assert_eq!(control_value(Some(InputType::Checkbox), &["false", "TRUE"]).as_text(), "true");
        assert_eq!(control_value(Some(InputType::Checkbox), &[]).as_text(), "false");
        assert_eq!(control_value(Some(InputType::Radio), &["", "b"]).as_text(), "b");
        assert_eq!(control_value(Some(InputType::Radio), &[]).as_text(), "");
        assert_eq!(control_value(None, &["x", "y"]).as_text(), "x");
    }

    #[test]
    fn visible_ids_follow_submitted_values() {
        let mut registry = FieldRegistry::default();
        let trigger = registry
            .add(FieldDraft::new("Smoker", "checkbox", 1), "admin")
            .unwrap()
            .field()
            .clone();
        let by_name = registry
            .add(
                FieldDraft::new("Packs per day", "number", 1).shown_when(&rule("additional_smoker", "true")),
                "admin",
            )
            .unwrap()
            .field()
            .field_id;
        let by_id = registry
            .add(
                FieldDraft::new("Quit date", "date", 1).shown_when(&rule(&trigger.field_id.to_string(), "false")),
                "admin",
            )
            .unwrap()
            .field()
            .field_id;
        let fixed = registry
            .add(
                FieldDraft::new("Allergy list", "textarea", 1).shown_when(&rule("HasAllergies", "yes")),
                "admin",
            )
            .unwrap()
            .field()
            .field_id;

        let fields = registry.active_fields();
        let visible = visible_field_ids(&fields, |key| match key {
            "additional_smoker" => vec!["true"],
            "HasAllergies" => vec!["No"],
            _ => Vec::new(),
        });

        assert!(visible.contains(&trigger.field_id));
        assert!(visible.contains(&by_name));
        assert!(!visible.contains(&by_id));
        assert!(!visible.contains(&fixed));
    }
}
