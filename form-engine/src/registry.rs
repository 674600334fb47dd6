//! Admin-defined field list stored on the configuration record

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{FormError, FormResult};
use crate::field::{Field, FieldDraft};
use crate::layout::StepRemap;

const FIELD_NAME_PREFIX: &str = "additional_";

/// Derives the durable field name from a display label.
///
/// Spaces, dashes, dots and commas become underscores. Quotes, parentheses
/// and question marks are dropped.
pub fn derive_field_name(display_name: &str) -> String {
    let body: String = display_name
        .trim()
        .chars()
        .filter_map(|c| match c {
            ' ' | '-' | '.' | ',' => Some('_'),
            '?' | '(' | ')' | '\'' | '"' => None,
            other => Some(other),
        })
        .collect();
    format!("{FIELD_NAME_PREFIX}{}", body.to_lowercase())
}

/// Wraps a lone field object into a one-element array.
///
/// Returns `None` when the payload is already an array or does not look like
/// a field.
pub fn normalize_legacy_fields_json(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    let value: Value = serde_json::from_str(trimmed).ok()?;
    let obj = value.as_object()?;
    let looks_like_field = ["FieldName", "DisplayName", "FieldId", "fieldName", "displayName", "fieldId"]
        .iter()
        .any(|key| obj.contains_key(*key));
    looks_like_field.then(|| Value::Array(vec![value.clone()]).to_string())
}

/// Result of [`FieldRegistry::add`]
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    Added(Field),
    /// A soft-deleted field with the same derived name was brought back
    Reactivated(Field),
}

impl AddOutcome {
    pub fn field(&self) -> &Field {
        match self {
            AddOutcome::Added(field) | AddOutcome::Reactivated(field) => field,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AddOutcome::Added(field) => format!("Field '{}' added successfully!", field.display_name),
            AddOutcome::Reactivated(field) => format!("Field '{}' restored successfully!", field.display_name),
        }
    }
}

/// What a step remap did to the field list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemapSummary {
    pub removed: usize,
    pub moved: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRegistry {
    fields: Vec<Field>,
}

impl FieldRegistry {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Decodes the stored field list.
    ///
    /// Absent or unreadable JSON yields an empty registry. A single field
    /// object is accepted as a list of one, and entries that fail to decode are
    /// skipped.
    pub fn from_json(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Self::default();
        };
        let wrapped = normalize_legacy_fields_json(raw);
        let source = wrapped.as_deref().unwrap_or(raw);

        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(source) else {
            return Self::default();
        };

        let fields = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value::<Field>(item) {
                Ok(field) => Some(field),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping unreadable field entry");
                    None
                }
            })
            .collect();
        Self { fields }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.fields).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn find(&self, field_id: Uuid) -> Option<&Field> {
        self.fields.iter().find(|f| f.field_id == field_id)
    }

    pub fn find_by_name(&self, field_name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.field_name == field_name)
    }

    fn live_mut(&mut self, field_id: Uuid) -> FormResult<&mut Field> {
        self.fields
            .iter_mut()
            .find(|f| f.field_id == field_id && !f.is_deleted)
            .ok_or(FormError::FieldNotFound { field_id })
    }

    /// Adds a field, or reactivates a soft-deleted one with the same derived
    /// name.
    ///
    /// # Errors
    ///
    /// [`FormError::InvalidRequest`] for a blank label and
    /// [`FormError::DuplicateFieldName`] when a live field already uses the
    /// derived name.
    pub fn add(&mut self, draft: FieldDraft, created_by: &str) -> FormResult<AddOutcome> {
        let display_name = draft.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(FormError::invalid("Field label is required"));
        }
        let field_name = derive_field_name(&display_name);
        let now = Utc::now();

        if let Some(existing) = self.fields.iter_mut().find(|f| f.field_name == field_name) {
            if !existing.is_deleted {
                return Err(FormError::DuplicateFieldName { field_name });
            }
            existing.display_name = display_name;
            existing.placeholder = draft.trimmed_placeholder();
            existing.field_type = draft.field_type;
            existing.step = draft.step.max(1);
            existing.is_required = draft.is_required;
            existing.is_conditional = draft.is_conditional;
            existing.conditional_logic_json = draft.conditional_logic_json;
            existing.options_json = draft.options_json;
            existing.is_deleted = false;
            existing.is_active = true;
            existing.updated_at = Some(now);
            return Ok(AddOutcome::Reactivated(existing.clone()));
        }

        let field = Field {
            field_id: Uuid::new_v4(),
            field_name,
            display_name,
            placeholder: draft.trimmed_placeholder(),
            field_type: draft.field_type,
            step: draft.step.max(1),
            display_order: i32::try_from(self.fields.len() + 1).unwrap_or(i32::MAX),
            is_required: draft.is_required,
            is_conditional: draft.is_conditional,
            conditional_logic_json: draft.conditional_logic_json,
            options_json: draft.options_json,
            is_active: true,
            is_deleted: false,
            created_at: now,
            updated_at: None,
            created_by: created_by.to_string(),
        };
        self.fields.push(field.clone());
        Ok(AddOutcome::Added(field))
    }

    /// Overwrites the editable properties. The field name never changes.
    ///
    /// # Errors
    ///
    /// [`FormError::FieldNotFound`] for an unknown or deleted field and
    /// [`FormError::InvalidRequest`] for a blank label.
    pub fn update(&mut self, field_id: Uuid, draft: FieldDraft) -> FormResult<&Field> {
        let display_name = draft.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(FormError::invalid("Field label is required"));
        }
        let placeholder = draft.trimmed_placeholder();

        let field = self.live_mut(field_id)?;
        field.display_name = display_name;
        field.placeholder = placeholder;
        field.field_type = draft.field_type;
        field.step = draft.step.max(1);
        field.is_required = draft.is_required;
        field.is_conditional = draft.is_conditional;
        field.conditional_logic_json = draft.conditional_logic_json;
        field.options_json = draft.options_json;
        field.updated_at = Some(Utc::now());
        Ok(&*field)
    }

    /// Soft delete. The entry stays in the list so it can be reactivated.
    ///
    /// # Errors
    ///
    /// [`FormError::FieldNotFound`] for an unknown or already deleted field.
    pub fn delete(&mut self, field_id: Uuid) -> FormResult<&Field> {
        let field = self.live_mut(field_id)?;
        field.is_deleted = true;
        field.updated_at = Some(Utc::now());
        Ok(&*field)
    }

    /// Keeps fields aligned with their steps after a layout change.
    ///
    /// Fields of a removed step are dropped from the list entirely. Fields of a
    /// moved step follow it.
    pub fn apply_step_remap(&mut self, remap: &StepRemap) -> RemapSummary {
        if remap.is_identity() {
            return RemapSummary::default();
        }
        let now = Utc::now();
        let before = self.fields.len();

        self.fields.retain(|f| remap.apply(f.step).is_some());
        let removed = before - self.fields.len();

        let mut moved = 0;
        for field in &mut self.fields {
            if let Some(step) = remap.apply(field.step).filter(|step| *step != field.step) {
                field.step = step;
                field.updated_at = Some(now);
                moved += 1;
            }
        }

        RemapSummary { removed, moved }
    }

    /// Renderable fields ordered by step, then display order
    pub fn active_fields(&self) -> Vec<&Field> {
        let mut live: Vec<&Field> = self.fields.iter().filter(|f| f.is_live()).collect();
        live.sort_by_key(|f| (f.step, f.display_order));
        live
    }

    pub fn active_fields_for_step(&self, step: i32) -> Vec<&Field> {
        self.active_fields().into_iter().filter(|f| f.step == step).collect()
    }

    /// Fields pointing at a step order that does not exist
    pub fn orphaned<'a>(&'a self, step_orders: &'a [i32]) -> impl Iterator<Item = &'a Field> + 'a {
        self.fields
            .iter()
            .filter(move |f| f.is_live() && !step_orders.contains(&f.step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout;
    use crate::step::Step;

    fn registry_with(names: &[(&str, i32)]) -> FieldRegistry {
        let mut registry = FieldRegistry::default();
        for (name, step) in names {
            registry.add(FieldDraft::new(*name, "text", *step), "admin").unwrap();
        }
        registry
    }

    #[test]
    fn derives_stable_names() {
        assert_eq!(
            derive_field_name("What's your (main) concern?"),
            "additional_whats_your_main_concern"
        );
        assert_eq!(derive_field_name("  E-mail, work.  "), "additional_e_mail__work_");
        assert_eq!(derive_field_name("Say \"hi\""), "additional_say_hi");
    }

    #[test]
    fn add_assigns_display_order_and_trims() {
        let mut registry = registry_with(&[("First", 1)]);
        let mut draft = FieldDraft::new("  Second  ", "number", 2);
        draft.placeholder = Some("   ".to_string());

        let outcome = registry.add(draft, "admin").unwrap();
        let field = outcome.field();

        assert_eq!(field.display_name, "Second");
        assert_eq!(field.field_name, "additional_second");
        assert_eq!(field.display_order, 2);
        assert_eq!(field.placeholder, None);
        assert_eq!(field.created_by, "admin");
        assert_eq!(outcome.message(), "Field 'Second' added successfully!");
    }

    #[test]
    fn add_rejects_blank_label_and_duplicates() {
        let mut registry = registry_with(&[("Allergies", 1)]);

        let blank = registry.add(FieldDraft::new("  ", "text", 1), "admin").unwrap_err();
        assert_eq!(blank.to_string(), "Field label is required");

        let dup = registry.add(FieldDraft::new("allergies", "text", 2), "admin").unwrap_err();
        assert_eq!(dup.to_string(), "A field with this name already exists");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn re_adding_deleted_field_reactivates_it() {
        let mut registry = registry_with(&[("Allergies", 1), ("Diet", 1)]);
        let id = registry.find_by_name("additional_allergies").unwrap().field_id;
        registry.delete(id).unwrap();
        assert!(registry.active_fields().iter().all(|f| f.field_id != id));

        let outcome = registry
            .add(FieldDraft::new("Allergies", "textarea", 3).required(), "someone else")
            .unwrap();

        assert!(matches!(outcome, AddOutcome::Reactivated(_)));
        assert_eq!(outcome.message(), "Field 'Allergies' restored successfully!");
        assert_eq!(registry.len(), 2);
        let field = registry.find(id).unwrap();
        assert!(!field.is_deleted);
        assert!(field.is_active);
        assert!(field.is_required);
        assert_eq!(field.step, 3);
        assert_eq!(field.created_by, "admin");
    }

    #[test]
    fn update_keeps_field_name() {
        let mut registry = registry_with(&[("Allergies", 1)]);
        let id = registry.fields()[0].field_id;

        let updated = registry
            .update(id, FieldDraft::new("Known allergies", "textarea", 2))
            .unwrap();

        assert_eq!(updated.field_name, "additional_allergies");
        assert_eq!(updated.display_name, "Known allergies");
        assert_eq!(updated.step, 2);
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn update_and_delete_unknown_fail() {
        let mut registry = registry_with(&[("Allergies", 1)]);
        let missing = Uuid::new_v4();

        assert!(registry.update(missing, FieldDraft::new("x", "text", 1)).unwrap_err().is_not_found());
        assert_eq!(
            registry.delete(missing).unwrap_err(),
            FormError::FieldNotFound { field_id: missing }
        );

        let id = registry.fields()[0].field_id;
        registry.delete(id).unwrap();
        assert!(registry.delete(id).is_err());
    }

    #[test]
    fn deleting_step_cascades_to_fields() {
        let mut steps = vec![Step::new("A", 1), Step::new("B", 2), Step::new("C", 3)];
        let mut registry = registry_with(&[("On one", 1), ("On two", 2), ("Also two", 2), ("On three", 3)]);

        let target = steps[1].id;
        let (_, remap) = layout::delete_step(&mut steps, target).unwrap();
        let summary = registry.apply_step_remap(&remap);

        assert_eq!(summary, RemapSummary { removed: 2, moved: 1 });
        let placed: Vec<_> = registry
            .fields()
            .iter()
            .map(|f| (f.field_name.as_str(), f.step))
            .collect();
        assert_eq!(placed, vec![("additional_on_one", 1), ("additional_on_three", 2)]);

        let orders: Vec<i32> = steps.iter().map(|s| s.order).collect();
        assert_eq!(registry.orphaned(&orders).count(), 0);
    }

    #[test]
    fn deleting_from_gapped_orders_leaves_no_orphans() {
        let mut steps = vec![
            Step::new("A", 1),
            Step::new("B", 2),
            Step::new("C", 3),
            Step::new("E", 5),
        ];
        let mut registry = registry_with(&[("On two", 2), ("On five", 5)]);

        let target = steps[1].id;
        let (_, remap) = layout::delete_step(&mut steps, target).unwrap();
        let summary = registry.apply_step_remap(&remap);

        assert_eq!(summary, RemapSummary { removed: 1, moved: 1 });
        assert_eq!(registry.fields()[0].field_name, "additional_on_five");
        assert_eq!(registry.fields()[0].step, 3);

        let orders: Vec<i32> = steps.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(registry.orphaned(&orders).count(), 0);
    }

    #[test]
    fn inserted_step_shifts_fields() {
        let mut steps = vec![Step::new("A", 1), Step::new("B", 2)];
        let mut registry = registry_with(&[("On one", 1), ("On two", 2)]);

        let (_, remap) = layout::add_step(&mut steps, "Inserted", Some(1)).unwrap();
        registry.apply_step_remap(&remap);

        assert_eq!(registry.find_by_name("additional_on_one").unwrap().step, 2);
        assert_eq!(registry.find_by_name("additional_on_two").unwrap().step, 3);
    }

    #[test]
    fn active_fields_are_ordered_and_filtered() {
        let mut registry = registry_with(&[("Late", 2), ("Early", 1), ("Gone", 1)]);
        let gone = registry.find_by_name("additional_gone").unwrap().field_id;
        registry.delete(gone).unwrap();

        let names: Vec<_> = registry.active_fields().iter().map(|f| f.display_name.as_str()).collect();
        assert_eq!(names, vec!["Early", "Late"]);
        assert_eq!(registry.active_fields_for_step(2).len(), 1);
    }

    #[test]
    fn from_json_recovers_legacy_shapes() {
        assert!(FieldRegistry::from_json(None).is_empty());
        assert!(FieldRegistry::from_json(Some("garbage")).is_empty());

        let single = r#"{"FieldId":"0b5e4c1e-8f55-4c47-9d2c-1f9e0f7b2a11","FieldName":"additional_x","DisplayName":"X"}"#;
        assert_eq!(FieldRegistry::from_json(Some(single)).len(), 1);

        let mixed = format!(r#"[{single}, {{"nonsense": true}}]"#);
        assert_eq!(FieldRegistry::from_json(Some(&mixed)).len(), 1);
    }

    #[test]
    fn to_json_round_trips() {
        let registry = registry_with(&[("Allergies", 1), ("Diet", 2)]);
        let decoded = FieldRegistry::from_json(Some(&registry.to_json()));
        assert_eq!(decoded, registry);
    }

    #[test]
    fn normalize_legacy_only_wraps_field_objects() {
        let wrapped = normalize_legacy_fields_json(r#" {"FieldName":"additional_x"} "#).unwrap();
        assert!(wrapped.starts_with('['));
        assert_eq!(normalize_legacy_fields_json("[]"), None);
        assert_eq!(normalize_legacy_fields_json(r#"{"theme":"dark"}"#), None);
        assert_eq!(normalize_legacy_fields_json("{oops"), None);
    }
}
