//! Step document codec
//!
//! The configuration record keeps its steps inside a JSON object under the
//! `steps` property. Everything else in that object is preserved untouched.
//! The read path is lenient: a document that is missing, unparsable or shaped
//! wrong yields an empty step list. [`FormSchemaDocument::parse_strict`] is the
//! counterpart that reports every problem instead.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{FormError, FormResult};
use crate::layout::{self, StepRemap};
use crate::step::{self, Step, StepGroup};

pub const STEPS_PROPERTY: &str = "steps";
const LEGACY_STEPS_PROPERTY: &str = "Steps";
pub const SCHEMA_VERSION_PROPERTY: &str = "schemaVersion";

/// Version stamped on every document this crate writes
pub const SCHEMA_VERSION: u32 = 2;

pub const DEFAULT_STEP_NAMES: [&str; 3] = ["Client Hx", "Substances", "Sex & Health"];

fn parse_root(doc: Option<&str>) -> Option<Map<String, Value>> {
    let raw = doc.map(str::trim).filter(|raw| !raw.is_empty())?;
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(root)) => Some(root),
        _ => None,
    }
}

fn steps_value(root: &Map<String, Value>) -> Option<&Value> {
    root.get(STEPS_PROPERTY).or_else(|| root.get(LEGACY_STEPS_PROPERTY))
}

fn lookup<'a>(obj: &'a Map<String, Value>, camel: &str, pascal: &str) -> Option<&'a Value> {
    obj.get(camel).or_else(|| obj.get(pascal))
}

fn lenient_step(value: &Value) -> Option<Step> {
    let obj = value.as_object()?;

    let id = lookup(obj, "id", "Id")
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .unwrap_or_else(Uuid::nil);
    let name = lookup(obj, "name", "Name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let order = lookup(obj, "order", "Order")
        .and_then(Value::as_i64)
        .map_or(0, |order| i32::try_from(order).unwrap_or(if order < 0 { 0 } else { i32::MAX }));
    let is_active = lookup(obj, "isActive", "IsActive")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    let text = |camel: &str, pascal: &str| {
        lookup(obj, camel, pascal)
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let groups = lookup(obj, "groups", "Groups")
        .and_then(|groups| serde_json::from_value::<Vec<StepGroup>>(groups.clone()).ok())
        .unwrap_or_default();

    Some(Step {
        id,
        name,
        order,
        is_active,
        icon: text("icon", "Icon"),
        description: text("description", "Description"),
        groups,
    })
}

/// Reads the step list, normalized and sorted by order.
///
/// Never fails. Entries that are not objects are skipped.
pub fn read_steps(doc: Option<&str>) -> Vec<Step> {
    let Some(root) = parse_root(doc) else {
        return Vec::new();
    };
    let Some(Value::Array(items)) = steps_value(&root) else {
        return Vec::new();
    };

    step::normalize_steps(items.iter().filter_map(lenient_step))
}

/// Replaces the step list inside `doc` and returns single-line JSON.
///
/// Properties other than `steps` survive. An unparsable document is replaced by
/// a fresh object.
pub fn write_steps(doc: Option<&str>, steps: &[Step]) -> String {
    let mut root = parse_root(doc).unwrap_or_default();
    let normalized = step::normalize_steps(steps.iter().cloned());

    root.remove(LEGACY_STEPS_PROPERTY);
    root.insert(
        STEPS_PROPERTY.to_string(),
        serde_json::to_value(normalized).unwrap_or_else(|_| Value::Array(Vec::new())),
    );
    root.insert(SCHEMA_VERSION_PROPERTY.to_string(), Value::from(SCHEMA_VERSION));

    Value::Object(root).to_string()
}

/// Result of [`seed_default_steps`]
#[derive(Debug, Clone, PartialEq)]
pub struct SeededSteps {
    pub json: String,
    pub steps: Vec<Step>,
    /// How stored orders moved when the list was renumbered
    pub remap: StepRemap,
}

/// Guarantees that steps with order 1, 2 and 3 exist.
///
/// Missing orders are filled with the default names and the list is renumbered
/// from 1. When nothing is missing the input JSON is returned as is, so the
/// caller can compare to decide whether to persist.
pub fn seed_default_steps(doc: Option<&str>) -> SeededSteps {
    let mut steps = read_steps(doc);
    let before = layout::snapshot(&steps);
    let mut inserted = false;

    for (order, name) in (1..).zip(DEFAULT_STEP_NAMES) {
        if !steps.iter().any(|s| s.order == order) {
            steps.push(Step::new(name, order));
            inserted = true;
        }
    }

    if !inserted {
        return SeededSteps {
            json: doc.unwrap_or_default().to_string(),
            steps,
            remap: StepRemap::default(),
        };
    }

    step::renumber(&mut steps);
    let remap = StepRemap::between(&before, &steps, None);
    let json = write_steps(doc, &steps);
    tracing::debug!(step_count = steps.len(), "Default steps seeded");
    SeededSteps { json, steps, remap }
}

/// [`seed_default_steps`] without the remap, for callers with no fields to move
pub fn ensure_seeded_default_steps(doc: Option<&str>) -> (String, Vec<Step>) {
    let seeded = seed_default_steps(doc);
    (seeded.json, seeded.steps)
}

/// Outcome of enabling or disabling a step
#[derive(Debug, Clone, PartialEq)]
pub struct StepToggle {
    pub json: String,
    pub step: Step,
    pub message: String,
}

/// Flips the active flag of one step.
///
/// # Errors
///
/// [`FormError::StepNotFound`] for an unknown id and
/// [`FormError::LastActiveStep`] when disabling would leave no active step.
pub fn toggle_step_active(doc: Option<&str>, step_id: Uuid, active: bool) -> FormResult<StepToggle> {
    let mut steps = read_steps(doc);
    let remaining_active = step::active_count(&steps);

    let target = steps
        .iter_mut()
        .find(|s| s.id == step_id)
        .ok_or(FormError::StepNotFound)?;

    if !active && remaining_active <= 1 {
        return Err(FormError::LastActiveStep);
    }

    target.is_active = active;
    let toggled = target.clone();
    let message = if active {
        format!("Step '{}' has been enabled and will now appear in public forms.", toggled.name)
    } else {
        format!("Step '{}' has been disabled and will be hidden from public forms.", toggled.name)
    };

    Ok(StepToggle {
        json: write_steps(doc, &steps),
        step: toggled,
        message,
    })
}

/// Steps currently hidden from the public form, by order
pub fn disabled_steps(doc: Option<&str>) -> Vec<Step> {
    read_steps(doc).into_iter().filter(|s| !s.is_active).collect()
}

/// Re-enables a disabled step.
///
/// # Errors
///
/// [`FormError::StepNotFound`] for an unknown id.
pub fn restore_disabled_step(doc: Option<&str>, step_id: Uuid) -> FormResult<StepToggle> {
    toggle_step_active(doc, step_id, true)
}

/// Gives every step without groups a single unnamed default group.
///
/// Existing groups are never touched. Returns the document and whether
/// anything was added.
pub fn ensure_default_groups_seeded(doc: Option<&str>) -> (String, bool) {
    let mut steps = read_steps(doc);
    let mut changed = false;

    for step in steps.iter_mut().filter(|s| s.groups.is_empty()) {
        step.groups.push(StepGroup::new(step.default_group_id(), ""));
        changed = true;
    }

    if changed {
        (write_steps(doc, &steps), true)
    } else {
        (doc.unwrap_or_default().to_string(), false)
    }
}

/// Replaces the groups of the step at `step_order`.
///
/// # Errors
///
/// [`FormError::StepNotFound`] when no step has that order. Steps are never
/// created here.
pub fn upsert_step_groups(doc: Option<&str>, step_order: i32, groups: Vec<StepGroup>) -> FormResult<String> {
    let mut steps = read_steps(doc);
    let target = steps
        .iter_mut()
        .find(|s| s.order == step_order)
        .ok_or(FormError::StepNotFound)?;

    target.groups = groups;
    Ok(write_steps(doc, &steps))
}

/// Fully decoded schema document.
///
/// Unlike [`read_steps`] nothing is dropped or repaired silently.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSchemaDocument {
    /// `None` for documents written before the version tag existed
    pub schema_version: Option<u32>,
    pub steps: Vec<Step>,
    /// Properties other than the steps and the version tag
    pub extra: Map<String, Value>,
}

impl FormSchemaDocument {
    /// # Errors
    ///
    /// [`FormError::MalformedDocument`] for anything that is not a well-formed
    /// step document and [`FormError::UnsupportedSchemaVersion`] for a version
    /// newer than [`SCHEMA_VERSION`].
    pub fn parse_strict(doc: &str) -> FormResult<Self> {
        let value: Value = serde_json::from_str(doc)
            .map_err(|e| FormError::MalformedDocument(format!("invalid JSON: {e}")))?;
        let Value::Object(mut root) = value else {
            return Err(FormError::MalformedDocument(
                "document root must be an object".to_string(),
            ));
        };

        let schema_version = match root.remove(SCHEMA_VERSION_PROPERTY) {
            None => None,
            Some(raw) => {
                let found = raw
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| {
                        FormError::MalformedDocument(format!("`{SCHEMA_VERSION_PROPERTY}` must be a positive integer"))
                    })?;
                if found > SCHEMA_VERSION {
                    return Err(FormError::UnsupportedSchemaVersion {
                        found,
                        supported: SCHEMA_VERSION,
                    });
                }
                Some(found)
            }
        };

        let raw_steps = root
            .remove(STEPS_PROPERTY)
            .or_else(|| root.remove(LEGACY_STEPS_PROPERTY))
            .ok_or_else(|| FormError::MalformedDocument("missing `steps` array".to_string()))?;
        let Value::Array(items) = raw_steps else {
            return Err(FormError::MalformedDocument("`steps` must be an array".to_string()));
        };

        let mut steps = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let step: Step = serde_json::from_value(item)
                .map_err(|e| FormError::MalformedDocument(format!("steps[{index}]: {e}")))?;
            if step.id.is_nil() {
                return Err(FormError::MalformedDocument(format!("steps[{index}]: nil id")));
            }
            if steps.iter().any(|s: &Step| s.id == step.id) {
                return Err(FormError::MalformedDocument(format!(
                    "steps[{index}]: duplicate id {}",
                    step.id
                )));
            }
            steps.push(step);
        }
        steps.sort_by_key(|s| s.order);

        Ok(Self {
            schema_version,
            steps,
            extra: root,
        })
    }

    /// Non-fatal inconsistencies worth showing to an administrator
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let contiguous = self
            .steps
            .iter()
            .zip(1..)
            .all(|(step, expected)| step.order == expected);
        if !contiguous {
            warnings.push("step orders are not contiguous from 1".to_string());
        }
        if !self.steps.is_empty() && step::active_count(&self.steps) == 0 {
            warnings.push("no step is active".to_string());
        }
        for step in self.steps.iter().filter(|s| s.name.trim().is_empty()) {
            warnings.push(format!("step {} has a blank name", step.id));
        }
        if self.schema_version.is_none() {
            warnings.push("document has no schema version tag".to_string());
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(steps: &[Step]) -> Vec<(&str, i32)> {
        steps.iter().map(|s| (s.name.as_str(), s.order)).collect()
    }

    #[test]
    fn read_steps_tolerates_garbage() {
        assert!(read_steps(None).is_empty());
        assert!(read_steps(Some("")).is_empty());
        assert!(read_steps(Some("{not json")).is_empty());
        assert!(read_steps(Some("[1,2,3]")).is_empty());
        assert!(read_steps(Some(r#"{"steps":"nope"}"#)).is_empty());
        assert!(read_steps(Some(r#"{"other":[]}"#)).is_empty());
    }

    #[test]
    fn read_steps_normalizes_entries() {
        let doc = r#"{"steps":[{"name":"","order":0},{"Id":"not-a-uuid","Name":"Second","Order":2}, 7]}"#;
        let steps = read_steps(Some(doc));

        assert_eq!(names(&steps), vec![("Step 1", 1), ("Second", 2)]);
        assert!(steps.iter().all(|s| !s.id.is_nil()));
    }

    #[test]
    fn write_steps_keeps_unrelated_properties() {
        let doc = r#"{"title":"Intake","Steps":[]}"#;
        let json = write_steps(Some(doc), &[Step::new("Only", 1)]);
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["title"], "Intake");
        assert_eq!(value[SCHEMA_VERSION_PROPERTY], SCHEMA_VERSION);
        assert!(value.get("Steps").is_none());
        assert_eq!(value["steps"][0]["name"], "Only");
        assert!(!json.contains('\n'));
    }

    #[test]
    fn write_steps_replaces_unparsable_document() {
        let json = write_steps(Some("{{{"), &[Step::new("Only", 1)]);
        assert_eq!(read_steps(Some(&json)).len(), 1);
    }

    #[test]
    fn seeding_fresh_document_yields_defaults() {
        let (json, steps) = ensure_seeded_default_steps(None);

        assert_eq!(
            names(&steps),
            vec![("Client Hx", 1), ("Substances", 2), ("Sex & Health", 3)]
        );
        assert_eq!(names(&read_steps(Some(&json))), names(&steps));
    }

    #[test]
    fn seeding_is_idempotent() {
        let (first, _) = ensure_seeded_default_steps(None);
        let (second, _) = ensure_seeded_default_steps(Some(&first));
        assert_eq!(first, second);
    }

    #[test]
    fn seeding_fills_gaps_and_renumbers() {
        let doc = write_steps(None, &[Step::new("Custom", 2), Step::new("Late", 7)]);
        let (json, steps) = ensure_seeded_default_steps(Some(&doc));

        assert_ne!(json, doc);
        assert_eq!(
            names(&steps),
            vec![("Client Hx", 1), ("Custom", 2), ("Sex & Health", 3), ("Late", 4)]
        );
    }

    #[test]
    fn seeding_reports_renumbered_orders() {
        let doc = write_steps(None, &[Step::new("Custom", 2), Step::new("Late", 7)]);
        let seeded = seed_default_steps(Some(&doc));

        assert_eq!(seeded.remap.apply(2), Some(2));
        assert_eq!(seeded.remap.apply(7), Some(4));
        assert_eq!(seeded.remap.removed(), None);

        let complete = seed_default_steps(Some(&seeded.json));
        assert!(complete.remap.is_identity());
    }

    #[test]
    fn toggle_reports_missing_step() {
        let (json, _) = ensure_seeded_default_steps(None);
        let err = toggle_step_active(Some(&json), Uuid::new_v4(), false).unwrap_err();
        assert_eq!(err, FormError::StepNotFound);
        assert_eq!(err.to_string(), "Step not found");
    }

    #[test]
    fn toggle_disables_and_restores() {
        let (json, steps) = ensure_seeded_default_steps(None);
        let target = steps[1].id;

        let disabled = toggle_step_active(Some(&json), target, false).unwrap();
        assert_eq!(
            disabled.message,
            "Step 'Substances' has been disabled and will be hidden from public forms."
        );
        let hidden = disabled_steps(Some(&disabled.json));
        assert_eq!(hidden.len(), 1);
        assert_eq!(hidden[0].id, target);

        let restored = restore_disabled_step(Some(&disabled.json), target).unwrap();
        assert!(restored.step.is_active);
        assert!(restored.message.contains("enabled"));
        assert!(disabled_steps(Some(&restored.json)).is_empty());
    }

    #[test]
    fn default_groups_are_additive() {
        let mut custom = Step::new("Grouped", 1);
        custom.groups.push(StepGroup::new("g1", "Vitals"));
        let plain = Step::new("Plain", 2);
        let doc = write_steps(None, &[custom, plain.clone()]);

        let (json, changed) = ensure_default_groups_seeded(Some(&doc));
        assert!(changed);
        let steps = read_steps(Some(&json));
        assert_eq!(steps[0].groups, vec![StepGroup::new("g1", "Vitals")]);
        assert_eq!(steps[1].groups[0].group_id, format!("default_{}", plain.id));
        assert_eq!(steps[1].groups[0].name, "");

        let (again, changed_again) = ensure_default_groups_seeded(Some(&json));
        assert!(!changed_again);
        assert_eq!(again, json);
    }

    #[test]
    fn legacy_default_group_shape_decodes() {
        let doc = r#"{"steps":[{"Id":"6f1c1f4e-3a56-4f0e-9c61-3c2d9b7b9a10","Name":"A","Order":1,
            "groups":[{"id":"default_6f1c1f4e-3a56-4f0e-9c61-3c2d9b7b9a10","title":"","order":1,"isActive":true}]}]}"#;
        let steps = read_steps(Some(doc));
        assert_eq!(steps[0].groups[0].group_id, "default_6f1c1f4e-3a56-4f0e-9c61-3c2d9b7b9a10");
    }

    #[test]
    fn upsert_groups_targets_step_by_order() {
        let (json, _) = ensure_seeded_default_steps(None);
        let mut group = StepGroup::new("g-2", "Habits");
        group.field_ids.push("f-1".to_string());

        let updated = upsert_step_groups(Some(&json), 2, vec![group.clone()]).unwrap();
        let steps = read_steps(Some(&updated));
        assert_eq!(steps[1].groups, vec![group]);
        assert!(steps[0].groups.is_empty());

        assert_eq!(
            upsert_step_groups(Some(&json), 9, Vec::new()).unwrap_err(),
            FormError::StepNotFound
        );
    }

    #[test]
    fn strict_parse_accepts_written_documents() {
        let (json, steps) = ensure_seeded_default_steps(Some(r#"{"theme":"light"}"#));
        let document = FormSchemaDocument::parse_strict(&json).unwrap();

        assert_eq!(document.schema_version, Some(SCHEMA_VERSION));
        assert_eq!(document.steps, steps);
        assert_eq!(document.extra.get("theme"), Some(&Value::from("light")));
        assert!(document.warnings().is_empty());
    }

    #[test]
    fn strict_parse_rejects_what_lenient_read_drops() {
        let bad_entry = r#"{"steps":[{"id":"6f1c1f4e-3a56-4f0e-9c61-3c2d9b7b9a10","name":"A","order":1}, 7]}"#;
        assert!(matches!(
            FormSchemaDocument::parse_strict(bad_entry),
            Err(FormError::MalformedDocument(msg)) if msg.starts_with("steps[1]")
        ));
        assert_eq!(read_steps(Some(bad_entry)).len(), 1);

        assert!(matches!(
            FormSchemaDocument::parse_strict("[]"),
            Err(FormError::MalformedDocument(_))
        ));
        assert!(matches!(
            FormSchemaDocument::parse_strict(r#"{"title":"x"}"#),
            Err(FormError::MalformedDocument(_))
        ));
    }

    #[test]
    fn strict_parse_rejects_future_versions() {
        let doc = r#"{"schemaVersion":99,"steps":[]}"#;
        assert_eq!(
            FormSchemaDocument::parse_strict(doc).unwrap_err(),
            FormError::UnsupportedSchemaVersion {
                found: 99,
                supported: SCHEMA_VERSION
            }
        );
    }

    #[test]
    fn strict_parse_warns_on_legacy_untagged_documents() {
        let doc = r#"{"steps":[{"Id":"6f1c1f4e-3a56-4f0e-9c61-3c2d9b7b9a10","Name":"A","Order":3,"IsActive":false}]}"#;
        let document = FormSchemaDocument::parse_strict(doc).unwrap();
        let warnings = document.warnings();

        assert_eq!(document.schema_version, None);
        assert_eq!(warnings.len(), 3);
    }

    fn arb_group() -> impl Strategy<Value = StepGroup> {
        (
            "[a-z]{1,8}",
            "[A-Za-z ]{0,10}",
            proptest::collection::vec("[a-z0-9]{1,6}", 0..4),
        )
            .prop_map(|(group_id, name, field_ids)| StepGroup {
                group_id,
                name,
                field_ids,
            })
    }

    fn arb_step() -> impl Strategy<Value = Step> {
        (
            1..u128::MAX,
            "[A-Za-z &]{0,12}",
            -3i32..20,
            any::<bool>(),
            proptest::option::of("[a-z]{1,4}"),
            proptest::collection::vec(arb_group(), 0..3),
        )
            .prop_map(|(id, name, order, is_active, icon, groups)| Step {
                id: Uuid::from_u128(id),
                name,
                order,
                is_active,
                icon,
                description: None,
                groups,
            })
    }

    proptest! {
        #[test]
        fn round_trip_equals_normalized(
            steps in proptest::collection::vec(arb_step(), 0..8),
            existing in proptest::option::of(r#"\{"title":"[a-z]{0,6}"\}"#),
        ) {
            let json = write_steps(existing.as_deref(), &steps);
            prop_assert_eq!(read_steps(Some(&json)), step::normalize_steps(steps));
        }

        #[test]
        fn read_steps_never_panics(raw in ".{0,64}") {
            let _ = read_steps(Some(&raw));
        }

        #[test]
        fn sole_active_step_cannot_be_disabled(
            mut steps in proptest::collection::vec(arb_step(), 1..6),
            pick in any::<prop::sample::Index>(),
        ) {
            for step in &mut steps {
                step.is_active = false;
            }
            let chosen = pick.index(steps.len());
            steps[chosen].is_active = true;
            let id = steps[chosen].id;
            let json = write_steps(None, &steps);

            prop_assert_eq!(
                toggle_step_active(Some(&json), id, false).unwrap_err(),
                FormError::LastActiveStep
            );
        }
    }
}
