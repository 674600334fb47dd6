//! Step add, edit and delete.
//!
//! Fields point at steps by order, so any change that renumbers steps reports
//! a [`StepRemap`] for the field registry to apply.

use std::collections::{BTreeMap, HashSet};

use uuid::Uuid;

use crate::error::{FormError, FormResult};
use crate::step::{self, Step};

/// How step orders moved during one layout change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepRemap {
    moved: BTreeMap<i32, i32>,
    removed: Option<i32>,
}

impl StepRemap {
    /// Compares orders by step id. `before` must be taken from the stored
    /// orders, ahead of any renumbering. When several steps shared an old
    /// order, the first of them decides where its fields go.
    pub(crate) fn between(before: &[(Uuid, i32)], after: &[Step], removed: Option<i32>) -> Self {
        let mut moved = BTreeMap::new();
        let mut seen = HashSet::new();
        for (id, old) in before {
            if !seen.insert(*old) {
                continue;
            }
            if let Some(current) = after.iter().find(|s| s.id == *id) {
                if current.order != *old {
                    moved.insert(*old, current.order);
                }
            }
        }
        Self { moved, removed }
    }

    /// New order for a field that was on step `old`, `None` if that step is gone
    pub fn apply(&self, old: i32) -> Option<i32> {
        if self.removed == Some(old) {
            return None;
        }
        Some(self.moved.get(&old).copied().unwrap_or(old))
    }

    pub fn removed(&self) -> Option<i32> {
        self.removed
    }

    pub fn is_identity(&self) -> bool {
        self.moved.is_empty() && self.removed.is_none()
    }
}

/// Stored orders in display order, so ties keep their first step first
pub(crate) fn snapshot(steps: &[Step]) -> Vec<(Uuid, i32)> {
    let mut orders: Vec<(Uuid, i32)> = steps.iter().map(|s| (s.id, s.order)).collect();
    orders.sort_by_key(|(_, order)| *order);
    orders
}

fn clamp_position(requested: Option<i32>, len: usize) -> usize {
    let last = len + 1;
    requested.map_or(last, |order| {
        usize::try_from(order.max(1)).map_or(last, |order| order.min(last))
    })
}

fn place(steps: &mut Vec<Step>, step: Step, position: usize) {
    let index = position.saturating_sub(1).min(steps.len());
    steps.insert(index, step);
    step::renumber_in_place(steps);
}

fn required_name(name: &str) -> FormResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(FormError::invalid("Step name is required"));
    }
    Ok(trimmed.to_string())
}

/// Inserts a new active step at `order` (appended when absent or past the end).
///
/// # Errors
///
/// [`FormError::InvalidRequest`] for a blank name.
pub fn add_step(steps: &mut Vec<Step>, name: &str, order: Option<i32>) -> FormResult<(Step, StepRemap)> {
    let name = required_name(name)?;
    let before = snapshot(steps);
    step::renumber(steps);

    let position = clamp_position(order, steps.len());
    let new_step = Step::new(name, 0);
    let id = new_step.id;
    place(steps, new_step, position);

    let added = steps
        .iter()
        .find(|s| s.id == id)
        .cloned()
        .ok_or(FormError::StepNotFound)?;
    Ok((added, StepRemap::between(&before, steps, None)))
}

/// Renames a step and, when `order` is given, moves it to that position.
///
/// # Errors
///
/// [`FormError::InvalidRequest`] for a blank name and
/// [`FormError::StepNotFound`] for an unknown id.
pub fn update_step(steps: &mut Vec<Step>, id: Uuid, name: &str, order: Option<i32>) -> FormResult<(Step, StepRemap)> {
    let name = required_name(name)?;
    let before = snapshot(steps);
    step::renumber(steps);
    let index = steps
        .iter()
        .position(|s| s.id == id)
        .ok_or(FormError::StepNotFound)?;

    let mut target = steps.remove(index);
    target.name = name;
    let position = match order.filter(|o| *o > 0) {
        Some(requested) => clamp_position(Some(requested), steps.len()),
        None => usize::try_from(target.order).unwrap_or(1),
    };
    place(steps, target, position);

    let updated = steps
        .iter()
        .find(|s| s.id == id)
        .cloned()
        .ok_or(FormError::StepNotFound)?;
    Ok((updated, StepRemap::between(&before, steps, None)))
}

/// Removes a step and closes the gap.
///
/// # Errors
///
/// [`FormError::StepNotFound`] for an unknown id and
/// [`FormError::LastActiveStep`] when it is the only active step left.
pub fn delete_step(steps: &mut Vec<Step>, id: Uuid) -> FormResult<(Step, StepRemap)> {
    let before = snapshot(steps);
    step::renumber(steps);
    let index = steps
        .iter()
        .position(|s| s.id == id)
        .ok_or(FormError::StepNotFound)?;

    let is_last_active = steps.iter().any(|s| s.id == id && s.is_active) && step::active_count(steps) <= 1;
    if is_last_active {
        return Err(FormError::LastActiveStep);
    }

    let removed = steps.remove(index);
    step::renumber_in_place(steps);

    let stored_order = before
        .iter()
        .find(|(step_id, _)| *step_id == id)
        .map_or(removed.order, |(_, order)| *order);
    let remap = StepRemap::between(&before, steps, Some(stored_order));
    Ok((removed, remap))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Vec<Step> {
        vec![
            Step::new("Client Hx", 1),
            Step::new("Substances", 2),
            Step::new("Sex & Health", 3),
        ]
    }

    fn names(steps: &[Step]) -> Vec<(&str, i32)> {
        steps.iter().map(|s| (s.name.as_str(), s.order)).collect()
    }

    #[test]
    fn add_appends_by_default() {
        let mut steps = defaults();
        let (added, remap) = add_step(&mut steps, "  Consent ", None).unwrap();

        assert_eq!(added.name, "Consent");
        assert_eq!(added.order, 4);
        assert!(remap.is_identity());
    }

    #[test]
    fn add_inserts_at_requested_position() {
        let mut steps = defaults();
        let (added, remap) = add_step(&mut steps, "Vitals", Some(2)).unwrap();

        assert_eq!(added.order, 2);
        assert_eq!(
            names(&steps),
            vec![("Client Hx", 1), ("Vitals", 2), ("Substances", 3), ("Sex & Health", 4)]
        );
        assert_eq!(remap.apply(1), Some(1));
        assert_eq!(remap.apply(2), Some(3));
        assert_eq!(remap.apply(3), Some(4));
    }

    #[test]
    fn add_clamps_out_of_range_positions() {
        let mut steps = defaults();
        let (far, _) = add_step(&mut steps, "Far", Some(40)).unwrap();
        assert_eq!(far.order, 4);

        let (first, _) = add_step(&mut steps, "First", Some(-2)).unwrap();
        assert_eq!(first.order, 1);
    }

    #[test]
    fn add_rejects_blank_name() {
        let mut steps = defaults();
        let err = add_step(&mut steps, "   ", None).unwrap_err();
        assert_eq!(err.to_string(), "Step name is required");
        assert_eq!(steps.len(), 3);
    }

    #[test]
    fn update_renames_in_place() {
        let mut steps = defaults();
        let id = steps[1].id;
        let (updated, remap) = update_step(&mut steps, id, "Habits", None).unwrap();

        assert_eq!(updated.order, 2);
        assert_eq!(updated.name, "Habits");
        assert!(remap.is_identity());
    }

    #[test]
    fn update_moves_step() {
        let mut steps = defaults();
        let id = steps[0].id;
        let (moved, remap) = update_step(&mut steps, id, "Client Hx", Some(3)).unwrap();

        assert_eq!(moved.order, 3);
        assert_eq!(
            names(&steps),
            vec![("Substances", 1), ("Sex & Health", 2), ("Client Hx", 3)]
        );
        assert_eq!(remap.apply(1), Some(3));
        assert_eq!(remap.apply(2), Some(1));
        assert_eq!(remap.apply(3), Some(2));
    }

    #[test]
    fn update_unknown_step_fails() {
        let mut steps = defaults();
        assert_eq!(
            update_step(&mut steps, Uuid::new_v4(), "x", None).unwrap_err(),
            FormError::StepNotFound
        );
    }

    #[test]
    fn delete_closes_gap() {
        let mut steps = defaults();
        let id = steps[1].id;
        let (removed, remap) = delete_step(&mut steps, id).unwrap();

        assert_eq!(removed.name, "Substances");
        assert_eq!(names(&steps), vec![("Client Hx", 1), ("Sex & Health", 2)]);
        assert_eq!(remap.removed(), Some(2));
        assert_eq!(remap.apply(1), Some(1));
        assert_eq!(remap.apply(2), None);
        assert_eq!(remap.apply(3), Some(2));
    }

    #[test]
    fn delete_refuses_last_active_step() {
        let mut steps = defaults();
        steps[0].is_active = false;
        steps[1].is_active = false;
        let id = steps[2].id;

        assert_eq!(delete_step(&mut steps, id).unwrap_err(), FormError::LastActiveStep);
        assert_eq!(steps.len(), 3);

        // a disabled step can still go
        let disabled = steps[0].id;
        assert!(delete_step(&mut steps, disabled).is_ok());
    }

    fn gapped() -> Vec<Step> {
        vec![
            Step::new("Client Hx", 1),
            Step::new("Substances", 2),
            Step::new("Sex & Health", 3),
            Step::new("Consent", 5),
        ]
    }

    #[test]
    fn delete_on_gapped_orders_reports_every_shift() {
        let mut steps = gapped();
        let id = steps[1].id;
        let (_, remap) = delete_step(&mut steps, id).unwrap();

        assert_eq!(
            names(&steps),
            vec![("Client Hx", 1), ("Sex & Health", 2), ("Consent", 3)]
        );
        assert_eq!(remap.apply(2), None);
        assert_eq!(remap.apply(3), Some(2));
        assert_eq!(remap.apply(5), Some(3));
    }

    #[test]
    fn add_and_update_on_gapped_orders_report_the_closed_gap() {
        let mut steps = gapped();
        let (_, remap) = add_step(&mut steps, "Vitals", None).unwrap();
        assert_eq!(remap.apply(5), Some(4));
        assert!(!remap.is_identity());

        let mut steps = gapped();
        let id = steps[0].id;
        let (_, remap) = update_step(&mut steps, id, "History", None).unwrap();
        assert_eq!(remap.apply(1), Some(1));
        assert_eq!(remap.apply(5), Some(4));
    }

    #[test]
    fn delete_removes_the_stored_order_of_a_gapped_step() {
        let mut steps = gapped();
        let id = steps[3].id;
        let (removed, remap) = delete_step(&mut steps, id).unwrap();

        assert_eq!(removed.name, "Consent");
        assert_eq!(remap.removed(), Some(5));
        assert_eq!(remap.apply(5), None);
        assert_eq!(remap.apply(3), Some(3));
    }
}
