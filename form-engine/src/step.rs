use itertools::Itertools;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One page of the multi-step form.
///
/// `order` is the only ordering key. Fields reference their step by order,
/// not by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    #[serde(alias = "Id")]
    pub id: Uuid,
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Order")]
    pub order: i32,
    #[serde(alias = "IsActive", default = "default_true")]
    pub is_active: bool,
    #[serde(alias = "Icon", default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(alias = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "Groups", default)]
    pub groups: Vec<StepGroup>,
}

/// UI-only clustering of fields inside a step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepGroup {
    #[serde(alias = "GroupId", alias = "id", default)]
    pub group_id: String,
    #[serde(alias = "Name", alias = "title", default)]
    pub name: String,
    #[serde(alias = "FieldIds", default)]
    pub field_ids: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Step {
    pub fn new(name: impl Into<String>, order: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            order,
            is_active: true,
            icon: None,
            description: None,
            groups: Vec::new(),
        }
    }

    /// Applies the storage normalization rules in place: a nil id gets a fresh
    /// one, orders below 1 become 1 and a blank name becomes `Step {order}`.
    pub fn normalize(&mut self) {
        if self.id.is_nil() {
            self.id = Uuid::new_v4();
        }
        if self.order < 1 {
            self.order = 1;
        }
        if self.name.trim().is_empty() {
            self.name = format!("Step {}", self.order);
        }
        for group in &mut self.groups {
            group.normalize();
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Id of the group created for steps written before grouping existed
    pub fn default_group_id(&self) -> String {
        format!("default_{}", self.id)
    }
}

impl StepGroup {
    pub fn new(group_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            name: name.into(),
            field_ids: Vec::new(),
        }
    }

    fn normalize(&mut self) {
        if self.group_id.trim().is_empty() {
            self.group_id = Uuid::new_v4().to_string();
        }
        self.field_ids = std::mem::take(&mut self.field_ids)
            .into_iter()
            .filter(|id| !id.trim().is_empty())
            .unique()
            .collect();
    }
}

/// Normalizes every step and sorts by order. The sort is stable, so steps
/// sharing an order keep their relative position.
pub fn normalize_steps(steps: impl IntoIterator<Item = Step>) -> Vec<Step> {
    let mut steps: Vec<Step> = steps.into_iter().map(Step::normalized).collect();
    steps.sort_by_key(|s| s.order);
    steps
}

/// Sorts by order, then rewrites orders to 1..=n
pub fn renumber(steps: &mut [Step]) {
    steps.sort_by_key(|s| s.order);
    renumber_in_place(steps);
}

/// Rewrites orders to 1..=n following the slice position
pub fn renumber_in_place(steps: &mut [Step]) {
    for (index, step) in steps.iter_mut().enumerate() {
        step.order = i32::try_from(index + 1).unwrap_or(i32::MAX);
    }
}

pub fn active_count(steps: &[Step]) -> usize {
    steps.iter().filter(|s| s.is_active).count()
}
