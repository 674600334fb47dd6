use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Field type used by older builder revisions to mark step headers stored in
/// the field list. Such entries are never rendered or mapped.
pub const LEGACY_STEP_FIELD_TYPE: &str = "step";

/// Admin-defined input attached to one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(alias = "FieldId")]
    pub field_id: Uuid,
    /// Derived from the display name once, at creation. Used as the posted
    /// form key and as the target of conditional references.
    #[serde(alias = "FieldName")]
    pub field_name: String,
    #[serde(alias = "DisplayName")]
    pub display_name: String,
    #[serde(alias = "FieldType", default = "default_field_type")]
    pub field_type: String,
    #[serde(alias = "Step", default = "default_step")]
    pub step: i32,
    #[serde(alias = "DisplayOrder", default)]
    pub display_order: i32,
    #[serde(alias = "Placeholder", default)]
    pub placeholder: Option<String>,
    #[serde(alias = "IsRequired", default)]
    pub is_required: bool,
    #[serde(alias = "IsConditional", default)]
    pub is_conditional: bool,
    #[serde(alias = "ConditionalLogicJson", default)]
    pub conditional_logic_json: Option<String>,
    #[serde(alias = "OptionsJson", default)]
    pub options_json: Option<String>,
    #[serde(alias = "IsActive", default = "default_true")]
    pub is_active: bool,
    #[serde(alias = "IsDeleted", default)]
    pub is_deleted: bool,
    #[serde(alias = "CreatedAt", default = "Utc::now", deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "UpdatedAt", default, deserialize_with = "lenient_optional_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(alias = "CreatedBy", default = "default_created_by")]
    pub created_by: String,
}

fn default_field_type() -> String {
    "text".to_string()
}

fn default_step() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_created_by() -> String {
    "System".to_string()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // timestamps written without an offset are UTC
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_optional_timestamp(deserializer)?.unwrap_or_else(Utc::now))
}

fn lenient_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// HTML input kind a field type renders as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Number,
    Date,
    Email,
    Tel,
    Textarea,
    Select,
    Checkbox,
    Radio,
    File,
}

impl InputType {
    /// Unknown field types render as text
    pub fn from_field_type(field_type: &str) -> Self {
        match field_type.trim().to_lowercase().as_str() {
            "number" => Self::Number,
            "date" => Self::Date,
            "email" => Self::Email,
            "tel" => Self::Tel,
            "textarea" => Self::Textarea,
            "select" => Self::Select,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "file" => Self::File,
            _ => Self::Text,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Email => "email",
            Self::Tel => "tel",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::File => "file",
        }
    }

    pub fn has_options(self) -> bool {
        matches!(self, Self::Select | Self::Radio)
    }
}

/// Show a field only when another control holds a given value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalLogic {
    #[serde(alias = "DependsOnFieldKey", default)]
    pub depends_on_field_key: String,
    /// A single value or a comma-separated allow-list
    #[serde(alias = "ShowWhenValue", default)]
    pub show_when_value: String,
}

impl ConditionalLogic {
    pub fn new(depends_on_field_key: impl Into<String>, show_when_value: impl Into<String>) -> Self {
        Self {
            depends_on_field_key: depends_on_field_key.into(),
            show_when_value: show_when_value.into(),
        }
    }

    /// Logic missing either side is ignored and the field is always shown
    pub fn is_complete(&self) -> bool {
        !self.depends_on_field_key.trim().is_empty() && !self.show_when_value.trim().is_empty()
    }
}

/// Choice offered by select and radio fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldOption {
    #[serde(alias = "Label", default)]
    pub label: String,
    #[serde(alias = "Value", default)]
    pub value: String,
    #[serde(alias = "IsDefault", default)]
    pub is_default: bool,
}

impl FieldOption {
    fn plain(text: String) -> Self {
        Self {
            label: text.clone(),
            value: text,
            is_default: false,
        }
    }
}

/// Decodes an options payload: either option objects or a plain string list.
/// Anything else yields no options.
pub fn parse_options(raw: Option<&str>) -> Vec<FieldOption> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Vec::new();
    };
    if let Ok(options) = serde_json::from_str::<Vec<FieldOption>>(raw) {
        return options;
    }
    serde_json::from_str::<Vec<String>>(raw)
        .map(|plain| plain.into_iter().map(FieldOption::plain).collect())
        .unwrap_or_default()
}

/// Decodes a conditional logic payload, `None` when absent or unreadable
pub fn parse_conditional_logic(raw: Option<&str>) -> Option<ConditionalLogic> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    serde_json::from_str(raw).ok()
}

impl Field {
    pub fn input_type(&self) -> InputType {
        InputType::from_field_type(&self.field_type)
    }

    pub fn conditional_logic(&self) -> Option<ConditionalLogic> {
        parse_conditional_logic(self.conditional_logic_json.as_deref())
    }

    pub fn options(&self) -> Vec<FieldOption> {
        parse_options(self.options_json.as_deref())
    }

    /// Active, not deleted and not a legacy step marker
    pub fn is_live(&self) -> bool {
        self.is_active && !self.is_deleted && !self.field_type.eq_ignore_ascii_case(LEGACY_STEP_FIELD_TYPE)
    }
}

/// Editable properties of a field, as sent by the builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDraft {
    #[serde(alias = "DisplayName", default)]
    pub display_name: String,
    #[serde(alias = "FieldType", default = "default_field_type")]
    pub field_type: String,
    #[serde(alias = "Step", default = "default_step")]
    pub step: i32,
    #[serde(alias = "Placeholder", default)]
    pub placeholder: Option<String>,
    #[serde(alias = "IsRequired", default)]
    pub is_required: bool,
    #[serde(alias = "IsConditional", default)]
    pub is_conditional: bool,
    #[serde(alias = "ConditionalLogicJson", default)]
    pub conditional_logic_json: Option<String>,
    #[serde(alias = "OptionsJson", default)]
    pub options_json: Option<String>,
}

impl FieldDraft {
    pub fn new(display_name: impl Into<String>, field_type: impl Into<String>, step: i32) -> Self {
        Self {
            display_name: display_name.into(),
            field_type: field_type.into(),
            step,
            placeholder: None,
            is_required: false,
            is_conditional: false,
            conditional_logic_json: None,
            options_json: None,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    #[must_use]
    pub fn shown_when(mut self, logic: &ConditionalLogic) -> Self {
        self.is_conditional = true;
        self.conditional_logic_json = serde_json::to_string(logic).ok();
        self
    }

    #[must_use]
    pub fn with_options(mut self, options_json: impl Into<String>) -> Self {
        self.options_json = Some(options_json.into());
        self
    }

    pub(crate) fn trimmed_placeholder(&self) -> Option<String> {
        self.placeholder
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
    }
}
