//! Field schema types.

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::value::Value;

/// The closed set of field types the engine renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Range,
    Radio,
    Checkbox,
    Toggle,
    ButtonGroup,
    Color,
    Select,
    EnhancedSelect,
    Media,
    File,
    Gallery,
    PostObject,
    RichText,
    Code,
    Repeater,
}

impl FieldType {
    /// The stable wire name (`snake_case`, as schemas serialize it).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::Range => "range",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::Toggle => "toggle",
            Self::ButtonGroup => "button_group",
            Self::Color => "color",
            Self::Select => "select",
            Self::EnhancedSelect => "enhanced_select",
            Self::Media => "media",
            Self::File => "file",
            Self::Gallery => "gallery",
            Self::PostObject => "post_object",
            Self::RichText => "rich_text",
            Self::Code => "code",
            Self::Repeater => "repeater",
        }
    }

    /// Type-appropriate empty value, used when neither a stored value nor
    /// a schema default exists.
    #[must_use]
    pub fn empty_value(self) -> Value {
        match self {
            Self::Number | Self::Range => Value::Number(0.0),
            Self::Checkbox | Self::Toggle => Value::Bool(false),
            Self::Gallery => Value::List(Vec::new()),
            Self::Repeater => Value::Rows(Vec::new()),
            _ => Value::Text(String::new()),
        }
    }

    /// Whether a value's shape is acceptable for this type.
    ///
    /// Legacy posts stored numbers and asset ids as strings, so textual
    /// values are accepted wherever a coercion exists.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Number | Self::Range => value.as_number().is_some(),
            Self::Checkbox | Self::Toggle => value.as_bool().is_some(),
            Self::Gallery => value.as_list().is_some(),
            Self::Repeater => value.as_rows().is_some(),
            Self::Media | Self::File | Self::PostObject => {
                value.as_number().is_some() || matches!(value, Value::Text(_) | Value::Null)
            }
            Self::ButtonGroup | Self::EnhancedSelect => {
                matches!(value, Value::Text(_) | Value::List(_))
            }
            _ => matches!(value, Value::Text(_)),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Layout width share within a row, as a fixed percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FieldWidth {
    Quarter,
    Third,
    Half,
    TwoThirds,
    Full,
}

impl FieldWidth {
    /// Every allowed width, in ascending order (the width menu renders
    /// these).
    pub const ALL: [FieldWidth; 5] = [
        Self::Quarter,
        Self::Third,
        Self::Half,
        Self::TwoThirds,
        Self::Full,
    ];

    /// The percentage this width occupies.
    #[must_use]
    pub fn percent(self) -> u8 {
        match self {
            Self::Quarter => 25,
            Self::Third => 33,
            Self::Half => 50,
            Self::TwoThirds => 66,
            Self::Full => 100,
        }
    }

    /// Parse a percentage from the allowed set.
    #[must_use]
    pub fn from_percent(percent: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.percent() == percent)
    }
}

impl Default for FieldWidth {
    fn default() -> Self {
        Self::Full
    }
}

impl TryFrom<u8> for FieldWidth {
    type Error = String;

    fn try_from(percent: u8) -> Result<Self, Self::Error> {
        Self::from_percent(percent).ok_or_else(|| format!("invalid width percent {percent}"))
    }
}

impl From<FieldWidth> for u8 {
    fn from(width: FieldWidth) -> Self {
        width.percent()
    }
}

/// Ordered option set for choice fields. Insertion order is display order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(Vec<(String, String)>);

impl Options {
    /// An empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one `value → label` pair, preserving insertion order.
    pub fn push(&mut self, value: impl Into<String>, label: impl Into<String>) {
        self.0.push((value.into(), label.into()));
    }

    /// Iterate `(value, label)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(v, l)| (v.as_str(), l.as_str()))
    }

    /// Whether `value` is a declared option.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|(v, _)| v == value)
    }

    /// Label for `value`, if declared.
    #[must_use]
    pub fn label(&self, value: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, l)| l.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first duplicated option value, if any.
    #[must_use]
    pub fn first_duplicate(&self) -> Option<&str> {
        for (i, (value, _)) in self.0.iter().enumerate() {
            if self.0[..i].iter().any(|(v, _)| v == value) {
                return Some(value);
            }
        }
        None
    }
}

impl<V: Into<String>, L: Into<String>> FromIterator<(V, L)> for Options {
    fn from_iter<T: IntoIterator<Item = (V, L)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(v, l)| (v.into(), l.into()))
                .collect(),
        )
    }
}

/// Declarative description of one form input.
///
/// Immutable once registered. Constructed with the builder methods:
///
/// ```
/// use bform_schema::{FieldSchema, FieldType, FieldWidth, Value};
///
/// let field = FieldSchema::new("title", FieldType::Text)
///     .with_label("Title")
///     .with_default(Value::text(""))
///     .with_width(FieldWidth::Half);
/// assert_eq!(field.id, "title");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Unique within its enclosing field list.
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: String,
    /// Longer description shown under the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Short inline hint shown next to the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Declared default; falls back to [`FieldType::empty_value`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Numeric lower bound, or minimum row count for repeaters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Numeric upper bound, or maximum row count for repeaters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Options::is_empty")]
    pub options: Options,
    /// Multi-select capability for choice types.
    #[serde(default)]
    pub multiple: bool,
    /// Mime/type filter for file pickers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_types: Vec<String>,
    /// Content-kind filter for post pickers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_kinds: Vec<String>,
    /// Free-text filtering for enhanced selects.
    #[serde(default = "default_true")]
    pub searchable: bool,
    /// Display rows for textareas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u8>,
    /// Checkbox-specific label override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkbox_label: Option<String>,
    /// Language tag for code fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub width: FieldWidth,
    /// Participation in the auto-save coordinator. `None` means "host
    /// context decides" (modal fields auto-save, others do not).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autosave: Option<bool>,
    /// Sub-field schemas; present only on repeaters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSchema>,
}

fn default_true() -> bool {
    true
}

impl FieldSchema {
    /// A schema with the given id and type; everything else defaulted.
    #[must_use]
    pub fn new(id: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            field_type,
            label: String::new(),
            description: None,
            help: None,
            placeholder: None,
            default: None,
            min: None,
            max: None,
            step: None,
            options: Options::new(),
            multiple: false,
            allowed_types: Vec::new(),
            post_kinds: Vec::new(),
            searchable: true,
            rows: None,
            checkbox_label: None,
            language: None,
            width: FieldWidth::Full,
            autosave: None,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64, step: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.step = Some(step);
        self
    }

    #[must_use]
    pub fn with_row_bounds(mut self, min: usize, max: usize) -> Self {
        self.min = Some(min as f64);
        self.max = Some(max as f64);
        self
    }

    #[must_use]
    pub fn with_options<V: Into<String>, L: Into<String>>(
        mut self,
        options: impl IntoIterator<Item = (V, L)>,
    ) -> Self {
        self.options = options.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    #[must_use]
    pub fn with_allowed_types<S: Into<String>>(
        mut self,
        types: impl IntoIterator<Item = S>,
    ) -> Self {
        self.allowed_types = types.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_post_kinds<S: Into<String>>(mut self, kinds: impl IntoIterator<Item = S>) -> Self {
        self.post_kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: FieldWidth) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = Some(autosave);
        self
    }

    #[must_use]
    pub fn with_sub_fields(mut self, fields: impl IntoIterator<Item = FieldSchema>) -> Self {
        self.fields = fields.into_iter().collect();
        self
    }

    /// The declared default, or the type-appropriate empty value.
    #[must_use]
    pub fn effective_default(&self) -> Value {
        self.default
            .clone()
            .unwrap_or_else(|| self.field_type.empty_value())
    }

    /// Minimum row count for repeaters (0 when unset).
    #[must_use]
    pub fn min_rows(&self) -> usize {
        self.min.map_or(0, |m| m.max(0.0) as usize)
    }

    /// Maximum row count for repeaters (`None` = unbounded).
    #[must_use]
    pub fn max_rows(&self) -> Option<usize> {
        self.max.map(|m| m.max(0.0) as usize)
    }
}

/// Validate one field list (one scope): unique ids, consistent constraints,
/// default shapes, duplicate options. Recurses into repeater sub-fields.
pub fn validate_fields(scope: &str, fields: &[FieldSchema]) -> Result<(), SchemaError> {
    for (i, field) in fields.iter().enumerate() {
        if fields[..i].iter().any(|f| f.id == field.id) {
            return Err(SchemaError::DuplicateFieldId {
                scope: scope.to_owned(),
                id: field.id.clone(),
            });
        }
        if let Some(value) = self::duplicate_option(field) {
            return Err(SchemaError::DuplicateOptionValue {
                field: field.id.clone(),
                value,
            });
        }
        if let Some(default) = &field.default {
            if !field.field_type.accepts(default) && !default.is_empty() {
                return Err(SchemaError::DefaultShapeMismatch {
                    field: field.id.clone(),
                    field_type: field.field_type.name().to_owned(),
                });
            }
        }
        if let (Some(min), Some(max)) = (field.min, field.max) {
            if min > max {
                return Err(SchemaError::InvalidConstraint {
                    field: field.id.clone(),
                    reason: format!("min {min} > max {max}"),
                });
            }
        }
        if let Some(step) = field.step {
            if step <= 0.0 {
                return Err(SchemaError::InvalidConstraint {
                    field: field.id.clone(),
                    reason: format!("step {step} must be positive"),
                });
            }
        }
        if field.field_type == FieldType::Repeater {
            validate_fields(&format!("{scope}.{}", field.id), &field.fields)?;
        }
    }
    Ok(())
}

fn duplicate_option(field: &FieldSchema) -> Option<String> {
    field.options.first_duplicate().map(str::to_owned)
}
