use crate::list::{Identified, ModelList};
use modelstack_types::Language;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single scalar value with its persisted baseline.
///
/// `dirty` always equals `value != old_value` after `set_value`; `set_dirty`
/// may override it explicitly until the next mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    language: Option<Language>,
    value: Value,
    old_value: Value,
    dirty: bool,
}

impl ModelValue {
    /// A clean value whose baseline equals `value`.
    pub fn new(value: Value) -> Self {
        Self {
            language: None,
            old_value: value.clone(),
            value,
            dirty: false,
        }
    }

    /// A clean localized value.
    pub fn localized(language: Language, value: Value) -> Self {
        Self {
            language: Some(language),
            ..Self::new(value)
        }
    }

    pub fn language(&self) -> Option<&Language> {
        self.language.as_ref()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn old_value(&self) -> &Value {
        &self.old_value
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = value;
        self.dirty = self.value != self.old_value;
    }

    /// Moves the baseline and recomputes the dirty flag.
    pub fn set_old_value(&mut self, old_value: Value) {
        self.old_value = old_value;
        self.dirty = self.value != self.old_value;
    }

    pub fn restore_value(&mut self) {
        self.value = self.old_value.clone();
        self.dirty = false;
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Accepts the current value as the new baseline (after a save).
    pub fn commit(&mut self) {
        self.old_value = self.value.clone();
        self.dirty = false;
    }

    /// `null`, an empty string and an empty array count as empty.
    pub fn is_empty(&self) -> bool {
        is_empty_value(&self.value)
    }
}

impl Identified for ModelValue {
    fn model_id(&self) -> &str {
        self.language.as_ref().map_or("", Language::as_str)
    }
}

pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// The value slot of an attribute: one scalar or one scalar per language.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Single(ModelValue),
    Multi(ModelList<ModelValue>),
}

impl AttributeValue {
    /// Builds a clean value. Multi-language values are given as a
    /// `{LANG: value}` object; language keys are normalized.
    pub fn from_json(multi_language: bool, value: Value) -> crate::ModelResult<Self> {
        if !multi_language {
            return Ok(Self::Single(ModelValue::new(value)));
        }
        let mut values = ModelList::new();
        match value {
            Value::Object(entries) => {
                for (code, value) in entries {
                    values.insert(ModelValue::localized(Language::parse(&code)?, value))?;
                }
            }
            Value::Null => {}
            Value::String(s) if s.is_empty() => {}
            other => {
                return Err(crate::ModelError::InvalidValue(format!(
                    "expected a language map, got {other}"
                )));
            }
        }
        Ok(Self::Multi(values))
    }

    pub fn is_multi_language(&self) -> bool {
        matches!(self, Self::Multi(_))
    }

    /// An unsealed copy that shares nothing with `self`.
    pub fn detached(&self) -> Self {
        match self {
            Self::Single(value) => Self::Single(value.clone()),
            Self::Multi(values) => Self::Multi(values.unsealed_copy()),
        }
    }

    pub fn values(&self) -> Vec<&ModelValue> {
        match self {
            Self::Single(value) => vec![value],
            Self::Multi(values) => values.models().iter().collect(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.values().iter().any(|v| v.is_dirty())
    }

    pub fn is_empty(&self) -> bool {
        self.values().iter().all(|v| v.is_empty())
    }

    /// Current value as JSON: a scalar, or a `{LANG: value}` object.
    pub fn current(&self) -> Value {
        match self {
            Self::Single(value) => value.value().clone(),
            Self::Multi(values) => Value::Object(
                values
                    .iter()
                    .map(|(code, v)| (code.to_string(), v.value().clone()))
                    .collect(),
            ),
        }
    }

    /// Baseline as JSON, shaped like [`AttributeValue::current`].
    /// Languages added since the baseline are left out.
    pub fn baseline(&self) -> Value {
        match self {
            Self::Single(value) => value.old_value().clone(),
            Self::Multi(values) => Value::Object(
                values
                    .iter()
                    .filter(|(_, v)| !v.old_value().is_null())
                    .map(|(code, v)| (code.to_string(), v.old_value().clone()))
                    .collect(),
            ),
        }
    }
}
