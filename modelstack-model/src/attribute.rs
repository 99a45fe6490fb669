use crate::error::{ModelError, ModelResult};
use crate::list::{Identified, Sealable};
use crate::meta::{ModelMetaData, is_multi_language};
use crate::value::{AttributeValue, ModelValue};
use modelstack_types::{AttributeId, Language, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Where an attribute instance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeSource {
    /// Created from a metadata default.
    Metadata,
    /// Read from model data.
    Payload,
    /// Copy-on-write override of an inherited attribute.
    Copy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRestrictions {
    pub updateable: bool,
    pub visible: bool,
}

impl Default for AttributeRestrictions {
    fn default() -> Self {
        Self {
            updateable: true,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    Mandatory,
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub label: String,
}

/// Validation state of one attribute. Recomputed by the validator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeValidation {
    errors: Vec<ValidationError>,
}

impl AttributeValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn add(&mut self, kind: ValidationErrorKind, label: impl Into<String>) {
        self.errors.push(ValidationError {
            kind,
            label: label.into(),
        });
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }
}

/// A typed, named value slot on a model entity.
///
/// `parent` is the node that holds the attribute. `reference` points at the
/// ancestor attribute this one overrides, if any.
#[derive(Debug, Clone)]
pub struct ModelAttribute {
    id: String,
    kind: String,
    value: AttributeValue,
    meta: Option<Arc<ModelMetaData>>,
    parent: NodeId,
    reference: Option<AttributeId>,
    source: AttributeSource,
    restrictions: AttributeRestrictions,
    validation: AttributeValidation,
    sealed: bool,
}

impl ModelAttribute {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, parent: NodeId, value: AttributeValue) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            value,
            meta: None,
            parent,
            reference: None,
            source: AttributeSource::Payload,
            restrictions: AttributeRestrictions::default(),
            validation: AttributeValidation::default(),
            sealed: false,
        }
    }

    /// Creates a clean attribute from a JSON value, localized when the type
    /// is multi-language.
    pub fn from_json(
        id: impl Into<String>,
        kind: impl Into<String>,
        parent: NodeId,
        value: Value,
    ) -> ModelResult<Self> {
        let kind = kind.into();
        let value = AttributeValue::from_json(is_multi_language(&kind), value)?;
        Ok(Self::new(id, kind, parent, value))
    }

    /// Creates an attribute holding the metadata default.
    pub fn from_meta(meta: Arc<ModelMetaData>, name: &str, parent: NodeId) -> ModelResult<Self> {
        let mut attribute = Self::from_json(name, meta.kind.clone(), parent, meta.default_value.clone())?;
        attribute.source = AttributeSource::Metadata;
        attribute.set_meta(meta);
        Ok(attribute)
    }

    /// Creates an override of `reference` owned by `parent`.
    ///
    /// Both the value and its baseline start at the reference's current
    /// value, so the copy is clean until it is changed.
    pub fn copy_from_reference(reference: &ModelAttribute, reference_id: AttributeId, parent: NodeId) -> Self {
        let mut copy = Self {
            id: reference.id.clone(),
            kind: reference.kind.clone(),
            value: reference.value.detached(),
            meta: reference.meta.clone(),
            parent,
            reference: Some(reference_id),
            source: AttributeSource::Copy,
            restrictions: reference.restrictions,
            validation: AttributeValidation::default(),
            sealed: false,
        };
        copy.commit();
        copy
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn value(&self) -> &AttributeValue {
        &self.value
    }

    pub fn meta(&self) -> Option<&Arc<ModelMetaData>> {
        self.meta.as_ref()
    }

    /// Attaches metadata and derives the restrictions from it.
    pub fn set_meta(&mut self, meta: Arc<ModelMetaData>) {
        self.restrictions = AttributeRestrictions {
            updateable: meta.updateable,
            visible: meta.visible,
        };
        self.meta = Some(meta);
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    pub fn reference(&self) -> Option<AttributeId> {
        self.reference
    }

    pub(crate) fn set_reference(&mut self, reference: Option<AttributeId>) {
        self.reference = reference;
    }

    pub fn source(&self) -> AttributeSource {
        self.source
    }

    pub fn restrictions(&self) -> AttributeRestrictions {
        self.restrictions
    }

    pub fn validation(&self) -> &AttributeValidation {
        &self.validation
    }

    pub fn validation_mut(&mut self) -> &mut AttributeValidation {
        &mut self.validation
    }

    /// The value for a language. Single values are returned for any language.
    pub fn value_by_language(&self, language: &Language) -> Option<&ModelValue> {
        match &self.value {
            AttributeValue::Single(value) => Some(value),
            AttributeValue::Multi(values) => values.get_model(language.as_str()),
        }
    }

    pub fn current_value(&self) -> Value {
        self.value.current()
    }

    pub fn is_dirty(&self) -> bool {
        self.value.is_dirty()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    fn check_mutable(&self) -> ModelResult<()> {
        if self.sealed {
            return Err(ModelError::Sealed(format!("attribute {}", self.id)));
        }
        Ok(())
    }

    fn check_updateable(&self) -> ModelResult<()> {
        self.check_mutable()?;
        // read-only attributes may still be filled in while empty
        if !self.restrictions.updateable && !self.is_empty() {
            return Err(ModelError::NotUpdateable {
                model: self.parent.to_string(),
                attribute: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Sets the value. Multi-language attributes take a `{LANG: value}`
    /// object and only touch the languages it names.
    pub fn set_value(&mut self, value: Value) -> ModelResult<()> {
        self.check_updateable()?;
        match &mut self.value {
            AttributeValue::Single(current) => current.set_value(value),
            AttributeValue::Multi(values) => {
                let Value::Object(entries) = value else {
                    return Err(ModelError::InvalidValue(format!(
                        "attribute {} expects a language map",
                        self.id
                    )));
                };
                for (code, value) in entries {
                    let language = Language::parse(&code)?;
                    match values.get_model_mut(language.as_str()) {
                        Some(current) => current.set_value(value),
                        None => {
                            let mut added = ModelValue::localized(language, Value::Null);
                            added.set_value(value);
                            values.insert(added)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Sets the value of one language.
    pub fn set_language_value(&mut self, language: &Language, value: Value) -> ModelResult<()> {
        if !self.value.is_multi_language() {
            return self.set_value(value);
        }
        let mut entry = serde_json::Map::new();
        entry.insert(language.as_str().to_string(), value);
        self.set_value(Value::Object(entry))
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.for_each_value(|value| value.set_dirty(dirty));
    }

    /// Resets every value to its baseline.
    pub fn restore_attribute(&mut self) -> ModelResult<()> {
        self.check_mutable()?;
        self.for_each_value(ModelValue::restore_value);
        Ok(())
    }

    /// Accepts the current values as the new baseline.
    pub fn commit(&mut self) {
        self.for_each_value(ModelValue::commit);
    }

    fn for_each_value(&mut self, mut apply: impl FnMut(&mut ModelValue)) {
        match &mut self.value {
            AttributeValue::Single(value) => apply(value),
            AttributeValue::Multi(values) => {
                let keys: Vec<String> = values.keys().to_vec();
                for key in keys {
                    if let Some(value) = values.get_model_mut(&key) {
                        apply(value);
                    }
                }
            }
        }
    }
}

impl Identified for ModelAttribute {
    fn model_id(&self) -> &str {
        &self.id
    }
}

impl Sealable for ModelAttribute {
    fn seal(&mut self) {
        self.sealed = true;
    }

    fn is_sealed(&self) -> bool {
        self.sealed
    }
}
