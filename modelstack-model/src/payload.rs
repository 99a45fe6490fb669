//! Wire shapes consumed from the models service.
//!
//! These mirror the JSON the schema service returns and are only used as
//! input to the hierarchy builder, the metadata builder and the linker.

use crate::meta::ModelMetaData;
use crate::node::ModelType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw `getMetaData()` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetaDataPayload {
    pub semantics: Vec<ModelMetaData>,
    pub definitions: Vec<ModelMetaData>,
    pub properties: Vec<ModelMetaData>,
    pub fields: Vec<ModelMetaData>,
    pub regions: Vec<ModelMetaData>,
    pub controls: Vec<ModelMetaData>,
    pub control_params: Vec<ModelMetaData>,
    pub headers: Vec<ModelMetaData>,
    pub actions: Vec<ModelMetaData>,
    pub action_executions: Vec<ModelMetaData>,
    pub action_groups: Vec<ModelMetaData>,
}

/// One class of the `getHierarchy()` payload with its direct sub types.
///
/// Sub types are definitions; a class whose `parent_id` names another class
/// is nested under that class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyEntry {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub sub_types: Vec<HierarchyEntry>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
}

/// A `{name, type, value}` attribute entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributePayload {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub value: Value,
}

impl AttributePayload {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            value,
        }
    }
}

/// A model entity as sent by the service: classes, definitions, properties
/// and every nested entity share this shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelPayload {
    pub id: String,
    pub parent: Option<String>,
    pub region_id: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub attributes: Vec<AttributePayload>,
    pub fields: Vec<ModelPayload>,
    pub regions: Vec<ModelPayload>,
    pub headers: Vec<ModelPayload>,
    pub actions: Vec<ModelPayload>,
    pub action_groups: Vec<ModelPayload>,
    pub controls: Vec<ModelPayload>,
    pub control_params: Vec<ModelPayload>,
    pub action_executions: Vec<ModelPayload>,
}

impl ModelPayload {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Nested payloads of the given type.
    pub fn children(&self, model_type: ModelType) -> &[ModelPayload] {
        match model_type {
            ModelType::Field => &self.fields,
            ModelType::Region => &self.regions,
            ModelType::Header => &self.headers,
            ModelType::Action => &self.actions,
            ModelType::ActionGroup => &self.action_groups,
            ModelType::Control => &self.controls,
            ModelType::ControlParam => &self.control_params,
            ModelType::ActionExecution => &self.action_executions,
            _ => &[],
        }
    }
}

/// Raw `getModelData(id)` payload: the requested model and its ancestors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDataPayload {
    pub classes: Vec<ModelPayload>,
    pub definitions: Vec<ModelPayload>,
}
