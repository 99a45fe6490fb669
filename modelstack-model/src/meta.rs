//! Attribute metadata and the builder turning the raw metadata payload into
//! sealed per-type collections.

use crate::description::LanguagePreference;
use crate::error::ModelResult;
use crate::list::{Identified, ModelList};
use crate::node::ModelType;
use crate::payload::MetaDataPayload;
use modelstack_rules::ModelRule;
use modelstack_types::Language;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Attribute types whose value is a `{LANG: value}` map.
pub const MULTI_LANGUAGE_TYPES: &[&str] = &["label", "multiLangString"];

/// Returns whether values of the given attribute type are localized.
pub fn is_multi_language(kind: &str) -> bool {
    MULTI_LANGUAGE_TYPES.contains(&kind)
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationModel {
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default)]
    pub rules: Vec<ModelRule>,
}

/// Describes one attribute an entity of a given type can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetaData {
    #[serde(alias = "name")]
    pub id: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub default_value: Value,
    #[serde(default)]
    pub options: Vec<Value>,
    #[serde(default)]
    pub labels: BTreeMap<Language, String>,
    #[serde(default)]
    pub validation_model: ValidationModel,
    #[serde(default = "default_true")]
    pub updateable: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
}

impl ModelMetaData {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: None,
            kind: kind.into(),
            order: None,
            default_value: Value::Null,
            options: Vec::new(),
            labels: BTreeMap::new(),
            validation_model: ValidationModel::default(),
            updateable: true,
            visible: true,
        }
    }

    /// Key under which attributes described by this metadata are stored:
    /// the URI for semantic attributes, the identifier otherwise.
    pub fn attribute_name(&self, model_type: ModelType) -> &str {
        match (model_type, &self.uri) {
            (ModelType::Class | ModelType::Property, Some(uri)) => uri,
            _ => &self.id,
        }
    }

    pub fn is_multi_language(&self) -> bool {
        is_multi_language(&self.kind)
    }

    pub fn description(&self, languages: &LanguagePreference) -> String {
        languages.describe(&self.labels, &self.id)
    }
}

impl Identified for ModelMetaData {
    fn model_id(&self) -> &str {
        &self.id
    }
}

pub type MetaDataList = ModelList<Arc<ModelMetaData>>;

/// Sealed metadata collections, one per entity type.
#[derive(Debug, Clone, Default)]
pub struct ModelsMetaData {
    pub semantics: MetaDataList,
    pub definitions: MetaDataList,
    pub properties: MetaDataList,
    pub fields: MetaDataList,
    pub regions: MetaDataList,
    pub controls: MetaDataList,
    pub control_params: MetaDataList,
    pub headers: MetaDataList,
    pub actions: MetaDataList,
    pub action_executions: MetaDataList,
    pub action_groups: MetaDataList,
}

impl ModelsMetaData {
    /// Metadata of the attributes an entity of `model_type` can carry.
    pub fn for_type(&self, model_type: ModelType) -> Option<&MetaDataList> {
        match model_type {
            ModelType::Class => Some(&self.semantics),
            ModelType::Definition => Some(&self.definitions),
            ModelType::Property => Some(&self.properties),
            ModelType::Field => Some(&self.fields),
            ModelType::Region => Some(&self.regions),
            ModelType::Control => Some(&self.controls),
            ModelType::ControlParam => Some(&self.control_params),
            ModelType::Header => Some(&self.headers),
            ModelType::Action => Some(&self.actions),
            ModelType::ActionExecution => Some(&self.action_executions),
            ModelType::ActionGroup => Some(&self.action_groups),
            ModelType::Attribute => None,
        }
    }

    pub fn get(&self, model_type: ModelType, name: &str) -> Option<&Arc<ModelMetaData>> {
        self.for_type(model_type)?.get_model(name)
    }
}

/// Converts the raw metadata payload into [`ModelsMetaData`].
pub struct MetaDataBuilder;

impl MetaDataBuilder {
    pub fn build(payload: MetaDataPayload) -> ModelResult<ModelsMetaData> {
        let meta = ModelsMetaData {
            semantics: Self::collect(payload.semantics, ModelType::Class)?,
            definitions: Self::collect(payload.definitions, ModelType::Definition)?,
            properties: Self::collect(payload.properties, ModelType::Property)?,
            fields: Self::collect(payload.fields, ModelType::Field)?,
            regions: Self::collect(payload.regions, ModelType::Region)?,
            controls: Self::collect(payload.controls, ModelType::Control)?,
            control_params: Self::collect(payload.control_params, ModelType::ControlParam)?,
            headers: Self::collect(payload.headers, ModelType::Header)?,
            actions: Self::collect(payload.actions, ModelType::Action)?,
            action_executions: Self::collect(payload.action_executions, ModelType::ActionExecution)?,
            action_groups: Self::collect(payload.action_groups, ModelType::ActionGroup)?,
        };
        debug!(
            semantics = meta.semantics.size(),
            definitions = meta.definitions.size(),
            fields = meta.fields.size(),
            "built models metadata"
        );
        Ok(meta)
    }

    fn collect(mut items: Vec<ModelMetaData>, model_type: ModelType) -> ModelResult<MetaDataList> {
        // stable sort keeps payload order among equal or missing orders
        items.sort_by_key(|meta| meta.order.unwrap_or(i64::MAX));
        let mut list = ModelList::new();
        for meta in items {
            list.insert_with(Arc::new(meta), |meta| {
                meta.attribute_name(model_type).to_string()
            })?;
        }
        list.seal();
        Ok(list)
    }
}
