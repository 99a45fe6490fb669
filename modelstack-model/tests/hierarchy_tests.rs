//! Hierarchy building, metadata and linking of a class/definition chain.

use modelstack_model::{
    HierarchyEntry, LanguagePreference, MetaDataBuilder, MetaDataPayload, ModelDataPayload, ModelHierarchy,
    ModelLinker, ModelTree, ModelType, ModelsMetaData,
};
use modelstack_types::{Language, NodeId};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

// ── Fixtures ────────────────────────────────────────────────────

fn make_hierarchy_entries() -> Vec<HierarchyEntry> {
    serde_json::from_value(json!([
        {
            "id": "emf:Entity",
            "parentId": null,
            "labels": { "BG": "emf:Елемент", "EN": "emf:Entity" },
            "subTypes": [
                { "id": "entity", "parentId": null, "labels": { "BG": "Обект", "EN": "Entity" }, "abstract": true },
                { "id": "media", "parentId": "entity", "labels": { "BG": "Медия", "EN": "Media" }, "abstract": true }
            ]
        },
        {
            "id": "emf:Object",
            "parentId": "emf:Entity",
            "labels": { "BG": "emf:Обект", "EN": "emf:Object" },
            "subTypes": [
                { "id": "audio", "parentId": "media", "labels": { "BG": "Аудио", "EN": "Audio" } },
                { "id": "video", "parentId": "media", "labels": { "BG": "Видео", "EN": "Video" } }
            ]
        }
    ]))
    .unwrap()
}

fn make_meta_payload() -> Value {
    json!({
        "semantics": [
            {
                "id": "title", "uri": "http://purl.org/dc/terms/title", "type": "label", "defaultValue": "",
                "validationModel": { "mandatory": true },
                "labels": { "en": "Title", "bg": "Заглавие" }
            },
            {
                "id": "description", "uri": "http://purl.org/dc/terms/description", "type": "multiLangString",
                "defaultValue": "",
                "labels": { "en": "Description", "bg": "Описание" }
            }
        ],
        "definitions": [
            { "id": "identifier", "type": "string", "defaultValue": "", "labels": { "en": "Identifier" } },
            { "id": "abstract", "type": "boolean", "defaultValue": true, "labels": { "en": "Is abstract", "bg": "Абстрактна" } },
            { "id": "label", "type": "label", "defaultValue": "", "labels": { "en": "Label", "bg": "Име" } }
        ],
        "regions": [
            { "id": "label", "type": "label", "defaultValue": "" },
            { "id": "order", "type": "integer", "defaultValue": 0 }
        ],
        "fields": [
            { "id": "label", "type": "label", "defaultValue": "" },
            { "id": "displayType", "type": "displayType", "defaultValue": "HIDDEN" },
            { "id": "codeList", "type": "codeList", "defaultValue": "" }
        ]
    })
}

fn make_meta() -> ModelsMetaData {
    let payload: MetaDataPayload = serde_json::from_value(make_meta_payload()).unwrap();
    MetaDataBuilder::build(payload).unwrap()
}

fn make_field(id: &str, region: Option<&str>, en: &str, bg: &str) -> Value {
    json!({
        "id": id,
        "regionId": region,
        "attributes": [
            { "name": "label", "type": "label", "value": { "en": en, "bg": bg } },
            { "name": "displayType", "type": "displayType", "value": "EDITABLE" }
        ]
    })
}

fn make_model_data() -> ModelDataPayload {
    serde_json::from_value(json!({
        "classes": [{
            "id": "emf:Entity",
            "labels": { "en": "Entity" },
            "attributes": [
                { "name": "http://purl.org/dc/terms/title", "type": "label", "value": { "en": "Entity", "bg": "Обект" } },
                {
                    "name": "http://purl.org/dc/terms/description", "type": "multiLangString",
                    "value": { "en": "Some description", "bg": "Някакво описание" }
                }
            ]
        }],
        "definitions": [
            {
                "id": "media",
                "parent": "entity",
                "attributes": [
                    { "name": "abstract", "type": "boolean", "value": false },
                    { "name": "label", "type": "label", "value": { "en": "Media", "bg": "Медиа" } }
                ],
                "fields": [
                    make_field("title", Some("generalDetails"), "Title", "Наименование"),
                    make_field("description", None, "Description", "Описание"),
                    make_field("emailAddress", Some("specificDetails"), "E-mail address", "Електронна поща")
                ],
                "regions": [
                    {
                        "id": "generalDetails",
                        "attributes": [
                            { "name": "label", "type": "label", "value": { "en": "Base details", "bg": "Главни детайли" } },
                            { "name": "order", "type": "integer", "value": 10 }
                        ]
                    },
                    {
                        "id": "specificDetails",
                        "attributes": [
                            { "name": "label", "type": "label", "value": { "en": "Specific details", "bg": "Специфични детайли" } },
                            { "name": "order", "type": "integer", "value": 20 }
                        ]
                    }
                ]
            },
            {
                "id": "entity",
                "attributes": [
                    { "name": "identifier", "type": "string", "value": "entity" },
                    { "name": "abstract", "type": "boolean", "value": true },
                    { "name": "label", "type": "label", "value": { "en": "entity", "bg": "обект" } }
                ],
                "fields": [
                    make_field("title", Some("generalDetails"), "Title", "Наименование"),
                    make_field("description", None, "Description", "Описание")
                ],
                "regions": [{
                    "id": "generalDetails",
                    "attributes": [
                        { "name": "label", "type": "label", "value": { "en": "Base details", "bg": "Главни детайли" } },
                        { "name": "order", "type": "integer", "value": 10 }
                    ]
                }]
            }
        ]
    }))
    .unwrap()
}

fn make_languages(user: &str, system: &str) -> LanguagePreference {
    LanguagePreference::new(Language::parse(user).unwrap(), Language::parse(system).unwrap())
}

fn lang(code: &str) -> Language {
    Language::parse(code).unwrap()
}

fn make_hierarchy() -> (ModelTree, ModelHierarchy) {
    let mut tree = ModelTree::new();
    let hierarchy = ModelHierarchy::build(&mut tree, &make_hierarchy_entries()).unwrap();
    (tree, hierarchy)
}

/// Builds the hierarchy and links `emf:Entity`, `entity` and `media`.
fn make_linked() -> (ModelTree, ModelHierarchy) {
    let (mut tree, hierarchy) = make_hierarchy();
    let meta = make_meta();
    let linker = ModelLinker::new(&meta);
    let data = make_model_data();

    let class = hierarchy.get("emf:Entity").unwrap();
    linker.link_model(&mut tree, class, &data.classes[0]).unwrap();
    // ancestors before descendants
    let entity = hierarchy.get("entity").unwrap();
    linker.link_model(&mut tree, entity, &data.definitions[1]).unwrap();
    let media = hierarchy.get("media").unwrap();
    linker.link_model(&mut tree, media, &data.definitions[0]).unwrap();
    (tree, hierarchy)
}

fn ids(tree: &ModelTree, nodes: impl IntoIterator<Item = NodeId>) -> Vec<String> {
    nodes.into_iter().map(|node| tree.node(node).id().to_string()).collect()
}

// ── Hierarchy ───────────────────────────────────────────────────

#[test]
fn builds_class_tree() {
    let (tree, hierarchy) = make_hierarchy();

    assert_eq!(hierarchy.tree.len(), 1);
    let root = &hierarchy.tree[0];
    assert_eq!(tree.node(root.root).id(), "emf:Entity");

    let children = ids(&tree, root.children.iter().map(|item| item.root));
    assert_eq!(children, vec!["entity", "emf:Object"]);

    let entity = &root.children[0];
    assert_eq!(ids(&tree, entity.children.iter().map(|item| item.root)), vec!["media"]);

    let object = &root.children[1];
    assert_eq!(ids(&tree, object.children.iter().map(|item| item.root)), vec!["audio", "video"]);
}

#[test]
fn builds_flat_index() {
    let (tree, hierarchy) = make_hierarchy();

    assert_eq!(hierarchy.flat.len(), 6);
    for id in ["emf:Entity", "emf:Object", "entity", "media", "audio", "video"] {
        let node = hierarchy.get(id).unwrap();
        assert_eq!(tree.node(node).id(), id);
        assert_eq!(tree.get_model(id), Some(node));
    }
    assert_eq!(tree.node(hierarchy.get("emf:Object").unwrap()).model_type(), ModelType::Class);
    assert_eq!(tree.node(hierarchy.get("audio").unwrap()).model_type(), ModelType::Definition);
}

#[test]
fn links_parents_and_classes() {
    let (tree, hierarchy) = make_hierarchy();
    let node = |id: &str| hierarchy.get(id).unwrap();

    assert_eq!(tree.node(node("audio")).parent(), Some(node("media")));
    assert_eq!(tree.node(node("video")).parent(), Some(node("media")));
    assert_eq!(tree.node(node("media")).parent(), Some(node("entity")));
    assert_eq!(tree.node(node("emf:Object")).parent(), Some(node("emf:Entity")));

    assert_eq!(tree.node(node("media")).class(), Some(node("emf:Entity")));
    assert_eq!(tree.node(node("entity")).class(), Some(node("emf:Entity")));
    assert_eq!(tree.node(node("audio")).class(), Some(node("emf:Object")));

    assert_eq!(tree.node(node("media")).children(), &[node("audio"), node("video")]);
    assert!(tree.node(node("entity")).is_abstract());
    assert!(!tree.node(node("audio")).is_abstract());
}

#[test]
fn unknown_parent_leaves_model_unlinked() {
    let mut entries = make_hierarchy_entries();
    entries[1].parent_id = Some("emf:Missing".to_string());
    let mut tree = ModelTree::new();

    let hierarchy = ModelHierarchy::build(&mut tree, &entries).unwrap();

    assert_eq!(hierarchy.tree.len(), 2);
    assert_eq!(tree.node(hierarchy.get("emf:Object").unwrap()).parent(), None);
}

#[test]
fn cyclic_parents_are_not_linked() {
    let mut entries = make_hierarchy_entries();
    entries[0].parent_id = Some("emf:Object".to_string());
    let mut tree = ModelTree::new();

    let hierarchy = ModelHierarchy::build(&mut tree, &entries).unwrap();

    let object = hierarchy.get("emf:Object").unwrap();
    let entity = hierarchy.get("emf:Entity").unwrap();
    assert_eq!(tree.node(entity).parent(), Some(object));
    assert_eq!(tree.node(object).parent(), None);
}

// ── Descriptions ────────────────────────────────────────────────

#[test]
fn descriptions_fall_back_to_english() {
    let (tree, hierarchy) = make_hierarchy();
    let languages = make_languages("FI", "DE");

    for (id, expected) in [
        ("emf:Entity", "emf:Entity"),
        ("emf:Object", "emf:Object"),
        ("entity", "Entity"),
        ("media", "Media"),
        ("audio", "Audio"),
        ("video", "Video"),
    ] {
        assert_eq!(tree.description(hierarchy.get(id).unwrap(), &languages), expected);
    }
}

#[test]
fn descriptions_use_user_language() {
    let (tree, hierarchy) = make_hierarchy();
    let languages = make_languages("BG", "DE");

    for (id, expected) in [
        ("emf:Entity", "emf:Елемент"),
        ("emf:Object", "emf:Обект"),
        ("entity", "Обект"),
        ("media", "Медия"),
        ("audio", "Аудио"),
        ("video", "Видео"),
    ] {
        assert_eq!(tree.description(hierarchy.get(id).unwrap(), &languages), expected);
    }
}

#[test]
fn description_defaults_to_identifier() {
    let mut entries = make_hierarchy_entries();
    entries[0].labels.clear();
    let mut tree = ModelTree::new();
    let hierarchy = ModelHierarchy::build(&mut tree, &entries).unwrap();

    let node = hierarchy.get("emf:Entity").unwrap();
    assert_eq!(tree.description(node, &LanguagePreference::default()), "emf:Entity");
    assert_eq!(tree.description_by_language(node, &lang("EN")), None);
}

#[test]
fn linked_model_describes_itself_from_label_attribute() {
    let (tree, hierarchy) = make_linked();
    let media = hierarchy.get("media").unwrap();
    let class = hierarchy.get("emf:Entity").unwrap();

    assert_eq!(tree.description(media, &make_languages("EN", "BG")), "Media");
    // the label attribute wins over the hierarchy label
    assert_eq!(tree.description_by_language(media, &lang("BG")).as_deref(), Some("Медиа"));
    assert_eq!(tree.description_by_language(class, &lang("BG")).as_deref(), Some("Обект"));
}

// ── Metadata ────────────────────────────────────────────────────

#[test]
fn metadata_is_keyed_and_sealed() {
    let meta = make_meta();

    assert!(meta.semantics.is_sealed());
    assert_eq!(
        meta.semantics.keys(),
        &["http://purl.org/dc/terms/title", "http://purl.org/dc/terms/description"]
    );
    let title = meta.get(ModelType::Class, "http://purl.org/dc/terms/title").unwrap();
    assert_eq!(title.kind, "label");
    assert!(title.validation_model.mandatory);
    assert_eq!(title.description(&make_languages("BG", "EN")), "Заглавие");

    let abstract_meta = meta.get(ModelType::Definition, "abstract").unwrap();
    assert_eq!(abstract_meta.labels.get(&lang("EN")).map(String::as_str), Some("Is abstract"));
    assert!(meta.get(ModelType::Attribute, "label").is_none());
}

#[test]
fn metadata_description_defaults_to_identifier() {
    let mut payload = make_meta_payload();
    payload["semantics"][0]["labels"] = json!({});
    let payload: MetaDataPayload = serde_json::from_value(payload).unwrap();
    let meta = MetaDataBuilder::build(payload).unwrap();

    let title = meta.get(ModelType::Class, "http://purl.org/dc/terms/title").unwrap();
    assert_eq!(title.description(&LanguagePreference::default()), "title");
}

#[test]
fn metadata_orders_by_order_then_payload() {
    let payload: MetaDataPayload = serde_json::from_value(json!({
        "fields": [
            { "id": "c" },
            { "id": "b", "order": 2 },
            { "id": "a", "order": 1 }
        ]
    }))
    .unwrap();
    let meta = MetaDataBuilder::build(payload).unwrap();
    assert_eq!(meta.fields.keys(), &["a", "b", "c"]);
}

// ── Linking ─────────────────────────────────────────────────────

#[test]
fn links_model_attributes() {
    let (tree, hierarchy) = make_linked();
    let media = hierarchy.get("media").unwrap();
    let entity = hierarchy.get("entity").unwrap();
    let class = hierarchy.get("emf:Entity").unwrap();

    assert!(tree.node(media).is_loaded());
    assert_eq!(tree.attribute_value(media, "abstract"), Some(json!(false)));
    assert_eq!(tree.attribute_value(entity, "abstract"), Some(json!(true)));
    assert_eq!(
        tree.attribute_value(media, "label"),
        Some(json!({ "EN": "Media", "BG": "Медиа" }))
    );
    // inherited, not redefined by media
    assert_eq!(tree.attribute_of(media, "identifier"), tree.attribute_of(entity, "identifier"));

    let description = tree.attribute_of(class, "http://purl.org/dc/terms/description").unwrap();
    let description = tree.attribute(description);
    assert_eq!(description.kind(), "multiLangString");
    assert_eq!(
        description
            .value_by_language(&lang("BG"))
            .map(|value| value.value().clone()),
        Some(json!("Някакво описание"))
    );
}

#[test]
fn links_fields_over_inherited_fields() {
    let (tree, hierarchy) = make_linked();
    let media = hierarchy.get("media").unwrap();
    let entity = hierarchy.get("entity").unwrap();
    let languages = make_languages("EN", "BG");

    assert_eq!(
        ids(&tree, tree.children_of(media, ModelType::Field)),
        vec!["title", "description", "emailAddress"]
    );
    let title = tree.child(media, ModelType::Field, "title").unwrap();
    assert_eq!(tree.node(title).parent(), Some(media));
    assert_eq!(tree.node(title).reference(), tree.child(entity, ModelType::Field, "title"));
    assert_eq!(tree.description(title, &languages), "Title");
    assert_eq!(tree.description_by_language(title, &lang("BG")).as_deref(), Some("Наименование"));

    let email = tree.child(media, ModelType::Field, "emailAddress").unwrap();
    assert_eq!(tree.node(email).reference(), None);
    assert_eq!(tree.attribute_value(email, "codeList"), Some(json!("")));
}

#[test]
fn links_regions() {
    let (tree, hierarchy) = make_linked();
    let media = hierarchy.get("media").unwrap();
    let languages = make_languages("EN", "BG");

    let general = tree.child(media, ModelType::Region, "generalDetails").unwrap();
    assert_eq!(tree.description(general, &languages), "Base details");
    assert_eq!(ids(&tree, tree.region_fields(media, "generalDetails")), vec!["title"]);

    let specific = tree.child(media, ModelType::Region, "specificDetails").unwrap();
    assert_eq!(
        tree.description_by_language(specific, &lang("BG")).as_deref(),
        Some("Специфични детайли")
    );
    assert_eq!(ids(&tree, tree.region_fields(media, "specificDetails")), vec!["emailAddress"]);
}

#[test]
fn links_semantic_properties() {
    let payload: MetaDataPayload = serde_json::from_value(json!({
        "properties": [{
            "id": "label", "type": "label", "defaultValue": "",
            "uri": "http://www.w3.org/2000/01/rdf-schema#label"
        }]
    }))
    .unwrap();
    let meta = MetaDataBuilder::build(payload).unwrap();
    let property = serde_json::from_value(json!({
        "id": "emf:title",
        "attributes": [{
            "name": "http://www.w3.org/2000/01/rdf-schema#label",
            "type": "label",
            "value": { "en": "Title", "bg": "Наименование" }
        }]
    }))
    .unwrap();
    let mut tree = ModelTree::new();

    let node = ModelLinker::new(&meta).link_property(&mut tree, &property).unwrap();

    assert_eq!(tree.get_property("emf:title"), Some(node));
    assert!(!tree.has_model("emf:title"));
    assert_eq!(tree.description(node, &make_languages("BG", "EN")), "Наименование");
}
