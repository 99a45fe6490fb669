//! Action processor over a linked chain P <- D <- G, where P owns field F.

use modelstack_actions::{ActionError, ActionProcessor, ModelAction};
use modelstack_model::{
    AttributePayload, MetaDataBuilder, MetaDataPayload, ModelError, ModelLinker, ModelOperation, ModelPayload,
    ModelRef, ModelTree, ModelType, PathSegment,
};
use modelstack_types::{AttributeId, NodeId};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

// ── Helpers ─────────────────────────────────────────────────────

struct Fixture {
    tree: ModelTree,
    p: NodeId,
    d: NodeId,
    g: NodeId,
}

fn make_meta() -> Value {
    json!({
        "definitions": [{ "id": "label", "type": "label" }],
        "fields": [
            { "id": "displayType", "type": "displayType", "defaultValue": "HIDDEN" },
            { "id": "uri", "type": "uri", "updateable": false },
            {
                "id": "mandatory", "type": "boolean", "defaultValue": false,
                "validationModel": {
                    "rules": [{
                        "values": [true],
                        "expressions": [{ "field": "displayType", "operation": "in", "values": ["HIDDEN", "SYSTEM"] }],
                        "errorLabel": "validation.hidden.mandatory"
                    }]
                }
            }
        ]
    })
}

fn make_fixture() -> Fixture {
    make_fixture_with(make_meta())
}

fn make_fixture_with(meta: Value) -> Fixture {
    let meta: MetaDataPayload = serde_json::from_value(meta).unwrap();
    let meta = MetaDataBuilder::build(meta).unwrap();
    let linker = ModelLinker::new(&meta);

    let mut tree = ModelTree::new();
    let p = tree.create_node("P", ModelType::Definition, None).unwrap();
    let d = tree.create_node("D", ModelType::Definition, Some(p)).unwrap();
    let g = tree.create_node("G", ModelType::Definition, Some(d)).unwrap();

    let mut field = ModelPayload::new("F");
    field.attributes = vec![
        AttributePayload::new("displayType", "", json!("EDITABLE")),
        AttributePayload::new("uri", "", json!("emf:title")),
    ];
    let mut parent = ModelPayload::new("P");
    parent
        .attributes
        .push(AttributePayload::new("label", "", json!({ "en": "Parent" })));
    parent.fields.push(field);

    linker.link_model(&mut tree, p, &parent).unwrap();
    linker.link_model(&mut tree, d, &ModelPayload::new("D")).unwrap();
    linker.link_model(&mut tree, g, &ModelPayload::new("G")).unwrap();
    Fixture { tree, p, d, g }
}

fn field_of(tree: &ModelTree, node: NodeId) -> NodeId {
    tree.child(node, ModelType::Field, "F").unwrap()
}

fn attribute_of(tree: &ModelTree, node: NodeId, name: &str) -> AttributeId {
    tree.attribute_of(field_of(tree, node), name).unwrap()
}

fn change(attribute: AttributeId, context: NodeId, value: Value) -> ModelAction {
    ModelAction::ChangeAttribute {
        attribute,
        context,
        value,
    }
}

// ── Change ──────────────────────────────────────────────────────

#[test]
fn editing_inherited_attribute_creates_override() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let inherited = attribute_of(&f.tree, f.d, "displayType");

    let executed = processor
        .execute(&mut f.tree, change(inherited, f.d, json!("READ_ONLY")))
        .unwrap();

    let copy = executed.result_attribute().unwrap();
    assert_ne!(copy, inherited);
    assert!(executed.is_structural());
    assert_eq!(f.tree.attribute(copy).current_value(), json!("READ_ONLY"));
    assert_eq!(f.tree.attribute(copy).reference(), Some(inherited));
    assert_eq!(f.tree.attribute(inherited).current_value(), json!("EDITABLE"));
    assert!(f.tree.is_dirty(f.d));
    assert!(!f.tree.is_dirty(f.p));
    assert_eq!(executed.previous_value, Some(json!("EDITABLE")));
}

#[test]
fn editing_owned_attribute_is_in_place() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let own = attribute_of(&f.tree, f.p, "displayType");

    let executed = processor
        .execute(&mut f.tree, change(own, f.p, json!("SYSTEM")))
        .unwrap();

    assert_eq!(executed.result, ModelRef::Attribute(own));
    assert!(!executed.is_structural());
    assert_eq!(f.tree.attribute(own).current_value(), json!("SYSTEM"));
    assert!(f.tree.is_dirty(f.p));
}

#[test]
fn second_edit_reuses_override() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let inherited = attribute_of(&f.tree, f.d, "displayType");

    let first = processor
        .execute(&mut f.tree, change(inherited, f.d, json!("READ_ONLY")))
        .unwrap();
    // the stale handle still resolves to the override through its path
    let second = processor
        .execute(&mut f.tree, change(inherited, f.d, json!("SYSTEM")))
        .unwrap();

    assert_eq!(first.result, second.result);
    assert!(second.replaced.is_empty());
    assert_eq!(second.previous_value, Some(json!("READ_ONLY")));
}

#[test]
fn grandchild_follows_override() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let inherited = attribute_of(&f.tree, f.d, "displayType");

    let executed = processor
        .execute(&mut f.tree, change(inherited, f.d, json!("READ_ONLY")))
        .unwrap();

    assert_eq!(attribute_of(&f.tree, f.g, "displayType"), executed.result_attribute().unwrap());
    assert!(!f.tree.is_dirty(f.g));
}

#[test]
fn failed_override_leaves_tree_unchanged() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let uri = attribute_of(&f.tree, f.d, "uri");
    let p_field = field_of(&f.tree, f.p);

    let err = processor
        .execute(&mut f.tree, change(uri, f.d, json!("emf:name")))
        .unwrap_err();

    assert!(matches!(err, ActionError::Model(ModelError::NotUpdateable { .. })));
    assert_eq!(field_of(&f.tree, f.d), p_field);
    assert_eq!(field_of(&f.tree, f.g), p_field);
    assert!(f.tree.dirty_models().is_empty());
}

#[test]
fn change_revalidates_holder() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let mandatory = attribute_of(&f.tree, f.p, "mandatory");
    let display_type = attribute_of(&f.tree, f.p, "displayType");

    processor
        .execute(&mut f.tree, change(mandatory, f.p, json!(true)))
        .unwrap();
    assert!(f.tree.attribute(mandatory).validation().is_valid());

    processor
        .execute(&mut f.tree, change(display_type, f.p, json!("HIDDEN")))
        .unwrap();
    assert!(!f.tree.attribute(mandatory).validation().is_valid());
    assert!(!f.tree.is_valid(f.p));
}

#[test]
fn override_revalidates_inherited_siblings_in_context() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let mandatory = attribute_of(&f.tree, f.p, "mandatory");
    processor
        .execute(&mut f.tree, change(mandatory, f.p, json!(true)))
        .unwrap();
    assert!(f.tree.is_valid(f.p));

    let inherited = attribute_of(&f.tree, f.d, "displayType");
    let executed = processor
        .execute(&mut f.tree, change(inherited, f.d, json!("HIDDEN")))
        .unwrap();

    // D's field override still shares P's mandatory attribute
    assert_eq!(attribute_of(&f.tree, f.d, "mandatory"), mandatory);
    assert!(!f.tree.validation(f.d, mandatory).is_valid());
    assert!(!f.tree.is_valid(f.d));
    assert!(f.tree.attribute(mandatory).validation().is_valid());
    assert!(f.tree.is_valid(f.p));

    processor.revert(&mut f.tree, &executed).unwrap();
    assert!(f.tree.is_valid(f.d));
    assert!(f.tree.is_valid(f.p));
}

#[test]
fn unevaluable_rule_does_not_fail_the_edit() {
    let mut meta = make_meta();
    meta["fields"][0]["validationModel"] = json!({
        "rules": [{
            "expressions": [{ "field": "displayType", "operation": "not_match", "values": ["(unclosed"] }]
        }]
    });
    let mut f = make_fixture_with(meta);
    let processor = ActionProcessor::new();
    let own = attribute_of(&f.tree, f.p, "displayType");

    let executed = processor
        .execute(&mut f.tree, change(own, f.p, json!("SYSTEM")))
        .unwrap();

    assert_eq!(f.tree.attribute(own).current_value(), json!("SYSTEM"));
    assert!(f.tree.is_dirty(f.p));

    processor.revert(&mut f.tree, &executed).unwrap();
    assert_eq!(f.tree.attribute(own).current_value(), json!("EDITABLE"));
    assert!(!f.tree.is_dirty(f.p));
}

#[test]
fn rejects_nested_context_and_unknown_handles() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let field = field_of(&f.tree, f.p);
    let own = attribute_of(&f.tree, f.p, "displayType");

    let err = processor
        .execute(&mut f.tree, change(own, field, json!("SYSTEM")))
        .unwrap_err();
    assert!(matches!(err, ActionError::InvalidContext(_)));

    let err = processor
        .execute(&mut f.tree, change(AttributeId::from_index(10_000), f.p, json!(1)))
        .unwrap_err();
    assert!(matches!(err, ActionError::UnknownHandle(_)));
}

#[test]
fn sealed_model_rejects_in_place_edit() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    f.tree.seal_model(f.p);
    let own = attribute_of(&f.tree, f.p, "displayType");

    let err = processor
        .execute(&mut f.tree, change(own, f.p, json!("SYSTEM")))
        .unwrap_err();
    assert!(matches!(err, ActionError::Model(ModelError::Sealed(_))));

    // inheritors still override it
    let executed = processor
        .execute(&mut f.tree, change(own, f.d, json!("SYSTEM")))
        .unwrap();
    assert_ne!(executed.result_attribute(), Some(own));
}

// ── Restore ─────────────────────────────────────────────────────

#[test]
fn restoring_own_value_keeps_attribute() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let own = attribute_of(&f.tree, f.p, "displayType");
    processor
        .execute(&mut f.tree, change(own, f.p, json!("SYSTEM")))
        .unwrap();

    let executed = processor
        .execute(
            &mut f.tree,
            ModelAction::RestoreAttribute {
                attribute: own,
                context: f.p,
                inherited: false,
            },
        )
        .unwrap();

    assert_eq!(executed.result, ModelRef::Attribute(own));
    assert_eq!(f.tree.attribute(own).current_value(), json!("EDITABLE"));
    assert!(!f.tree.is_dirty(f.p));
}

#[test]
fn restoring_override_returns_inherited_attribute() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let inherited = attribute_of(&f.tree, f.d, "displayType");
    let copy = processor
        .execute(&mut f.tree, change(inherited, f.d, json!("READ_ONLY")))
        .unwrap()
        .result_attribute()
        .unwrap();

    let executed = processor
        .execute(
            &mut f.tree,
            ModelAction::RestoreAttribute {
                attribute: copy,
                context: f.d,
                inherited: true,
            },
        )
        .unwrap();

    let restored = executed.result_attribute().unwrap();
    assert_eq!(restored, inherited);
    assert_ne!(f.tree.attribute(restored).parent(), f.tree.attribute(copy).parent());
    assert_eq!(attribute_of(&f.tree, f.d, "displayType"), inherited);
    assert_eq!(executed.previous_value, Some(json!("READ_ONLY")));
    assert!(!f.tree.is_dirty(f.d));
}

#[test]
fn restoring_inherited_value_in_place_is_refused() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let inherited = attribute_of(&f.tree, f.d, "displayType");

    let err = processor
        .execute(
            &mut f.tree,
            ModelAction::RestoreAttribute {
                attribute: inherited,
                context: f.d,
                inherited: false,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ActionError::NotOwned { .. }));

    let err = processor
        .execute(
            &mut f.tree,
            ModelAction::RestoreAttribute {
                attribute: inherited,
                context: f.d,
                inherited: true,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ActionError::Model(ModelError::NotOverridden(_))));
}

#[test]
fn restoring_inherited_node_drops_override() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let inherited = attribute_of(&f.tree, f.d, "displayType");
    processor
        .execute(&mut f.tree, change(inherited, f.d, json!("READ_ONLY")))
        .unwrap();
    let d_field = field_of(&f.tree, f.d);
    let p_field = field_of(&f.tree, f.p);

    let executed = processor
        .execute(
            &mut f.tree,
            ModelAction::RestoreInheritedNode {
                node: d_field,
                context: f.d,
            },
        )
        .unwrap();

    assert_eq!(executed.result, ModelRef::Node(p_field));
    assert_eq!(field_of(&f.tree, f.d), p_field);
    assert_eq!(field_of(&f.tree, f.g), p_field);
    assert!(f.tree.dirty_models().is_empty());
}

// ── Revert ──────────────────────────────────────────────────────

#[test]
fn revert_detaches_created_override() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let inherited = attribute_of(&f.tree, f.d, "displayType");
    let p_field = field_of(&f.tree, f.p);
    let executed = processor
        .execute(&mut f.tree, change(inherited, f.d, json!("READ_ONLY")))
        .unwrap();

    processor.revert(&mut f.tree, &executed).unwrap();

    assert_eq!(field_of(&f.tree, f.d), p_field);
    assert_eq!(field_of(&f.tree, f.g), p_field);
    assert!(f.tree.dirty_models().is_empty());
}

#[test]
fn revert_restores_previous_value() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let own = attribute_of(&f.tree, f.p, "displayType");
    processor
        .execute(&mut f.tree, change(own, f.p, json!("SYSTEM")))
        .unwrap();
    let second = processor
        .execute(&mut f.tree, change(own, f.p, json!("READ_ONLY")))
        .unwrap();

    processor.revert(&mut f.tree, &second).unwrap();

    assert_eq!(f.tree.attribute(own).current_value(), json!("SYSTEM"));
    assert!(f.tree.attribute(own).is_dirty());
}

#[test]
fn revert_clears_added_languages() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let label = f.tree.attribute_of(f.p, "label").unwrap();
    processor
        .execute(&mut f.tree, change(label, f.p, json!({ "en": "Parent model" })))
        .unwrap();
    let executed = processor
        .execute(&mut f.tree, change(label, f.p, json!({ "bg": "Родител" })))
        .unwrap();

    processor.revert(&mut f.tree, &executed).unwrap();

    assert_eq!(
        f.tree.attribute(label).current_value(),
        json!({ "EN": "Parent model", "BG": null })
    );
}

#[test]
fn revert_of_restore_puts_override_back() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let inherited = attribute_of(&f.tree, f.d, "displayType");
    let copy = processor
        .execute(&mut f.tree, change(inherited, f.d, json!("READ_ONLY")))
        .unwrap()
        .result_attribute()
        .unwrap();
    let restore = processor
        .execute(
            &mut f.tree,
            ModelAction::RestoreAttribute {
                attribute: copy,
                context: f.d,
                inherited: true,
            },
        )
        .unwrap();

    processor.revert(&mut f.tree, &restore).unwrap();

    assert_eq!(attribute_of(&f.tree, f.d, "displayType"), copy);
    assert_eq!(attribute_of(&f.tree, f.g, "displayType"), copy);
    assert!(f.tree.is_dirty(f.d));
}

// ── Change-sets ─────────────────────────────────────────────────

#[test]
fn changeset_of_override_edit() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let inherited = attribute_of(&f.tree, f.d, "displayType");
    let executed = processor
        .execute(&mut f.tree, change(inherited, f.d, json!("READ_ONLY")))
        .unwrap();

    let change_set = processor.changeset(&f.tree, &executed).unwrap();

    assert_eq!(
        change_set.path.segments(),
        &[
            PathSegment::new("D", ModelType::Definition),
            PathSegment::new("F", ModelType::Field),
            PathSegment::new("displayType", ModelType::Attribute),
        ]
    );
    assert_eq!(change_set.operation, ModelOperation::Update);
    assert_eq!(change_set.old_value, json!("EDITABLE"));
    assert_eq!(change_set.new_value, json!("READ_ONLY"));
}

#[test]
fn changeset_of_restores() {
    let mut f = make_fixture();
    let processor = ActionProcessor::new();
    let inherited = attribute_of(&f.tree, f.d, "displayType");
    let copy = processor
        .execute(&mut f.tree, change(inherited, f.d, json!("READ_ONLY")))
        .unwrap()
        .result_attribute()
        .unwrap();
    let d_field = field_of(&f.tree, f.d);

    let restore = processor
        .execute(
            &mut f.tree,
            ModelAction::RestoreAttribute {
                attribute: copy,
                context: f.d,
                inherited: true,
            },
        )
        .unwrap();
    let change_set = processor.changeset(&f.tree, &restore).unwrap();
    assert_eq!(change_set.operation, ModelOperation::Restore);
    assert_eq!(change_set.old_value, json!("READ_ONLY"));
    assert_eq!(change_set.new_value, json!("EDITABLE"));

    let node_restore = processor
        .execute(
            &mut f.tree,
            ModelAction::RestoreInheritedNode {
                node: d_field,
                context: f.d,
            },
        )
        .unwrap();
    let change_set = processor.changeset(&f.tree, &node_restore).unwrap();
    assert_eq!(change_set.path.to_string(), "definition=D/field=F");
    assert_eq!(change_set.operation, ModelOperation::Restore);
}

#[test]
fn actions_serialize_with_tag() {
    let action = change(AttributeId::from_index(4), NodeId::from_index(2), json!("READ_ONLY"));
    assert_eq!(
        serde_json::to_value(&action).unwrap(),
        json!({ "action": "change_attribute", "attribute": 4, "context": 2, "value": "READ_ONLY" })
    );
}
