use cortex_core::{NodeType, Outline, PropKind, PropValue, StoreError};
use uuid::Uuid;

fn node(outline: &mut Outline) -> Uuid {
    outline
        .add_node(None, NodeType::Todo, Some("Task".to_string()), None)
        .unwrap()
}

#[test]
fn upsert_overwrites_on_same_key_and_keeps_one_record() {
    let mut outline = Outline::new();
    let id = node(&mut outline);

    let first = outline
        .upsert_property(id, "rating", PropValue::Number(5.0))
        .unwrap();
    let second = outline
        .upsert_property(id, "rating", PropValue::Number(7.0))
        .unwrap();

    assert_eq!(first, second, "upsert keeps the original property id");
    let all = outline.node_properties(id);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].value, PropValue::Number(7.0));
    assert_eq!(all[0].kind(), PropKind::Number);
}

#[test]
fn upsert_can_change_the_stored_kind() {
    let mut outline = Outline::new();
    let id = node(&mut outline);

    outline
        .upsert_property(id, "visited", PropValue::String("yes".to_string()))
        .unwrap();
    outline
        .upsert_property(id, "visited", PropValue::Boolean(true))
        .unwrap();

    assert_eq!(
        outline.prop_value(id, "visited"),
        Some(&PropValue::Boolean(true))
    );
}

#[test]
fn labels_normalize_to_keys_and_lookups_normalize_too() {
    let mut outline = Outline::new();
    let id = node(&mut outline);

    outline
        .upsert_property(id, "Visit Count", PropValue::Number(3.0))
        .unwrap();

    let stored = outline.get_property(id, "visit-count").unwrap();
    assert_eq!(stored.key, "visit-count");
    assert_eq!(stored.label, "Visit Count");
    assert!(outline.get_property(id, "Visit   Count").is_some());
}

#[test]
fn remove_property_is_silent_for_missing_keys() {
    let mut outline = Outline::new();
    let id = node(&mut outline);

    outline
        .upsert_property(id, "rating", PropValue::Number(1.0))
        .unwrap();
    outline.remove_property(id, "rating").unwrap();
    outline.remove_property(id, "rating").unwrap();
    assert!(outline.get_property(id, "rating").is_none());
}

#[test]
fn property_writes_against_missing_nodes_fail() {
    let mut outline = Outline::new();
    let missing = Uuid::new_v4();

    let err = outline
        .upsert_property(missing, "rating", PropValue::Number(1.0))
        .unwrap_err();
    assert!(matches!(err, StoreError::NodeNotFound(id) if id == missing));

    let err = outline.remove_property(missing, "rating").unwrap_err();
    assert!(matches!(err, StoreError::NodeNotFound(_)));
}

#[test]
fn blank_labels_are_rejected() {
    let mut outline = Outline::new();
    let id = node(&mut outline);

    let err = outline
        .upsert_property(id, "   ", PropValue::Boolean(true))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidData(_)));
}

#[test]
fn node_properties_list_in_key_order() {
    let mut outline = Outline::new();
    let id = node(&mut outline);

    outline
        .upsert_property(id, "zeta", PropValue::Number(1.0))
        .unwrap();
    outline
        .upsert_property(id, "alpha", PropValue::Number(2.0))
        .unwrap();

    let keys: Vec<&str> = outline
        .node_properties(id)
        .into_iter()
        .map(|property| property.key.as_str())
        .collect();
    assert_eq!(keys, vec!["alpha", "zeta"]);
}
