use cortex_core::{NodeType, Outline, PathError};

#[test]
fn ensure_path_creates_heading_chain() {
    let mut outline = Outline::new();
    let tokyo = outline.ensure_path("#/Cities/Tokyo").unwrap();

    assert_eq!(outline.len(), 2);
    let tokyo_node = outline.node(tokyo).unwrap();
    assert_eq!(tokyo_node.kind, NodeType::Heading);
    assert_eq!(tokyo_node.title.as_deref(), Some("Tokyo"));
    assert_eq!(tokyo_node.level, 2);

    let cities = outline.node(tokyo_node.parent_id.unwrap()).unwrap();
    assert_eq!(cities.title.as_deref(), Some("Cities"));
    assert_eq!(cities.level, 1);
    assert_eq!(outline.children(None), &[cities.id]);
}

#[test]
fn ensure_path_is_idempotent_across_case_variants() {
    let mut outline = Outline::new();
    let first = outline.ensure_path("#/Cities/Tokyo").unwrap();
    let second = outline.ensure_path("#/Cities/Tokyo").unwrap();
    let third = outline.ensure_path("#cities/TOKYO").unwrap();
    let fourth = outline.ensure_path("cities/tokyo").unwrap();

    assert_eq!(first, second);
    assert_eq!(first, third);
    assert_eq!(first, fourth);
    assert_eq!(outline.len(), 2, "no duplicate headings were created");
}

#[test]
fn ensure_path_extends_existing_prefix_only() {
    let mut outline = Outline::new();
    let tokyo = outline.ensure_path("#/Cities/Tokyo").unwrap();
    let osaka = outline.ensure_path("#/Cities/Osaka").unwrap();

    assert_ne!(tokyo, osaka);
    assert_eq!(outline.len(), 3);
    assert_eq!(
        outline.node(tokyo).unwrap().parent_id,
        outline.node(osaka).unwrap().parent_id
    );
}

#[test]
fn build_path_reproduces_ensured_path_slugwise() {
    let mut outline = Outline::new();
    let id = outline.ensure_path("#/Coffee Shops/Blue Bottle").unwrap();
    assert_eq!(outline.build_path(id), "#/coffee-shops/blue-bottle");

    let rendered = outline.build_path(id);
    let resolved = outline.ensure_path(&rendered).unwrap();
    assert_eq!(resolved, id);
}

#[test]
fn build_path_skips_titleless_nodes() {
    let mut outline = Outline::new();
    let tokyo = outline.ensure_path("#/Cities/Tokyo").unwrap();
    let para = outline
        .add_node(Some(tokyo), NodeType::Paragraph, None, Some("notes".to_string()))
        .unwrap();

    assert_eq!(outline.build_path(para), "#/cities/tokyo");
}

#[test]
fn ensure_path_rejects_empty_input() {
    let mut outline = Outline::new();
    assert!(matches!(outline.ensure_path("#/"), Err(PathError::EmptyPath)));
    assert!(matches!(outline.ensure_path("   "), Err(PathError::EmptyPath)));
    assert!(outline.is_empty());
}
