use cortex_core::{
    NodePatch, NodeType, Outline, PropValue, QueryError, QueryRequest, QueryRows, SliceDraft,
    SliceScope, SliceSort, SortDir, EMPTY_GROUP_KEY,
};
use uuid::Uuid;

/// Outline used across query tests:
///
/// ```text
/// #/cities
/// #/cities/tokyo          heading, tag "travel"
/// #/cities/tokyo/ramen    todo, rating 5, visited true
/// #/cities/osaka          heading
/// #/inbox
/// #/inbox/call-mom        todo, status done
/// #/inbox/pay-rent        todo, visited false, rating 2
/// ```
fn fixture() -> (Outline, Uuid) {
    let mut outline = Outline::new();
    let cities = outline.ensure_path("#/Cities").unwrap();
    let tokyo = outline.ensure_path("#/Cities/Tokyo").unwrap();
    outline
        .update_node(
            tokyo,
            NodePatch {
                tags: Some(vec!["travel".to_string()]),
                ..NodePatch::default()
            },
        )
        .unwrap();
    let ramen = outline
        .add_node(Some(tokyo), NodeType::Todo, Some("Ramen".to_string()), None)
        .unwrap();
    outline
        .upsert_property(ramen, "rating", PropValue::Number(5.0))
        .unwrap();
    outline
        .upsert_property(ramen, "visited", PropValue::Boolean(true))
        .unwrap();
    outline.ensure_path("#/Cities/Osaka").unwrap();

    let inbox = outline.ensure_path("#/Inbox").unwrap();
    let call = outline
        .add_node(Some(inbox), NodeType::Todo, Some("Call mom".to_string()), None)
        .unwrap();
    outline
        .upsert_property(call, "status", PropValue::String("done".to_string()))
        .unwrap();
    let rent = outline
        .add_node(Some(inbox), NodeType::Todo, Some("Pay rent".to_string()), None)
        .unwrap();
    outline
        .upsert_property(rent, "visited", PropValue::Boolean(false))
        .unwrap();
    outline
        .upsert_property(rent, "rating", PropValue::Number(2.0))
        .unwrap();

    (outline, cities)
}

fn flat(rows: QueryRows) -> Vec<String> {
    match rows {
        QueryRows::Flat(rows) => rows
            .into_iter()
            .map(|row| row.node.title.unwrap_or_default())
            .collect(),
        QueryRows::Grouped(_) => panic!("expected flat rows"),
    }
}

#[test]
fn type_condition_selects_exactly_matching_nodes() {
    let (outline, _) = fixture();
    let rows = outline
        .apply_query(&QueryRequest::global("type:todo"))
        .unwrap();
    let titles = flat(rows);
    assert_eq!(titles.len(), 3);
    assert!(titles.contains(&"Ramen".to_string()));
    assert!(titles.contains(&"Call mom".to_string()));
    assert!(titles.contains(&"Pay rent".to_string()));
}

#[test]
fn tag_condition_is_case_sensitive_membership() {
    let (outline, _) = fixture();
    assert_eq!(
        flat(outline.apply_query(&QueryRequest::global("tag:travel")).unwrap()),
        vec!["Tokyo".to_string()]
    );
    assert!(outline
        .apply_query(&QueryRequest::global("tag:Travel"))
        .unwrap()
        .is_empty());
}

#[test]
fn prop_equality_excludes_nodes_lacking_the_property() {
    let (outline, _) = fixture();
    let titles = flat(
        outline
            .apply_query(&QueryRequest::global("prop.visited=false"))
            .unwrap(),
    );
    assert_eq!(titles, vec!["Pay rent".to_string()]);
}

#[test]
fn prop_comparison_parses_value_per_stored_kind() {
    let (outline, _) = fixture();
    assert_eq!(
        flat(outline.apply_query(&QueryRequest::global("prop.rating>=4")).unwrap()),
        vec!["Ramen".to_string()]
    );
    assert_eq!(
        flat(outline.apply_query(&QueryRequest::global("prop.rating<3")).unwrap()),
        vec!["Pay rent".to_string()]
    );
}

#[test]
fn kind_mismatched_comparison_is_no_match_not_an_error() {
    let (outline, _) = fixture();
    // visited is boolean; a numeric target can never satisfy it.
    assert!(outline
        .apply_query(&QueryRequest::global("prop.visited=3"))
        .unwrap()
        .is_empty());
    assert!(outline
        .apply_query(&QueryRequest::global("prop.rating=banana"))
        .unwrap()
        .is_empty());
}

#[test]
fn path_wildcard_is_true_ancestor_containment() {
    let (outline, _) = fixture();
    let titles = flat(
        outline
            .apply_query(&QueryRequest::global("path:/Cities/*"))
            .unwrap(),
    );
    // Strictly below #/cities: tokyo, its child, and osaka - not cities itself.
    assert_eq!(titles.len(), 3);
    assert!(titles.contains(&"Tokyo".to_string()));
    assert!(titles.contains(&"Ramen".to_string()));
    assert!(titles.contains(&"Osaka".to_string()));
    assert!(!titles.contains(&"Cities".to_string()));
}

#[test]
fn path_without_wildcard_matches_exact_suffix() {
    let (outline, _) = fixture();
    assert_eq!(
        flat(outline
            .apply_query(&QueryRequest::global("path:/Cities/Tokyo"))
            .unwrap()),
        vec!["Tokyo".to_string()]
    );
    // Suffix form: a single trailing segment matches the deepest node.
    assert_eq!(
        flat(outline.apply_query(&QueryRequest::global("path:Ramen")).unwrap()),
        vec!["Ramen".to_string()]
    );
}

#[test]
fn status_sugar_reads_the_reserved_property() {
    let (outline, _) = fixture();
    assert_eq!(
        flat(outline.apply_query(&QueryRequest::global("status:done")).unwrap()),
        vec!["Call mom".to_string()]
    );
    // status!= still requires the property to be present.
    assert!(outline
        .apply_query(&QueryRequest::global("status!=done"))
        .unwrap()
        .is_empty());
}

#[test]
fn and_joined_conditions_intersect() {
    let (outline, _) = fixture();
    assert_eq!(
        flat(outline
            .apply_query(&QueryRequest::global("type:todo AND prop.rating>=4"))
            .unwrap()),
        vec!["Ramen".to_string()]
    );
}

#[test]
fn unknown_condition_is_always_false() {
    let (outline, _) = fixture();
    assert!(outline
        .apply_query(&QueryRequest::global("frobnicate:now"))
        .unwrap()
        .is_empty());
}

#[test]
fn malformed_prop_condition_surfaces_the_fragment() {
    let (outline, _) = fixture();
    let err = outline
        .apply_query(&QueryRequest::global("prop.rating"))
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::MalformedCondition { fragment } if fragment == "prop.rating"
    ));
}

#[test]
fn subtree_scope_covers_proper_descendants_only() {
    let (outline, cities) = fixture();
    let rows = outline
        .apply_query(&QueryRequest {
            dsl: String::new(),
            scope: SliceScope::Subtree { root: cities },
            sort: None,
            group_by: None,
        })
        .unwrap();
    let titles = flat(rows);
    assert_eq!(titles, vec!["Tokyo", "Ramen", "Osaka"]);
}

#[test]
fn subtree_scope_with_missing_root_yields_no_rows() {
    let (outline, _) = fixture();
    let rows = outline
        .apply_query(&QueryRequest {
            dsl: String::new(),
            scope: SliceScope::Subtree { root: Uuid::new_v4() },
            sort: None,
            group_by: None,
        })
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn numeric_sort_orders_numbers_and_puts_missing_lowest() {
    let (outline, _) = fixture();
    let rows = outline
        .apply_query(&QueryRequest {
            dsl: "type:todo".to_string(),
            scope: SliceScope::Global,
            sort: Some(SliceSort {
                by: "prop.rating".to_string(),
                dir: SortDir::Asc,
            }),
            group_by: None,
        })
        .unwrap();
    // Call mom has no rating and sorts lowest.
    assert_eq!(flat(rows), vec!["Call mom", "Pay rent", "Ramen"]);
}

#[test]
fn descending_sort_reverses_and_missing_goes_last() {
    let (outline, _) = fixture();
    let rows = outline
        .apply_query(&QueryRequest {
            dsl: "type:todo".to_string(),
            scope: SliceScope::Global,
            sort: Some(SliceSort {
                by: "prop.rating".to_string(),
                dir: SortDir::Desc,
            }),
            group_by: None,
        })
        .unwrap();
    assert_eq!(flat(rows), vec!["Ramen", "Pay rent", "Call mom"]);
}

#[test]
fn title_sort_is_case_insensitive() {
    let mut outline = Outline::new();
    outline
        .add_node(None, NodeType::Heading, Some("banana".to_string()), None)
        .unwrap();
    outline
        .add_node(None, NodeType::Heading, Some("Apple".to_string()), None)
        .unwrap();
    let rows = outline
        .apply_query(&QueryRequest {
            dsl: String::new(),
            scope: SliceScope::Global,
            sort: Some(SliceSort {
                by: "title".to_string(),
                dir: SortDir::Asc,
            }),
            group_by: None,
        })
        .unwrap();
    assert_eq!(flat(rows), vec!["Apple", "banana"]);
}

#[test]
fn grouping_uses_first_encountered_order_and_empty_sentinel() {
    let (outline, _) = fixture();
    let rows = outline
        .apply_query(&QueryRequest {
            dsl: "type:todo".to_string(),
            scope: SliceScope::Global,
            sort: Some(SliceSort {
                by: "title".to_string(),
                dir: SortDir::Asc,
            }),
            group_by: Some("status".to_string()),
        })
        .unwrap();

    let QueryRows::Grouped(groups) = rows else {
        panic!("expected grouped rows");
    };
    // Sorted titles: Call mom (done), Pay rent (no status), Ramen (no status).
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].key, "done");
    assert_eq!(groups[1].key, EMPTY_GROUP_KEY);
    assert_eq!(groups[1].rows.len(), 2);
}

#[test]
fn saved_slices_run_through_the_same_pipeline() {
    let (mut outline, cities) = fixture();
    let slice_id = outline.save_slice(SliceDraft {
        name: "city todos".to_string(),
        scope: SliceScope::Subtree { root: cities },
        dsl: "type:todo".to_string(),
        columns: vec!["title".to_string(), "prop.rating".to_string()],
        ..SliceDraft::default()
    });

    let slice = outline.slice(slice_id).unwrap().clone();
    let rows = outline.run_slice(&slice).unwrap();
    let QueryRows::Flat(rows) = rows else {
        panic!("expected flat rows");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].node.title.as_deref(), Some("Ramen"));
    assert_eq!(rows[0].column_string("prop.rating").as_deref(), Some("5"));
    assert_eq!(rows[0].path, "#/cities/tokyo/ramen");
}
