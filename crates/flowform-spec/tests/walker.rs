use flowform_spec::{Element, ElementType, FlattenOptions, find, flatten, flatten_with_parents};

fn make_tree() -> Vec<Element> {
    vec![
        Element::new("step1", ElementType::Step).with_children(vec![
            Element::new("group", ElementType::Group).with_children(vec![
                Element::new("name", ElementType::Text),
                Element::new("tags", ElementType::MultiCheckbox),
            ]),
            Element::new("people", ElementType::Replicating).with_children(vec![
                Element::new("first", ElementType::Text),
                Element::new("last", ElementType::Text),
            ]),
        ]),
        Element::new("step2", ElementType::Step)
            .with_children(vec![Element::new("summary", ElementType::Content)]),
    ]
}

#[test]
fn flatten_visits_every_descendant_exactly_once_in_pre_order() {
    let tree = make_tree();
    let ids: Vec<&str> = flatten(&tree, FlattenOptions::default())
        .iter()
        .map(|element| element.id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec![
            "step1", "group", "name", "tags", "people", "first", "last", "step2", "summary"
        ]
    );
}

#[test]
fn skip_mode_keeps_the_container_but_not_its_template() {
    let tree = make_tree();
    let ids: Vec<&str> = flatten(
        &tree,
        FlattenOptions {
            skip_replicating_children: true,
        },
    )
    .iter()
    .map(|element| element.id.as_str())
    .collect();
    assert!(ids.contains(&"people"));
    assert!(!ids.contains(&"first"));
    assert!(!ids.contains(&"last"));
}

#[test]
fn parents_run_from_the_root_down() {
    let tree = make_tree();
    let flattened = flatten_with_parents(&tree);
    let entry = flattened
        .iter()
        .find(|entry| entry.element.id == "name")
        .expect("name is in the tree");
    let parent_ids: Vec<&str> = entry
        .parents
        .iter()
        .map(|parent| parent.id.as_str())
        .collect();
    assert_eq!(parent_ids, vec!["step1", "group"]);

    let root = flattened
        .iter()
        .find(|entry| entry.element.id == "step1")
        .expect("step1 is in the tree");
    assert!(root.parents.is_empty());
}

#[test]
fn find_reaches_nested_elements() {
    let tree = make_tree();
    assert_eq!(find(&tree, "last").map(|e| e.kind), Some(ElementType::Text));
    assert!(find(&tree, "unknown").is_none());
}
