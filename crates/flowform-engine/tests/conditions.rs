use serde_json::{Value, json};

use flowform_engine::{check_condition_set, evaluate_condition_set};
use flowform_spec::{Condition, ConditionOperator, ConditionSet, ElementType};

fn resolver(reference: &str) -> Option<(ElementType, Option<Value>)> {
    match reference {
        "birthday" => Some((ElementType::Date, Some(json!("15.03.2024")))),
        "amount" => Some((ElementType::Number, Some(json!(1234.56)))),
        "plain" => Some((ElementType::Number, Some(json!(3.5)))),
        "note" => Some((ElementType::Text, Some(json!("hello world")))),
        "tags" => Some((ElementType::MultiCheckbox, Some(json!(["a", "b"])))),
        "agreed" => Some((ElementType::Checkbox, Some(json!(true)))),
        "color" => Some((ElementType::Select, Some(json!("green")))),
        "start" => Some((ElementType::Time, Some(json!("14:30")))),
        "rows" => Some((ElementType::Replicating, Some(json!(["r1-", "r2-"])))),
        "blank" => Some((ElementType::Text, None)),
        _ => None,
    }
}

fn single(condition: Condition) -> ConditionSet {
    ConditionSet::all().with_condition(condition)
}

#[test]
fn empty_sets_are_satisfied() {
    assert!(evaluate_condition_set(&ConditionSet::any(), &resolver));
    assert!(evaluate_condition_set(&ConditionSet::all(), &resolver));
}

#[test]
fn date_equality_follows_the_literal_precision() {
    for literal in ["2024", "03.2024", "15.", "15.03.", "15.03.2024"] {
        let set = single(Condition::new("birthday", ConditionOperator::Equals, literal));
        assert!(evaluate_condition_set(&set, &resolver), "literal {literal}");
    }
    let set = single(Condition::new(
        "birthday",
        ConditionOperator::Equals,
        "16.03.2024",
    ));
    assert!(!evaluate_condition_set(&set, &resolver));
}

#[test]
fn number_literals_accept_grouped_and_plain_forms() {
    let grouped = single(Condition::new("amount", ConditionOperator::Equals, "1.234,56"));
    assert!(evaluate_condition_set(&grouped, &resolver));

    let plain = single(Condition::new("plain", ConditionOperator::Equals, "3.5"));
    assert!(evaluate_condition_set(&plain, &resolver));

    let bound = single(Condition::new(
        "amount",
        ConditionOperator::LessThan,
        "2.000,00",
    ));
    assert!(evaluate_condition_set(&bound, &resolver));
}

#[test]
fn multi_checkbox_includes_requires_every_literal_member() {
    let subset = single(Condition::new("tags", ConditionOperator::Includes, r#"["a"]"#));
    assert!(evaluate_condition_set(&subset, &resolver));

    let missing = single(Condition::new("tags", ConditionOperator::Includes, r#"["c"]"#));
    assert!(!evaluate_condition_set(&missing, &resolver));
}

#[test]
fn checkbox_select_and_time_comparisons() {
    let checked = single(Condition::new("agreed", ConditionOperator::Equals, "Ja (True)"));
    assert!(evaluate_condition_set(&checked, &resolver));

    let color = single(Condition::new("color", ConditionOperator::Equals, "green"));
    assert!(evaluate_condition_set(&color, &resolver));

    let before = single(Condition::new("start", ConditionOperator::LessThan, "15:00"));
    assert!(evaluate_condition_set(&before, &resolver));
}

#[test]
fn replicating_length_operators_count_instances() {
    let exact = single(Condition::new(
        "rows",
        ConditionOperator::ReplicatingListLengthEquals,
        "2",
    ));
    assert!(evaluate_condition_set(&exact, &resolver));

    let more = single(Condition::new(
        "rows",
        ConditionOperator::ReplicatingListLengthGreaterThan,
        "2",
    ));
    assert!(!evaluate_condition_set(&more, &resolver));
}

#[test]
fn a_dangling_reference_makes_the_condition_false() {
    let set = single(Condition::new("nowhere", ConditionOperator::Empty, ""));
    assert!(!evaluate_condition_set(&set, &resolver));
}

#[test]
fn an_operator_undefined_for_the_type_fails_closed() {
    let set = single(Condition::new(
        "amount",
        ConditionOperator::MatchesPattern,
        ".*",
    ));
    assert!(!evaluate_condition_set(&set, &resolver));
}

#[test]
fn any_needs_one_satisfied_child() {
    let set = ConditionSet::any()
        .with_condition(Condition::new("color", ConditionOperator::Equals, "red"))
        .with_condition(Condition::new("color", ConditionOperator::Equals, "green"));
    assert!(evaluate_condition_set(&set, &resolver));
}

#[test]
fn aggregates_unmet_messages_in_document_order() {
    let set = ConditionSet::all()
        .with_condition(
            Condition::new("color", ConditionOperator::Equals, "red")
                .with_message("pick red first"),
        )
        .with_condition(
            Condition::new("agreed", ConditionOperator::Equals, "Nein (False)")
                .with_message("you must not agree"),
        )
        .with_set(
            ConditionSet::all()
                .with_condition(Condition::new("note", ConditionOperator::Empty, ""))
                .with_message("the note must stay empty"),
        );
    let outcome = check_condition_set(&set, &resolver);
    assert!(!outcome.satisfied);
    assert_eq!(
        outcome.unmet_messages,
        vec![
            "pick red first",
            "you must not agree",
            "the note must stay empty"
        ]
    );
    assert_eq!(outcome.first_message(), Some("pick red first"));
}

#[test]
fn a_nested_set_without_its_own_message_bubbles_the_inner_ones() {
    let set = ConditionSet::all().with_set(
        ConditionSet::all().with_condition(
            Condition::new("color", ConditionOperator::Equals, "red").with_message("wrong color"),
        ),
    );
    let outcome = check_condition_set(&set, &resolver);
    assert!(!outcome.satisfied);
    assert_eq!(outcome.unmet_messages, vec!["wrong color"]);
}

#[test]
fn a_satisfied_set_reports_no_messages() {
    let set = ConditionSet::any()
        .with_condition(
            Condition::new("color", ConditionOperator::Equals, "red").with_message("not red"),
        )
        .with_condition(Condition::new("color", ConditionOperator::Equals, "green"));
    let outcome = check_condition_set(&set, &resolver);
    assert!(outcome.satisfied);
    assert!(outcome.unmet_messages.is_empty());
}

#[test]
fn a_missing_current_value_is_empty_for_text() {
    let set = single(Condition::new("blank", ConditionOperator::Empty, ""));
    assert!(evaluate_condition_set(&set, &resolver));
}
