use serde_json::{Value, json};

use flowform_engine::{
    CodeHost, CodeHostError, CodeResult, Diagnostic, FormState, NullCodeHost, derive_form_state,
};
use flowform_spec::{
    Condition, ConditionOperator, ConditionSet, Element, ElementPatch, ElementType, Expr,
    FunctionKind, OverrideFunction, PredicateFunction, ValueFunction,
};

fn visible_when_checked(reference: &str) -> PredicateFunction {
    PredicateFunction::conditions(ConditionSet::all().with_condition(Condition::new(
        reference,
        ConditionOperator::Equals,
        "Ja (True)",
    )))
    .with_references(vec![reference.to_string()])
}

fn concat(parts: Vec<Expr>) -> ValueFunction {
    ValueFunction::expression(Expr::Concat { expressions: parts })
}

fn reference(element: &str) -> Expr {
    Expr::Ref {
        element: element.into(),
    }
}

fn literal(text: &str) -> Expr {
    Expr::LiteralString { value: text.into() }
}

struct ScriptHost;

impl CodeHost for ScriptHost {
    fn invoke(
        &self,
        code: &str,
        _data: &Value,
        _element: &Element,
        _id: &str,
    ) -> Result<CodeResult, CodeHostError> {
        match code {
            "hide" => Ok(CodeResult::Bool(false)),
            "complain" => Ok(CodeResult::Text("rejected by script".into())),
            "boom" => Err(CodeHostError("script raised".into())),
            _ => Ok(CodeResult::Null),
        }
    }
}

#[test]
fn deriving_twice_with_the_same_input_is_idempotent() {
    let mut details = Element::new("details", ElementType::Text).required();
    details.visibility = Some(visible_when_checked("notify"));
    let mut greeting = Element::new("greeting", ElementType::Text);
    greeting.value = Some(concat(vec![literal("Hi "), reference("name")]));

    let tree = vec![Element::new("page", ElementType::Step).with_children(vec![
        Element::new("notify", ElementType::Checkbox),
        Element::new("name", ElementType::Text),
        details,
        greeting,
    ])];
    let input = json!({ "notify": true, "name": "Ada" });

    let first = derive_form_state(&tree, &input, &FormState::default(), &NullCodeHost);
    let second = derive_form_state(&tree, &input, &FormState::default(), &NullCodeHost);

    assert_eq!(first.state, second.state);
    assert!(first.diagnostics.is_empty());
    assert_eq!(first.state.values.get("greeting"), Some(&json!("Hi Ada")));
    assert_eq!(
        first.state.errors.get("details").map(String::as_str),
        Some("this field is required")
    );
}

#[test]
fn a_hidden_container_prunes_its_whole_subtree() {
    let mut group = Element::new("group", ElementType::Group).with_children(vec![
        Element::new("inner", ElementType::Text).required(),
    ]);
    group.visibility = Some(visible_when_checked("notify"));

    let tree = vec![Element::new("page", ElementType::Step).with_children(vec![
        Element::new("notify", ElementType::Checkbox),
        group,
    ])];
    let input = json!({ "notify": false });

    let derived = derive_form_state(&tree, &input, &FormState::default(), &NullCodeHost);
    assert_eq!(derived.state.visibilities.get("group"), Some(&false));
    assert_eq!(derived.state.visibilities.get("inner"), Some(&false));
    // the invisible required element produces no error
    assert!(derived.state.errors.is_empty());
}

#[test]
fn replicated_instances_use_instance_qualified_ids() {
    let tree = vec![Element::new("page", ElementType::Step).with_children(vec![
        Element::new("contacts", ElementType::Replicating).with_children(vec![
            Element::new("name", ElementType::Text).required(),
        ]),
    ])];
    let input = json!({ "contacts": ["c1-", "c2-"], "c1-name": "Ada" });

    let derived = derive_form_state(&tree, &input, &FormState::default(), &NullCodeHost);

    assert_eq!(derived.state.visibilities.get("c1-name"), Some(&true));
    assert_eq!(derived.state.visibilities.get("c2-name"), Some(&true));
    assert!(derived.state.errors.contains_key("c2-name"));
    assert!(!derived.state.errors.contains_key("c1-name"));
    // unqualified template ids never appear once instances exist
    assert!(!derived.state.visibilities.contains_key("name"));
    assert!(!derived.state.errors.contains_key("name"));
}

#[test]
fn conditions_inside_an_instance_resolve_against_the_instance_id_space() {
    let mut partner = Element::new("partner", ElementType::Text).required();
    partner.visibility = Some(visible_when_checked("married"));

    let tree = vec![Element::new("page", ElementType::Step).with_children(vec![
        Element::new("people", ElementType::Replicating).with_children(vec![
            Element::new("married", ElementType::Checkbox),
            partner,
        ]),
    ])];
    let input = json!({ "people": ["p1-", "p2-"], "p1-married": true, "p2-married": false });

    let derived = derive_form_state(&tree, &input, &FormState::default(), &NullCodeHost);
    assert_eq!(derived.state.visibilities.get("p1-partner"), Some(&true));
    assert_eq!(derived.state.visibilities.get("p2-partner"), Some(&false));
    assert!(derived.state.errors.contains_key("p1-partner"));
    assert!(!derived.state.errors.contains_key("p2-partner"));
}

#[test]
fn value_functions_chain_across_elements() {
    let mut full = Element::new("full", ElementType::Text);
    full.value = Some(concat(vec![reference("first"), literal(" "), reference("last")]));
    let mut shout = Element::new("shout", ElementType::Text);
    shout.value = Some(concat(vec![reference("full"), literal("!")]));

    let tree = vec![Element::new("page", ElementType::Step).with_children(vec![
        Element::new("first", ElementType::Text),
        Element::new("last", ElementType::Text),
        full,
        shout,
    ])];
    let input = json!({ "first": "Ada", "last": "Lovelace" });

    let derived = derive_form_state(&tree, &input, &FormState::default(), &NullCodeHost);
    assert_eq!(derived.state.values.get("full"), Some(&json!("Ada Lovelace")));
    assert_eq!(
        derived.state.values.get("shout"),
        Some(&json!("Ada Lovelace!"))
    );
    assert!(derived.diagnostics.is_empty());
}

#[test]
fn a_reference_cycle_is_reported_and_keeps_prior_values() {
    let mut a = Element::new("a", ElementType::Text);
    a.value = Some(concat(vec![reference("b"), literal("x")]));
    let mut b = Element::new("b", ElementType::Text);
    b.value = Some(concat(vec![reference("a"), literal("y")]));

    let tree = vec![Element::new("page", ElementType::Step)
        .with_children(vec![a, b])];
    let input = json!({ "a": "seed", "b": "seed" });

    let mut prior = FormState::default();
    prior.values.insert("a".into(), json!("earlier"));

    let derived = derive_form_state(&tree, &input, &prior, &NullCodeHost);
    let cycle = derived
        .diagnostics
        .iter()
        .find_map(|diagnostic| match diagnostic {
            Diagnostic::ValueCycle { ids } => Some(ids.clone()),
            _ => None,
        })
        .expect("cycle reported");
    assert_eq!(cycle, vec!["a".to_string(), "b".to_string()]);
    // prior values survive; elements with no prior computed value get none
    assert_eq!(derived.state.values.get("a"), Some(&json!("earlier")));
    assert_eq!(derived.state.values.get("b"), None);
}

#[test]
fn an_override_patch_takes_effect_before_validation() {
    let mut extra = Element::new("extra", ElementType::Text);
    extra.override_fn = Some(
        OverrideFunction::conditions(
            ConditionSet::all().with_condition(Condition::new(
                "want",
                ConditionOperator::Equals,
                "Ja (True)",
            )),
            ElementPatch {
                required: Some(true),
                ..ElementPatch::default()
            },
        )
        .with_references(vec!["want".into()]),
    );

    let tree = vec![Element::new("page", ElementType::Step).with_children(vec![
        Element::new("want", ElementType::Checkbox),
        extra,
    ])];

    let off = derive_form_state(
        &tree,
        &json!({ "want": false }),
        &FormState::default(),
        &NullCodeHost,
    );
    assert!(off.state.overrides.is_empty());
    assert!(off.state.errors.is_empty());

    let on = derive_form_state(
        &tree,
        &json!({ "want": true }),
        &FormState::default(),
        &NullCodeHost,
    );
    assert_eq!(
        on.state.overrides.get("extra").and_then(|patch| patch.required),
        Some(true)
    );
    assert_eq!(
        on.state.errors.get("extra").map(String::as_str),
        Some("this field is required")
    );
}

#[test]
fn code_functions_run_through_the_host_port() {
    let mut secret = Element::new("secret", ElementType::Text).required();
    secret.visibility = Some(PredicateFunction::code("hide"));
    let mut iban = Element::new("iban", ElementType::Text);
    iban.validation = Some(PredicateFunction::code("complain"));

    let tree = vec![Element::new("page", ElementType::Step).with_children(vec![secret, iban])];
    let derived = derive_form_state(&tree, &json!({}), &FormState::default(), &ScriptHost);

    assert_eq!(derived.state.visibilities.get("secret"), Some(&false));
    assert!(!derived.state.errors.contains_key("secret"));
    assert_eq!(
        derived.state.errors.get("iban").map(String::as_str),
        Some("rejected by script")
    );
}

#[test]
fn a_failing_code_function_degrades_to_the_prior_verdict() {
    let mut flaky = Element::new("flaky", ElementType::Text);
    flaky.visibility = Some(PredicateFunction::code("boom"));

    let tree = vec![Element::new("page", ElementType::Step).with_children(vec![flaky])];

    let mut prior = FormState::default();
    prior.visibilities.insert("flaky".into(), false);

    let derived = derive_form_state(&tree, &json!({}), &prior, &ScriptHost);
    assert_eq!(derived.state.visibilities.get("flaky"), Some(&false));
    assert!(derived.diagnostics.iter().any(|diagnostic| matches!(
        diagnostic,
        Diagnostic::CodeFunction { id, kind: FunctionKind::Visibility, .. } if id == "flaky"
    )));
}

#[test]
fn merging_replaces_errors_but_extends_the_other_maps() {
    let mut state = FormState::default();
    state.visibilities.insert("a".into(), true);
    state.errors.insert("a".into(), "old".into());
    state.values.insert("a".into(), json!(1));

    let mut newer = FormState::default();
    newer.visibilities.insert("b".into(), false);
    newer.errors.insert("b".into(), "new".into());

    state.merge(newer);
    assert_eq!(state.visibilities.len(), 2);
    assert_eq!(state.values.get("a"), Some(&json!(1)));
    assert_eq!(state.errors.len(), 1);
    assert_eq!(state.errors.get("b").map(String::as_str), Some("new"));
}
