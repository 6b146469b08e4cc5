use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lightweight typed operator tree used by no-code functions.
///
/// `Ref` reads another element's current value through the resolver the
/// caller supplies; an unresolvable reference makes the whole expression
/// yield `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    LiteralBool { value: bool },
    LiteralString { value: String },
    LiteralNumber { value: f64 },
    Ref { element: String },
    Eq { left: Box<Expr>, right: Box<Expr> },
    And { expressions: Vec<Expr> },
    Or { expressions: Vec<Expr> },
    Not { expression: Box<Expr> },
    Concat { expressions: Vec<Expr> },
    Sum { expressions: Vec<Expr> },
    When {
        cases: Vec<WhenCase>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<Box<Expr>>,
    },
}

/// One branch of a [`Expr::When`] expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WhenCase {
    pub when: Expr,
    pub then: Expr,
}

impl Expr {
    /// Evaluates the expression against the resolver, if possible.
    pub fn evaluate<F>(&self, resolve: &F) -> Option<Value>
    where
        F: Fn(&str) -> Option<Value>,
    {
        match self {
            Expr::LiteralBool { value } => Some(Value::Bool(*value)),
            Expr::LiteralString { value } => Some(Value::String(value.clone())),
            Expr::LiteralNumber { value } => {
                serde_json::Number::from_f64(*value).map(Value::Number)
            }
            Expr::Ref { element } => resolve(element),
            Expr::Eq { left, right } => {
                let left_val = left.evaluate(resolve)?;
                let right_val = right.evaluate(resolve)?;
                Some(Value::Bool(left_val == right_val))
            }
            Expr::And { expressions } => {
                for expr in expressions {
                    match expr.truthiness(resolve) {
                        Some(true) => continue,
                        Some(false) => return Some(Value::Bool(false)),
                        None => return None,
                    }
                }
                Some(Value::Bool(true))
            }
            Expr::Or { expressions } => {
                for expr in expressions {
                    if let Some(true) = expr.truthiness(resolve) {
                        return Some(Value::Bool(true));
                    }
                }
                Some(Value::Bool(false))
            }
            Expr::Not { expression } => expression
                .truthiness(resolve)
                .map(|value| Value::Bool(!value)),
            Expr::Concat { expressions } => {
                let mut text = String::new();
                for expr in expressions {
                    text.push_str(&value_to_text(&expr.evaluate(resolve)?));
                }
                Some(Value::String(text))
            }
            Expr::Sum { expressions } => {
                let mut total = 0.0;
                for expr in expressions {
                    total += expr.evaluate(resolve)?.as_f64()?;
                }
                serde_json::Number::from_f64(total).map(Value::Number)
            }
            Expr::When { cases, otherwise } => {
                for case in cases {
                    match case.when.truthiness(resolve) {
                        Some(true) => return case.then.evaluate(resolve),
                        Some(false) => continue,
                        None => return None,
                    }
                }
                otherwise.as_ref().and_then(|expr| expr.evaluate(resolve))
            }
        }
    }

    /// Boolean view of the expression, used by the visibility and validation aspects.
    pub fn truthiness<F>(&self, resolve: &F) -> Option<bool>
    where
        F: Fn(&str) -> Option<Value>,
    {
        self.evaluate(resolve).as_ref().and_then(Value::as_bool)
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(num) => num.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver(id: &str) -> Option<Value> {
        match id {
            "first" => Some(json!("Ada")),
            "last" => Some(json!("Lovelace")),
            "a" => Some(json!(2.0)),
            "b" => Some(json!(3.5)),
            "flag" => Some(json!(true)),
            _ => None,
        }
    }

    #[test]
    fn concat_joins_resolved_values() {
        let expr = Expr::Concat {
            expressions: vec![
                Expr::Ref { element: "first".into() },
                Expr::LiteralString { value: " ".into() },
                Expr::Ref { element: "last".into() },
            ],
        };
        assert_eq!(expr.evaluate(&resolver), Some(json!("Ada Lovelace")));
    }

    #[test]
    fn sum_adds_numbers() {
        let expr = Expr::Sum {
            expressions: vec![
                Expr::Ref { element: "a".into() },
                Expr::Ref { element: "b".into() },
            ],
        };
        assert_eq!(expr.evaluate(&resolver), Some(json!(5.5)));
    }

    #[test]
    fn unresolvable_reference_yields_none() {
        let expr = Expr::Concat {
            expressions: vec![Expr::Ref { element: "missing".into() }],
        };
        assert_eq!(expr.evaluate(&resolver), None);
    }

    #[test]
    fn when_picks_first_matching_case() {
        let expr = Expr::When {
            cases: vec![WhenCase {
                when: Expr::Ref { element: "flag".into() },
                then: Expr::LiteralString { value: "on".into() },
            }],
            otherwise: Some(Box::new(Expr::LiteralString { value: "off".into() })),
        };
        assert_eq!(expr.evaluate(&resolver), Some(json!("on")));
    }

    #[test]
    fn truthiness_requires_a_boolean_result() {
        let expr = Expr::LiteralString { value: "yes".into() };
        assert_eq!(expr.truthiness(&resolver), None);
    }
}
