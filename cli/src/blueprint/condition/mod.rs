//! # Condition Evaluator
//!
//! File: cli/src/blueprint/condition/mod.rs
//!
//! ## Overview
//!
//! Conditions gate whether a file mapping or dependency entry is active for
//! a given set of resolved variables. They use a small boolean
//! grammar, independent of the template engine:
//!
//! - `UseDocker`: truthiness of a variable
//! - `Database == 'postgres'`, `Port != 8080`, `UseTls == true`: comparison
//!   of a variable with a literal
//! - `!X`, `not X`, `A && B`, `A and B`, `A || B`, `A or B`, parentheses
//!
//! ## Lifecycle
//!
//! 1. `Condition::parse` runs when the blueprint is loaded.
//! 2. `Condition::check` verifies, also at load time, that every referenced
//!    variable is declared and that literals match the variable's kind.
//! 3. `Condition::evaluate` is pure and total: any condition that survived
//!    loading evaluates to `true` or `false` for every variable set.
//!
//! An unset variable is falsy; `==` against it is `false` and `!=` is `true`.
//!
mod lexer;
mod parser;

use crate::blueprint::schema::{VariableKind, VariableSpec};
use crate::blueprint::variables::{ResolvedVariables, VariableValue};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("at offset {position}: {message}")]
pub struct ConditionError {
    pub position: usize,
    pub message: String,
}

impl ConditionError {
    pub(crate) fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "'{}'", s),
            Self::Number(n) => write!(f, "{}", n),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Truthy(String),
    Compare {
        variable: String,
        op: CompareOp,
        literal: Literal,
    },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn evaluate(&self, vars: &ResolvedVariables) -> bool {
        match self {
            Self::Truthy(name) => vars.get(name).is_some_and(VariableValue::is_truthy),
            Self::Compare {
                variable,
                op,
                literal,
            } => {
                let equal = vars
                    .get(variable)
                    .is_some_and(|value| literal_matches(value, literal));
                match op {
                    CompareOp::Eq => equal,
                    CompareOp::Ne => !equal,
                }
            }
            Self::Not(inner) => !inner.evaluate(vars),
            Self::And(left, right) => left.evaluate(vars) && right.evaluate(vars),
            Self::Or(left, right) => left.evaluate(vars) || right.evaluate(vars),
        }
    }

    fn collect_variables<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Self::Truthy(name) => {
                out.insert(name.as_str());
            }
            Self::Compare { variable, .. } => {
                out.insert(variable.as_str());
            }
            Self::Not(inner) => inner.collect_variables(out),
            Self::And(left, right) | Self::Or(left, right) => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
        }
    }

    fn check(&self, variables: &[VariableSpec]) -> Result<(), String> {
        match self {
            Self::Truthy(name) => lookup(variables, name).map(|_| ()),
            Self::Compare {
                variable, literal, ..
            } => {
                let spec = lookup(variables, variable)?;
                let compatible = matches!(
                    (spec.kind, literal),
                    (VariableKind::String | VariableKind::Choice, Literal::Str(_))
                        | (VariableKind::Bool, Literal::Bool(_))
                        | (VariableKind::Number, Literal::Number(_))
                );
                if !compatible {
                    return Err(format!(
                        "cannot compare {} variable '{}' with {}",
                        spec.kind, variable, literal
                    ));
                }
                if let (VariableKind::Choice, Literal::Str(value)) = (spec.kind, literal) {
                    if !spec.choices.iter().any(|c| c == value) {
                        return Err(format!(
                            "'{}' is not a declared choice of '{}'",
                            value, variable
                        ));
                    }
                }
                Ok(())
            }
            Self::Not(inner) => inner.check(variables),
            Self::And(left, right) | Self::Or(left, right) => {
                left.check(variables)?;
                right.check(variables)
            }
        }
    }
}

fn lookup<'a>(variables: &'a [VariableSpec], name: &str) -> Result<&'a VariableSpec, String> {
    variables
        .iter()
        .find(|v| v.name == name)
        .ok_or_else(|| format!("references undeclared variable '{}'", name))
}

fn literal_matches(value: &VariableValue, literal: &Literal) -> bool {
    match (value, literal) {
        (VariableValue::String(v) | VariableValue::Choice(v), Literal::Str(l)) => v == l,
        (VariableValue::Bool(v), Literal::Bool(l)) => v == l,
        (VariableValue::Number(v), Literal::Number(l)) => v == l,
        _ => false,
    }
}

/// A parsed condition together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    source: String,
    expr: Expr,
}

impl Condition {
    pub fn parse(source: &str) -> Result<Self, ConditionError> {
        let expr = parser::Parser::parse(source)?;
        Ok(Self {
            source: source.trim().to_string(),
            expr,
        })
    }

    /// Verifies references and literal types against the declared variables.
    pub fn check(&self, variables: &[VariableSpec]) -> Result<(), String> {
        self.expr.check(variables)
    }

    pub fn evaluate(&self, vars: &ResolvedVariables) -> bool {
        self.expr.evaluate(vars)
    }

    /// Names of every variable the condition reads.
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.expr.collect_variables(&mut out);
        out
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

/// An absent condition is always true.
pub fn is_active(condition: Option<&Condition>, vars: &ResolvedVariables) -> bool {
    condition.map_or(true, |c| c.evaluate(vars))
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, kind: VariableKind, choices: &[&str]) -> VariableSpec {
        VariableSpec {
            name: name.to_string(),
            kind,
            default: None,
            required: false,
            pattern: None,
            choices: choices.iter().map(|c| c.to_string()).collect(),
            description: None,
        }
    }

    fn declared() -> Vec<VariableSpec> {
        vec![
            spec("UseDocker", VariableKind::Bool, &[]),
            spec("Database", VariableKind::Choice, &["postgres", "sqlite", "none"]),
            spec("Port", VariableKind::Number, &[]),
            spec("Author", VariableKind::String, &[]),
        ]
    }

    fn vars(pairs: &[(&str, VariableValue)]) -> ResolvedVariables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_evaluates_against_resolved_variables() {
        let cond = Condition::parse("UseDocker && Database != 'none'").unwrap();
        cond.check(&declared()).unwrap();

        let on = vars(&[
            ("UseDocker", VariableValue::Bool(true)),
            ("Database", VariableValue::Choice("postgres".into())),
        ]);
        let off = vars(&[
            ("UseDocker", VariableValue::Bool(true)),
            ("Database", VariableValue::Choice("none".into())),
        ]);
        assert!(cond.evaluate(&on));
        assert!(!cond.evaluate(&off));
    }

    #[test]
    fn test_unset_variables() {
        let empty = ResolvedVariables::default();
        assert!(!Condition::parse("Author").unwrap().evaluate(&empty));
        assert!(!Condition::parse("Author == 'x'").unwrap().evaluate(&empty));
        assert!(Condition::parse("Author != 'x'").unwrap().evaluate(&empty));
        assert!(Condition::parse("not Author").unwrap().evaluate(&empty));
    }

    #[test]
    fn test_number_and_bool_literals() {
        let v = vars(&[
            ("Port", VariableValue::Number(8080.0)),
            ("UseDocker", VariableValue::Bool(false)),
        ]);
        assert!(Condition::parse("Port == 8080").unwrap().evaluate(&v));
        assert!(Condition::parse("UseDocker == false || Port != 80")
            .unwrap()
            .evaluate(&v));
    }

    #[test]
    fn test_check_rejects_undeclared_and_mistyped() {
        let declared = declared();
        let err = Condition::parse("UseKafka").unwrap().check(&declared).unwrap_err();
        assert!(err.contains("undeclared variable 'UseKafka'"));

        let err = Condition::parse("UseDocker == 'yes'")
            .unwrap()
            .check(&declared)
            .unwrap_err();
        assert!(err.contains("cannot compare bool"));

        let err = Condition::parse("Database == 'mysql'")
            .unwrap()
            .check(&declared)
            .unwrap_err();
        assert!(err.contains("not a declared choice"));
    }

    #[test]
    fn test_absent_condition_is_always_true() {
        assert!(is_active(None, &ResolvedVariables::default()));
    }

    #[test]
    fn test_variables_and_display() {
        let cond = Condition::parse("  (B || A) && !A ").unwrap();
        assert_eq!(cond.variables().into_iter().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(cond.to_string(), "(B || A) && !A");
        assert_eq!(serde_json::to_string(&cond).unwrap(), "\"(B || A) && !A\"");
    }
}
