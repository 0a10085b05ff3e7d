//! # Variable Resolution
//!
//! File: cli/src/blueprint/variables.rs
//!
//! ## Overview
//!
//! Turns a raw configuration payload (name → JSON value, possibly partial)
//! into `ResolvedVariables`: one typed `VariableValue` per variable that has
//! a value. This is the only place raw, untyped values are inspected.
//!
//! For each declared variable, in order:
//! 1. a supplied value is type-checked, then membership-checked for choices
//!    and pattern-checked for strings;
//! 2. otherwise the declared default is used;
//! 3. otherwise a required variable yields `MissingRequiredField`;
//! 4. otherwise the variable stays unset.
//!
//! Every violation is collected; resolution never stops at the first one.
//!
use crate::blueprint::schema::{BlueprintSchema, VariableKind, VariableSpec};
use crate::core::error::{ValidationError, ValidationErrorKind};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::debug;

/// The raw configuration payload of a generation request.
pub type RawConfig = BTreeMap<String, serde_json::Value>;

/// A resolved, typed variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValue {
    String(String),
    Bool(bool),
    Choice(String),
    Number(f64),
}

impl VariableValue {
    /// Truthiness used by bare-variable conditions.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::String(s) | Self::Choice(s) => !s.is_empty(),
            Self::Number(n) => *n != 0.0,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Choice(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        matches!(self, Self::String(s) | Self::Choice(s) if s.trim().is_empty())
    }
}

impl Serialize for VariableValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) | Self::Choice(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
            // Whole numbers render as `8080`, not `8080.0`.
            Self::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Number(n) => serializer.serialize_f64(*n),
        }
    }
}

/// The final variable set for one generation request. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedVariables(BTreeMap<String, VariableValue>);

impl ResolvedVariables {
    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VariableValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, VariableValue)> for ResolvedVariables {
    fn from_iter<I: IntoIterator<Item = (String, VariableValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Reads a raw value as `kind`. `None` means the value has the wrong type.
///
/// Booleans and numbers are also accepted in string form so `KEY=VALUE`
/// pairs from the command line resolve the same way as JSON payloads.
pub fn coerce(kind: VariableKind, raw: &serde_json::Value) -> Option<VariableValue> {
    use serde_json::Value;
    match (kind, raw) {
        (VariableKind::String, Value::String(s)) => Some(VariableValue::String(s.clone())),
        (VariableKind::Choice, Value::String(s)) => Some(VariableValue::Choice(s.clone())),
        (VariableKind::Bool, Value::Bool(b)) => Some(VariableValue::Bool(*b)),
        (VariableKind::Bool, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(VariableValue::Bool(true)),
            "false" => Some(VariableValue::Bool(false)),
            _ => None,
        },
        (VariableKind::Number, Value::Number(n)) => n.as_f64().map(VariableValue::Number),
        (VariableKind::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(VariableValue::Number),
        _ => None,
    }
}

/// Checks an already-typed value against the variable's choices and pattern.
pub(crate) fn check_constraints(
    spec: &VariableSpec,
    value: &VariableValue,
) -> Option<ValidationErrorKind> {
    if spec.kind == VariableKind::Choice {
        let chosen = value.as_str().unwrap_or_default();
        if !spec.choices.iter().any(|c| c == chosen) {
            return Some(ValidationErrorKind::InvalidChoice {
                allowed: spec.choices.clone(),
            });
        }
    }
    if let (Some(pattern), VariableValue::String(s)) = (&spec.pattern, value) {
        if !pattern.is_match(s) {
            return Some(ValidationErrorKind::PatternMismatch {
                pattern: pattern.as_str().to_string(),
            });
        }
    }
    None
}

/// Resolves `payload` against the schema's variable declarations.
pub fn resolve(
    schema: &BlueprintSchema,
    payload: &RawConfig,
) -> Result<ResolvedVariables, Vec<ValidationError>> {
    let mut resolved = BTreeMap::new();
    let mut errors = Vec::new();

    for spec in &schema.variables {
        let supplied = payload.get(&spec.name).filter(|v| !v.is_null());
        match supplied {
            Some(raw) => match coerce(spec.kind, raw) {
                None => errors.push(ValidationError::new(
                    &spec.name,
                    ValidationErrorKind::TypeMismatch {
                        expected: spec.kind.to_string(),
                    },
                )),
                Some(value) if spec.required && value.is_empty() => {
                    errors.push(ValidationError::new(
                        &spec.name,
                        ValidationErrorKind::MissingRequiredField,
                    ))
                }
                Some(value) => match check_constraints(spec, &value) {
                    Some(kind) => errors.push(ValidationError::new(&spec.name, kind)),
                    None => {
                        resolved.insert(spec.name.clone(), value);
                    }
                },
            },
            None => match &spec.default {
                Some(default) => {
                    resolved.insert(spec.name.clone(), default.clone());
                }
                None if spec.required => errors.push(ValidationError::new(
                    &spec.name,
                    ValidationErrorKind::MissingRequiredField,
                )),
                None => {}
            },
        }
    }

    for key in payload.keys() {
        if schema.variable(key).is_none() {
            debug!(blueprint = %schema.id, "Ignoring undeclared configuration key '{}'", key);
        }
    }

    if errors.is_empty() {
        Ok(ResolvedVariables(resolved))
    } else {
        Err(errors)
    }
}
