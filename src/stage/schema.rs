//! Stage schemas: declared, ordered, typed parameters and their binding.
//!
//! Binding follows a fixed order:
//!
//! ```text
//! positionals (schema order) → named → type check → defaults → required check
//! ```

use std::fmt;

use crate::args::{ArgList, Value};
use crate::stage::StageError;

/// Declared type of a stage parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Integer,
    Text,
    Bytes,
    Boolean,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamType::Integer => "integer",
            ParamType::Text => "text",
            ParamType::Bytes => "bytes",
            ParamType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Default of a parameter, or the marker that it must be supplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    Required,
    Null,
    Int(i64),
    Text(&'static str),
    Bool(bool),
}

impl ParamDefault {
    fn to_value(self) -> Option<Value> {
        match self {
            ParamDefault::Required => None,
            ParamDefault::Null => Some(Value::Null),
            ParamDefault::Int(i) => Some(Value::Int(i)),
            ParamDefault::Text(s) => Some(Value::Str(s.to_string())),
            ParamDefault::Bool(b) => Some(Value::Bool(b)),
        }
    }
}

impl fmt::Display for ParamDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamDefault::Required => f.write_str("required"),
            ParamDefault::Null => f.write_str("none"),
            ParamDefault::Int(i) => write!(f, "{}", i),
            ParamDefault::Text(s) => write!(f, "\"{}\"", s),
            ParamDefault::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// A single parameter descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Parameter name, unique within the schema.
    pub name: &'static str,
    /// Declared type.
    pub ty: ParamType,
    /// Default value or `Required`.
    pub default: ParamDefault,
    /// Whether `none` is an accepted value.
    pub nullable: bool,
    /// Human-readable description (for help text).
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            default: ParamDefault::Required,
            nullable: false,
            description,
        }
    }

    /// An optional parameter. A `Null` default makes it nullable.
    pub const fn optional(
        name: &'static str,
        ty: ParamType,
        default: ParamDefault,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            ty,
            default,
            nullable: matches!(default, ParamDefault::Null),
            description,
        }
    }

    /// Also accept `none`, e.g. a timeout that can be disabled.
    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self.default, ParamDefault::Required)
    }

    /// Check a supplied value against the declared type.
    fn accept(&self, stage: &str, value: Value) -> Result<Value, StageError> {
        let mismatch = |actual: &'static str| StageError::ArgumentType {
            stage: stage.to_string(),
            param: self.name.to_string(),
            expected: self.ty,
            actual,
        };

        match (self.ty, value) {
            (_, Value::Null) if self.nullable => Ok(Value::Null),
            (ParamType::Integer, v @ Value::Int(_)) => Ok(v),
            (ParamType::Text, v @ Value::Str(_)) => Ok(v),
            (ParamType::Boolean, v @ Value::Bool(_)) => Ok(v),
            (ParamType::Bytes, v @ Value::Bytes(_)) => Ok(v),
            (ParamType::Bytes, Value::Str(s)) => Ok(Value::Bytes(s.into_bytes())),
            (ParamType::Bytes, Value::List(items)) => items
                .iter()
                .map(|item| match item {
                    Value::Int(i) => u8::try_from(*i).map_err(|_| mismatch("list")),
                    _ => Err(mismatch("list")),
                })
                .collect::<Result<Vec<u8>, _>>()
                .map(Value::Bytes),
            (_, other) => Err(mismatch(other.type_name())),
        }
    }
}

/// Fully resolved parameter values of a stage instance, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    stage: &'static str,
    values: Vec<(&'static str, Value)>,
}

impl Params {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Iterate `(name, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.values.iter().map(|(n, v)| (*n, v))
    }

    pub fn text(&self, name: &'static str) -> Result<String, StageError> {
        match self.get(name) {
            Some(Value::Str(s)) => Ok(s.clone()),
            other => Err(self.mismatch(name, ParamType::Text, other)),
        }
    }

    pub fn opt_text(&self, name: &'static str) -> Result<Option<String>, StageError> {
        match self.get(name) {
            Some(Value::Null) => Ok(None),
            _ => self.text(name).map(Some),
        }
    }

    pub fn int(&self, name: &'static str) -> Result<i64, StageError> {
        match self.get(name) {
            Some(Value::Int(i)) => Ok(*i),
            other => Err(self.mismatch(name, ParamType::Integer, other)),
        }
    }

    pub fn opt_int(&self, name: &'static str) -> Result<Option<i64>, StageError> {
        match self.get(name) {
            Some(Value::Null) => Ok(None),
            _ => self.int(name).map(Some),
        }
    }

    /// A non-negative integer, e.g. seconds.
    pub fn unsigned(&self, name: &'static str) -> Result<u64, StageError> {
        let value = self.int(name)?;
        u64::try_from(value).map_err(|_| self.mismatch(name, ParamType::Integer, Some(&Value::Int(value))))
    }

    pub fn opt_unsigned(&self, name: &'static str) -> Result<Option<u64>, StageError> {
        match self.get(name) {
            Some(Value::Null) => Ok(None),
            _ => self.unsigned(name).map(Some),
        }
    }

    pub fn boolean(&self, name: &'static str) -> Result<bool, StageError> {
        match self.get(name) {
            Some(Value::Bool(b)) => Ok(*b),
            other => Err(self.mismatch(name, ParamType::Boolean, other)),
        }
    }

    fn mismatch(&self, name: &str, expected: ParamType, found: Option<&Value>) -> StageError {
        let actual = match found {
            Some(Value::Int(i)) if *i < 0 => "negative int",
            Some(v) => v.type_name(),
            None => "nothing",
        };
        StageError::ArgumentType {
            stage: self.stage.to_string(),
            param: name.to_string(),
            expected,
            actual,
        }
    }
}

/// Bind parsed arguments against a schema.
pub fn bind(stage: &'static str, schema: &'static [ParamSpec], args: ArgList) -> Result<Params, StageError> {
    if args.positional.len() > schema.len() {
        return Err(StageError::TooManyArguments {
            stage: stage.to_string(),
            max: schema.len(),
            given: args.positional.len(),
        });
    }

    let mut slots: Vec<Option<Value>> = vec![None; schema.len()];
    for (slot, value) in slots.iter_mut().zip(args.positional) {
        *slot = Some(value);
    }

    for (name, value) in args.named {
        // Underscore names are pipeline-computed annotations, never arguments.
        if name.starts_with('_') {
            continue;
        }
        let index = schema
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| StageError::UnexpectedArgument {
                stage: stage.to_string(),
                name: name.clone(),
            })?;
        if slots[index].is_some() {
            return Err(StageError::DuplicateArgument {
                stage: stage.to_string(),
                name,
            });
        }
        slots[index] = Some(value);
    }

    let mut values = Vec::with_capacity(schema.len());
    let mut missing = Vec::new();
    for (spec, slot) in schema.iter().zip(slots) {
        match slot {
            Some(value) => values.push((spec.name, spec.accept(stage, value)?)),
            None => match spec.default.to_value() {
                Some(value) => values.push((spec.name, value)),
                None => missing.push(spec.name.to_string()),
            },
        }
    }

    if !missing.is_empty() {
        return Err(StageError::MissingArguments {
            stage: stage.to_string(),
            names: missing,
        });
    }

    Ok(Params { stage, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::parse;

    const SCHEMA: &[ParamSpec] = &[
        ParamSpec::required("url", ParamType::Text, "target"),
        ParamSpec::optional("retries", ParamType::Integer, ParamDefault::Int(3), "attempts"),
        ParamSpec::optional("token", ParamType::Text, ParamDefault::Null, "auth"),
        ParamSpec::optional("payload", ParamType::Bytes, ParamDefault::Null, "body"),
    ];

    #[test]
    fn positional_then_named_then_defaults() {
        let params = bind("Probe", SCHEMA, parse("http://x token=abc").unwrap()).unwrap();
        assert_eq!(params.text("url").unwrap(), "http://x");
        assert_eq!(params.int("retries").unwrap(), 3);
        assert_eq!(params.opt_text("token").unwrap(), Some("abc".to_string()));
        assert_eq!(params.get("payload"), Some(&Value::Null));
    }

    #[test]
    fn bytes_accepts_int_lists() {
        let params = bind("Probe", SCHEMA, parse("u payload=[104, 105]").unwrap()).unwrap();
        assert_eq!(params.get("payload"), Some(&Value::Bytes(b"hi".to_vec())));
    }

    #[test]
    fn null_rejected_for_non_nullable() {
        let err = bind("Probe", SCHEMA, parse("u retries=none").unwrap()).unwrap_err();
        assert!(matches!(err, StageError::ArgumentType { ref param, .. } if param == "retries"));
    }

    #[test]
    fn underscore_names_are_ignored() {
        let params = bind("Probe", SCHEMA, parse(r#"{"url": "u", "_delay": 9}"#).unwrap()).unwrap();
        assert_eq!(params.iter().count(), SCHEMA.len());
    }
}
