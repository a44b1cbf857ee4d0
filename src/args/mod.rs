//! Argument parser for stage construction.
//!
//! Turns the free-form text typed after a stage name into positional and
//! named values:
//!
//! ```text
//! {"host": "dc01", "delay": 4}          JSON object → named only
//! ("root", "10.0.0.5", identity=None)   call style
//! root 10.0.0.5 --identity ~/.ssh/id    CLI style
//! ```
//!
//! The three syntaxes are tried in that order. Call style and CLI style share
//! one tokenizer, so they may be mixed.

mod json;
mod literal;
mod tokenizer;
mod value;

pub use value::Value;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::args::literal::eval;
use crate::args::tokenizer::{split_key, strip_call_parens, tokenize};

/// Errors produced while parsing argument text.
#[derive(Debug, Error, PartialEq)]
pub enum ArgsError {
    #[error("Invalid arguments: {message}")]
    Syntax { message: String },

    #[error("Invalid arguments: {message}")]
    Unbalanced { message: String },

    #[error("Invalid keyword name '{key}'")]
    InvalidKey { key: String },

    #[error("Keyword argument '{key}' given more than once")]
    DuplicateKey { key: String },
}

/// Parsed arguments, ready to be bound against a stage schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgList {
    pub positional: Vec<Value>,
    pub named: BTreeMap<String, Value>,
}

impl ArgList {
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Build a named-only argument list (used when loading session records).
    pub fn from_named(named: BTreeMap<String, Value>) -> Self {
        Self {
            positional: Vec::new(),
            named,
        }
    }

    fn insert_named(&mut self, key: &str, value: Value) -> Result<(), ArgsError> {
        if !is_identifier(key) {
            return Err(ArgsError::InvalidKey { key: key.to_string() });
        }
        if self.named.contains_key(key) {
            return Err(ArgsError::DuplicateKey { key: key.to_string() });
        }
        self.named.insert(key.to_string(), value);
        Ok(())
    }
}

/// Parse argument text into positional and named values.
pub fn parse(text: &str) -> Result<ArgList, ArgsError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(ArgList::default());
    }

    if let Some(object) = json::object(text) {
        let mut named = BTreeMap::new();
        for (key, value) in object.entries {
            if named.contains_key(&key) {
                return Err(ArgsError::DuplicateKey { key });
            }
            named.insert(key, Value::from_json(value));
        }
        return Ok(ArgList::from_named(named));
    }

    let tokens = tokenize(strip_call_parens(text))?;
    let mut args = ArgList::default();
    let mut iter = tokens.iter().peekable();

    while let Some(token) = iter.next() {
        // --key=value / --key value / --flag
        if let Some(flag) = token.strip_prefix("--") {
            let (key, value) = match split_key(flag) {
                Some((key, raw)) => (key, eval(raw)?),
                None => match iter.peek() {
                    Some(next) if !next.starts_with("--") => {
                        let raw = iter.next().map(String::as_str).unwrap_or_default();
                        (flag, eval(raw)?)
                    }
                    Some(_) | None => (flag, Value::Bool(true)),
                },
            };
            args.insert_named(&key.replace('-', "_"), value)?;
            continue;
        }

        if token.starts_with('=') {
            return Err(ArgsError::Syntax {
                message: format!("unexpected '{}'", token),
            });
        }

        // key=value, or key= value
        if let Some((key, raw)) = split_key(token) {
            let value = if raw.is_empty() {
                match iter.next() {
                    Some(next) => eval(next)?,
                    None => {
                        return Err(ArgsError::Syntax {
                            message: format!("missing value for '{}'", key),
                        })
                    }
                }
            } else {
                eval(raw)?
            };
            args.insert_named(key, value)?;
            continue;
        }

        // key =value, or key = value
        if iter.peek().is_some_and(|next| next.starts_with('=')) {
            let assign = iter.next().map(String::as_str).unwrap_or_default();
            let raw = if assign == "=" {
                iter.next().map(String::as_str).ok_or_else(|| ArgsError::Syntax {
                    message: format!("missing value for '{}'", token),
                })?
            } else {
                &assign[1..]
            };
            args.insert_named(token, eval(raw)?)?;
            continue;
        }

        args.positional.push(eval(token)?);
    }

    Ok(args)
}

/// Letters, digits and underscores, not starting with a digit.
fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_rules() {
        assert!(is_identifier("identity"));
        assert!(is_identifier("_private2"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("with-dash"));
        assert!(!is_identifier(""));
    }
}
