//! Literal evaluator: one argument token → typed `Value`.

use std::collections::BTreeMap;

use crate::args::{ArgsError, Value};

/// Evaluate a single top-level token.
///
/// Quoted strings, byte strings, lists, tuples and dicts must parse
/// completely. Numbers and the `true`/`false`/`none` keywords are typed.
/// Everything else is taken verbatim as a bare string, which keeps paths,
/// hosts and `user@host` forms usable without quoting.
pub(crate) fn eval(token: &str) -> Result<Value, ArgsError> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(Value::Str(String::new()));
    }
    if let Some(value) = keyword(token) {
        return Ok(value);
    }
    if looks_numeric(token) {
        return Ok(number(token).unwrap_or_else(|| Value::Str(token.to_string())));
    }
    if starts_structured(token) {
        let mut parser = LiteralParser::new(token);
        let value = parser.value()?;
        parser.skip_ws();
        if !parser.is_done() {
            return Err(ArgsError::Syntax {
                message: format!("unexpected trailing text in literal '{}'", token),
            });
        }
        return Ok(value);
    }
    Ok(Value::Str(token.to_string()))
}

fn keyword(word: &str) -> Option<Value> {
    match word.to_ascii_lowercase().as_str() {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        "none" | "null" => Some(Value::Null),
        _ => None,
    }
}

fn starts_structured(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some('"' | '\'' | '[' | '(' | '{') => true,
        Some('b' | 'B') => matches!(chars.next(), Some('"' | '\'')),
        _ => false,
    }
}

fn looks_numeric(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('+' | '-' | '.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

fn number(token: &str) -> Option<Value> {
    if let Ok(i) = token.parse::<i64>() {
        return Some(Value::Int(i));
    }
    let (negative, unsigned) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        let magnitude = i64::from_str_radix(hex, 16).ok()?;
        return Some(Value::Int(if negative { -magnitude } else { magnitude }));
    }
    let float_chars = token
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if float_chars {
        return token.parse::<f64>().ok().map(Value::Float);
    }
    None
}

/// Recursive-descent parser for a single literal.
struct LiteralParser {
    chars: Vec<char>,
    pos: usize,
}

impl LiteralParser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn is_done(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> ArgsError {
        ArgsError::Syntax {
            message: format!("{} at offset {}", message.into(), self.pos),
        }
    }

    fn value(&mut self) -> Result<Value, ArgsError> {
        self.skip_ws();
        match self.peek() {
            Some('"' | '\'') => {
                let units = self.quoted()?;
                units_to_string(&units).map(Value::Str)
            }
            Some('b' | 'B') if matches!(self.peek_at(1), Some('"' | '\'')) => {
                self.pos += 1;
                let units = self.quoted()?;
                units
                    .into_iter()
                    .map(|u| u8::try_from(u).map_err(|_| self.error("non-byte character in bytes literal")))
                    .collect::<Result<Vec<u8>, _>>()
                    .map(Value::Bytes)
            }
            Some('[') => self.sequence(']').map(Value::List),
            Some('(') => self.sequence(')').map(Value::List),
            Some('{') => self.dict(),
            Some(_) => self.word(),
            None => Err(self.error("expected a value")),
        }
    }

    /// Parse a quoted string body into code units; `\xHH` yields a raw unit.
    fn quoted(&mut self) -> Result<Vec<u32>, ArgsError> {
        let quote = self.bump().ok_or_else(|| self.error("expected a string"))?;
        let mut units = Vec::new();
        loop {
            let c = self.bump().ok_or_else(|| self.error("unterminated string"))?;
            if c == quote {
                return Ok(units);
            }
            if c != '\\' {
                units.push(c as u32);
                continue;
            }
            let escaped = self.bump().ok_or_else(|| self.error("unterminated string"))?;
            match escaped {
                'n' => units.push('\n' as u32),
                't' => units.push('\t' as u32),
                'r' => units.push('\r' as u32),
                '0' => units.push(0),
                '\\' | '\'' | '"' => units.push(escaped as u32),
                'x' => units.push(self.hex_escape(2)?),
                'u' => units.push(self.hex_escape(4)?),
                other => {
                    units.push('\\' as u32);
                    units.push(other as u32);
                }
            }
        }
    }

    fn hex_escape(&mut self, digits: usize) -> Result<u32, ArgsError> {
        let mut hex = String::with_capacity(digits);
        for _ in 0..digits {
            hex.push(self.bump().ok_or_else(|| self.error("truncated escape"))?);
        }
        u32::from_str_radix(&hex, 16).map_err(|_| self.error(format!("invalid escape '{}'", hex)))
    }

    fn sequence(&mut self, close: char) -> Result<Vec<Value>, ArgsError> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(items);
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(c) if c == close => {}
                _ => return Err(self.error(format!("expected ',' or '{}'", close))),
            }
        }
    }

    fn dict(&mut self) -> Result<Value, ArgsError> {
        self.bump();
        let mut map = BTreeMap::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Map(map));
            }
            let key = match self.value()? {
                Value::Str(s) => s,
                Value::Int(i) => i.to_string(),
                other => return Err(self.error(format!("unsupported dict key type {}", other.type_name()))),
            };
            self.skip_ws();
            if self.bump() != Some(':') {
                return Err(self.error("expected ':'"));
            }
            let value = self.value()?;
            map.insert(key, value);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    /// A bare word inside a structure: keyword, number or identifier.
    fn word(&mut self) -> Result<Value, ArgsError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, ',' | ':' | ']' | ')' | '}') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected a value"));
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        if let Some(value) = keyword(&word) {
            return Ok(value);
        }
        if looks_numeric(&word) {
            return number(&word).ok_or_else(|| self.error(format!("invalid number '{}'", word)));
        }
        Ok(Value::Str(word))
    }
}

fn units_to_string(units: &[u32]) -> Result<String, ArgsError> {
    units
        .iter()
        .map(|&u| {
            char::from_u32(u).ok_or_else(|| ArgsError::Syntax {
                message: format!("invalid character code {:#x}", u),
            })
        })
        .collect()
}
