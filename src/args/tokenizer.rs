//! Argument tokenizer: raw text → top-level argument tokens.
//!
//! Tokens are separated by whitespace or commas that sit outside every
//! bracket and quoted string. Brackets must nest properly and strings must be
//! closed; anything else is rejected instead of being silently truncated.

use crate::args::ArgsError;

/// Tracks bracket and quote nesting while scanning text one char at a time.
#[derive(Debug, Default)]
pub(crate) struct Nesting {
    closers: Vec<char>,
    quote: Option<char>,
    escaped: bool,
}

impl Nesting {
    /// Feed the next char. Returns `true` when the char is plain text at the
    /// top level (not a quote, not a bracket, not inside either).
    pub(crate) fn feed(&mut self, pos: usize, c: char) -> Result<bool, ArgsError> {
        if let Some(q) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == q {
                self.quote = None;
            }
            return Ok(false);
        }

        match c {
            '"' | '\'' => {
                self.quote = Some(c);
                Ok(false)
            }
            '(' => {
                self.closers.push(')');
                Ok(false)
            }
            '[' => {
                self.closers.push(']');
                Ok(false)
            }
            '{' => {
                self.closers.push('}');
                Ok(false)
            }
            ')' | ']' | '}' => match self.closers.pop() {
                Some(expected) if expected == c => Ok(false),
                Some(expected) => Err(ArgsError::Unbalanced {
                    message: format!("expected '{}' but found '{}' at offset {}", expected, c, pos),
                }),
                None => Err(ArgsError::Unbalanced {
                    message: format!("unexpected '{}' at offset {}", c, pos),
                }),
            },
            _ => Ok(self.closers.is_empty()),
        }
    }

    /// True when no bracket or string is open.
    pub(crate) fn at_top(&self) -> bool {
        self.closers.is_empty() && self.quote.is_none()
    }

    /// Error describing whatever is still open, if anything.
    pub(crate) fn finish(&self) -> Result<(), ArgsError> {
        if let Some(q) = self.quote {
            return Err(ArgsError::Unbalanced {
                message: format!("unterminated string starting with {}", q),
            });
        }
        if let Some(closer) = self.closers.last() {
            return Err(ArgsError::Unbalanced {
                message: format!("missing closing '{}'", closer),
            });
        }
        Ok(())
    }
}

/// Split argument text into top-level tokens.
pub(crate) fn tokenize(text: &str) -> Result<Vec<String>, ArgsError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut nesting = Nesting::default();

    for (pos, c) in text.char_indices() {
        let top = nesting.feed(pos, c)?;
        if top && (c.is_whitespace() || c == ',') {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        current.push(c);
    }
    nesting.finish()?;

    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Split `key=value` at the first top-level `=`.
///
/// Returns `None` if the token has no top-level `=` (for example a quoted
/// string that merely contains one).
pub(crate) fn split_key(token: &str) -> Option<(&str, &str)> {
    let mut nesting = Nesting::default();
    for (pos, c) in token.char_indices() {
        match nesting.feed(pos, c) {
            Ok(true) if c == '=' => return Some((&token[..pos], &token[pos + 1..])),
            Ok(_) => {}
            Err(_) => return None,
        }
    }
    None
}

/// Strip one pair of outer parentheses when the opening `(` closes on the
/// final char, e.g. `("a", b=1)` but not `(a) (b)`.
pub(crate) fn strip_call_parens(text: &str) -> &str {
    if !(text.starts_with('(') && text.ends_with(')')) {
        return text;
    }
    let mut nesting = Nesting::default();
    let last = text.len() - 1;
    for (pos, c) in text.char_indices() {
        if nesting.feed(pos, c).is_err() {
            return text;
        }
        if nesting.at_top() {
            return if pos == last { &text[1..last] } else { text };
        }
    }
    text
}
