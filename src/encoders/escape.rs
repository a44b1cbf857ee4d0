//! Escaping helpers shared by encoders and runners.

/// Characters `cmd.exe` treats specially, each escaped with a leading `^`.
const CMD_SPECIAL: &[char] = &['&', '>', '(', ')', '|'];

/// Escape `cmd.exe` metacharacters. `^` itself is doubled first so the
/// inserted carets are never escaped again.
pub fn cmd_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '^' || CMD_SPECIAL.contains(&c) {
            out.push('^');
        }
        out.push(c);
    }
    out
}

/// Prefix every double quote with a backslash.
pub fn escape_double_quotes(text: &str) -> String {
    text.replace('"', "\\\"")
}

/// Form-encode `text` like `application/x-www-form-urlencoded` values:
/// `A-Z a-z 0-9 _ . - ~` pass through, space becomes `+`, every other
/// UTF-8 byte becomes `%XX`.
pub fn quote_plus(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'.' | b'-' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
