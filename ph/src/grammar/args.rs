//! Directive argument parsing
//!
//! Arguments sit between the directive name and the optional body:
//! `{{name word key="value" key=bare:body}}`.

use std::collections::BTreeMap;

/// Arguments attached to a directive token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveArgs {
    /// Bare words in order of appearance (`{{get name}}`, `{{shell zsh:...}}`)
    pub positional: Vec<String>,
    /// `key="value"` and `key=value` pairs
    pub named: BTreeMap<String, String>,
}

impl DirectiveArgs {
    /// Named argument by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.named.get(key).map(String::as_str)
    }

    /// Named argument parsed as a boolean (`true`, `yes`, `1`)
    pub fn flag(&self, key: &str) -> bool {
        matches!(
            self.get(key).map(str::to_ascii_lowercase).as_deref(),
            Some("true" | "yes" | "1")
        )
    }

    /// Positional argument by index
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// Characters allowed in argument keys
pub(crate) fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Characters allowed in unquoted values and positional words
pub(crate) fn is_bare_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, ':' | '{' | '}' | '"' | '=')
}

/// Parse a double-quoted string starting at `s[0] == '"'`
///
/// `\"` and `\\` are unescaped. Returns the value and bytes consumed, or
/// `None` if the string never closes.
pub(crate) fn parse_quoted(s: &str) -> Option<(String, usize)> {
    let mut chars = s.char_indices();
    if chars.next()?.1 != '"' {
        return None;
    }

    let mut value = String::new();
    let mut escaped = false;
    for (i, c) in chars {
        if escaped {
            value.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => return Some((value, i + 1)),
            _ => value.push(c),
        }
    }
    None
}

/// Length of the leading run of bare characters
pub(crate) fn bare_len(s: &str) -> usize {
    s.find(|c: char| !is_bare_char(c)).unwrap_or(s.len())
}
