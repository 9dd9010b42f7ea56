//! Placeholder token grammar
//!
//! Templates are plain text with directive tokens:
//!
//! - `{{clipboardText}}` - bare directive
//! - `{{date format="%H:%M"}}` - named arguments
//! - `{{shell /bin/zsh:echo hi}}` - positional argument and body
//! - `{{images:{{clipboardText}}:none}}` - body holding one level of nested tokens
//!
//! [`tokenize`] splits a template into [`Node`]s. The lookup helpers below
//! work on the flattened token list (top-level tokens plus the tokens nested
//! in their bodies), which is what the substitution engine matches against.

mod args;
mod parser;

pub use args::DirectiveArgs;
pub use parser::{Node, Token, is_valid_directive_name, tokenize};

/// Check whether `source` holds any directive token at all
pub fn has_tokens(source: &str) -> bool {
    source.contains("{{") && tokenize(source).iter().any(|n| matches!(n, Node::Directive(_)))
}

/// Every token in document order, nested tokens right after their parent
pub fn all_tokens(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for node in tokenize(source) {
        if let Node::Directive(mut token) = node {
            let nested = std::mem::take(&mut token.nested);
            tokens.push(token);
            tokens.extend(nested);
        }
    }
    tokens
}

/// Every token named `name`, in document order
pub fn find_all(source: &str, name: &str) -> Vec<Token> {
    all_tokens(source).into_iter().filter(|t| t.name == name).collect()
}

/// Check whether a token named `name` occurs anywhere in `source`
pub fn contains(source: &str, name: &str) -> bool {
    source.contains(name) && !find_all(source, name).is_empty()
}

/// The next token named `name` to evaluate
///
/// Tokens are taken in document order, except that a token whose body holds
/// a token of the same name yields to that inner token first. The inner
/// result then becomes part of the outer token's body.
pub fn find_first(source: &str, name: &str) -> Option<Token> {
    for node in tokenize(source) {
        let Node::Directive(token) = node else {
            continue;
        };
        if let Some(inner) = token.nested.iter().find(|t| t.name == name) {
            return Some(inner.clone());
        }
        if token.name == name {
            return Some(token);
        }
    }
    None
}

/// Replace each span with its text, working back to front so earlier spans stay valid
///
/// Spans must not overlap.
pub fn splice(source: &str, mut edits: Vec<(std::ops::Range<usize>, String)>) -> String {
    edits.sort_by_key(|(span, _)| std::cmp::Reverse(span.start));
    let mut out = source.to_string();
    for (span, text) in edits {
        out.replace_range(span, &text);
    }
    out
}
