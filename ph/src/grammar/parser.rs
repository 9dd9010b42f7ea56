//! Directive token parsing
//!
//! Grammar:
//!
//! ```text
//! token  = "{{" name ( ws+ arg )* ( ":" body )? "}}"
//! arg    = key "=" ( quoted | bare ) | quoted | bare
//! body   = ( text | token )*          -- nested tokens may not nest again
//! ```
//!
//! The first `}}` outside a nested token closes the body. A `{{` that does
//! not start a well-formed token makes the enclosing token malformed; the
//! scanner then resumes one byte later, so inner tokens are still found on
//! their own.

use std::ops::Range;

use super::args::{DirectiveArgs, bare_len, is_key_char, parse_quoted};

/// A directive occurrence in a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Directive name
    pub name: String,
    /// Arguments between the name and the body
    pub args: DirectiveArgs,
    /// Text after the first `:`, if any
    pub body: Option<String>,
    /// Exact source text of the token, braces included
    pub raw: String,
    /// Byte range of the token in the scanned text
    pub span: Range<usize>,
    /// Tokens found inside the body, spans relative to the same text
    pub nested: Vec<Token>,
}

impl Token {
    /// Body text, or an empty string when the token has none
    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or("")
    }

    /// Build a token that did not come from a template
    ///
    /// Used when host code invokes a directive directly. The span is empty.
    pub fn synthetic(name: &str, args: DirectiveArgs, body: Option<String>) -> Self {
        let mut raw = format!("{{{{{name}");
        for word in &args.positional {
            raw.push(' ');
            raw.push_str(word);
        }
        for (key, value) in &args.named {
            raw.push_str(&format!(" {key}=\"{}\"", value.replace('"', "\\\"")));
        }
        if let Some(body) = &body {
            raw.push(':');
            raw.push_str(body);
        }
        raw.push_str("}}");

        Self {
            name: name.to_string(),
            args,
            body,
            raw,
            span: 0..0,
            nested: Vec::new(),
        }
    }
}

/// One piece of a tokenized template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text between tokens
    Text(Range<usize>),
    /// A directive occurrence
    Directive(Token),
}

/// Check if a name is a valid directive name
///
/// Valid names contain only ASCII alphanumerics, `_`, `-` and `.`.
pub fn is_valid_directive_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

/// Split `source` into literal text and top-level directive tokens
pub fn tokenize(source: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut text_start = 0;
    let mut search = 0;

    while let Some(found) = source[search..].find("{{") {
        let start = search + found;
        match parse_token(source, start, true) {
            Some(token) => {
                if text_start < start {
                    nodes.push(Node::Text(text_start..start));
                }
                text_start = token.span.end;
                search = token.span.end;
                nodes.push(Node::Directive(token));
            }
            None => search = start + 1,
        }
    }

    if text_start < source.len() {
        nodes.push(Node::Text(text_start..source.len()));
    }
    nodes
}

/// Parse one token starting at `start`, where `source[start..]` begins with `{{`
fn parse_token(source: &str, start: usize, allow_nested: bool) -> Option<Token> {
    let mut pos = start + 2;

    let name_len = source[pos..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.'))
        .unwrap_or(source.len() - pos);
    let name = &source[pos..pos + name_len];
    if !is_valid_directive_name(name) {
        return None;
    }
    pos += name_len;

    let mut args = DirectiveArgs::default();

    loop {
        let rest = &source[pos..];
        if rest.starts_with("}}") {
            let end = pos + 2;
            return Some(Token {
                name: name.to_string(),
                args,
                body: None,
                raw: source[start..end].to_string(),
                span: start..end,
                nested: Vec::new(),
            });
        }
        if rest.starts_with(':') {
            pos += 1;
            break;
        }

        let ws = rest.len() - rest.trim_start().len();
        if ws == 0 {
            return None;
        }
        pos += ws;
        pos += parse_arg(&source[pos..], &mut args)?;
    }

    let (body_end, nested) = scan_body(source, pos, allow_nested)?;
    let end = body_end + 2;
    Some(Token {
        name: name.to_string(),
        args,
        body: Some(source[pos..body_end].to_string()),
        raw: source[start..end].to_string(),
        span: start..end,
        nested,
    })
}

/// Parse one argument, returning the number of bytes consumed
fn parse_arg(s: &str, args: &mut DirectiveArgs) -> Option<usize> {
    // Trailing whitespace before `:` or `}}`
    if s.starts_with(':') || s.starts_with("}}") {
        return Some(0);
    }

    if s.starts_with('"') {
        let (value, used) = parse_quoted(s)?;
        args.positional.push(value);
        return Some(used);
    }

    let key_len = s.find(|c: char| !is_key_char(c)).unwrap_or(s.len());
    if key_len > 0 && s[key_len..].starts_with('=') {
        let key = &s[..key_len];
        let after = &s[key_len + 1..];
        let (value, used) = if after.starts_with('"') {
            parse_quoted(after)?
        } else {
            let len = bare_len(after);
            (after[..len].to_string(), len)
        };
        args.named.insert(key.to_string(), value);
        return Some(key_len + 1 + used);
    }

    let len = bare_len(s);
    if len == 0 {
        return None;
    }
    args.positional.push(s[..len].to_string());
    Some(len)
}

/// Find the `}}` that closes a body starting at `pos`
///
/// Returns the byte offset of the closing braces and any nested tokens.
fn scan_body(source: &str, mut pos: usize, allow_nested: bool) -> Option<(usize, Vec<Token>)> {
    let bytes = source.as_bytes();
    let mut nested = Vec::new();

    while pos + 1 < bytes.len() {
        if bytes[pos] == b'{' && bytes[pos + 1] == b'{' {
            if !allow_nested {
                return None;
            }
            let inner = parse_token(source, pos, false)?;
            pos = inner.span.end;
            nested.push(inner);
        } else if bytes[pos] == b'}' && bytes[pos + 1] == b'}' {
            return Some((pos, nested));
        } else {
            pos += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(source: &str) -> Token {
        let nodes = tokenize(source);
        let tokens: Vec<Token> = nodes
            .into_iter()
            .filter_map(|n| match n {
                Node::Directive(t) => Some(t),
                Node::Text(_) => None,
            })
            .collect();
        assert_eq!(tokens.len(), 1, "expected one token in {source:?}");
        tokens.into_iter().next().unwrap()
    }

    #[test]
    fn test_bare_directive() {
        let token = single("Clipboard: {{clipboardText}}!");
        assert_eq!(token.name, "clipboardText");
        assert!(token.args.is_empty());
        assert_eq!(token.body, None);
        assert_eq!(token.span, 11..28);
        assert_eq!(token.raw, "{{clipboardText}}");
    }

    #[test]
    fn test_named_quoted_arg() {
        let token = single(r#"{{date format="%Y-%m-%d"}}"#);
        assert_eq!(token.name, "date");
        assert_eq!(token.args.get("format"), Some("%Y-%m-%d"));
    }

    #[test]
    fn test_named_bare_arg_with_body() {
        let token = single("{{url raw=true:https://example.com/a?b=c}}");
        assert_eq!(token.args.get("raw"), Some("true"));
        assert_eq!(token.body(), "https://example.com/a?b=c");
    }

    #[test]
    fn test_positional_arg_with_body() {
        let token = single("{{shell /bin/bash:echo hi}}");
        assert_eq!(token.name, "shell");
        assert_eq!(token.args.positional(0), Some("/bin/bash"));
        assert_eq!(token.body(), "echo hi");
    }

    #[test]
    fn test_positional_without_body() {
        let token = single("{{get my-var}}");
        assert_eq!(token.args.positional(0), Some("my-var"));
        assert_eq!(token.body, None);
    }

    #[test]
    fn test_body_keeps_inner_colons() {
        let token = single("{{images:yes: it is:no}}");
        assert_eq!(token.name, "images");
        assert_eq!(token.body(), "yes: it is:no");
    }

    #[test]
    fn test_empty_body() {
        let token = single("{{increment:}}");
        assert_eq!(token.body, Some(String::new()));
    }

    #[test]
    fn test_one_level_nesting() {
        let token = single("{{images:{{clipboardText}}:{{date format=\"%A\"}}}}");
        assert_eq!(token.name, "images");
        assert_eq!(token.nested.len(), 2);
        assert_eq!(token.nested[0].name, "clipboardText");
        assert_eq!(token.nested[0].span, 9..26);
        assert_eq!(token.nested[1].name, "date");
    }

    #[test]
    fn test_second_level_nesting_falls_back_to_inner_token() {
        let source = "{{a:{{b:{{c}}}}}}";
        let nodes = tokenize(source);
        let tokens: Vec<&Token> = nodes
            .iter()
            .filter_map(|n| match n {
                Node::Directive(t) => Some(t),
                Node::Text(_) => None,
            })
            .collect();

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].name, "b");
        assert_eq!(tokens[0].nested[0].name, "c");
    }

    #[test]
    fn test_single_braces_in_body() {
        let token = single("{{js:let o = {a: 1}; o.a}}");
        assert_eq!(token.body(), "let o = {a: 1}; o.a");
    }

    #[test]
    fn test_unclosed_is_text() {
        let nodes = tokenize("before {{clipboardText after");
        assert_eq!(nodes, vec![Node::Text(0..28)]);
    }

    #[test]
    fn test_invalid_name_is_text() {
        assert_eq!(tokenize("{{ spaced }}"), vec![Node::Text(0..12)]);
        assert_eq!(tokenize("{{}}"), vec![Node::Text(0..4)]);
        assert_eq!(tokenize("{{a@b}}"), vec![Node::Text(0..7)]);
    }

    #[test]
    fn test_triple_brace_prefix() {
        let nodes = tokenize("{{{uuid}}");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0], Node::Text(0..1));
        match &nodes[1] {
            Node::Directive(t) => assert_eq!(t.name, "uuid"),
            Node::Text(_) => panic!("expected directive"),
        }
    }

    #[test]
    fn test_text_and_tokens_interleave() {
        let nodes = tokenize("a{{x}}b{{y}}");
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0], Node::Text(0..1));
        assert_eq!(nodes[2], Node::Text(6..7));
    }

    #[test]
    fn test_unicode_text_around_tokens() {
        let token = single("héllo {{set naïve:ünï}} wörld");
        assert_eq!(token.name, "set");
        assert_eq!(token.args.positional(0), Some("naïve"));
        assert_eq!(token.body(), "ünï");
    }

    #[test]
    fn test_is_valid_directive_name() {
        assert!(is_valid_directive_name("clipboardText"));
        assert!(is_valid_directive_name("3gp"));
        assert!(is_valid_directive_name("my-directive_v2.1"));
        assert!(!is_valid_directive_name(""));
        assert!(!is_valid_directive_name("foo bar"));
    }

    #[test]
    fn test_synthetic_token_reparses() {
        let mut args = DirectiveArgs::default();
        args.positional.push("zsh".to_string());
        args.named.insert("format".to_string(), "%H".to_string());
        let token = Token::synthetic("shell", args.clone(), Some("echo hi".to_string()));
        assert_eq!(token.raw, r#"{{shell zsh format="%H":echo hi}}"#);

        let parsed = single(&token.raw);
        assert_eq!(parsed.name, "shell");
        assert_eq!(parsed.args, args);
        assert_eq!(parsed.body(), "echo hi");
    }
}
