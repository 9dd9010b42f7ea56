//! Context - per-call accumulator of resolved directive values

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key for host-supplied user input
pub const INPUT_KEY: &str = "input";

/// Key for the selected file list (comma separated paths)
pub const SELECTED_FILES_KEY: &str = "selectedFiles";

/// Values resolved during one substitution call, keyed by result-key name
///
/// Seeded by the caller, grown by every directive that runs, and handed back
/// with the rendered text. Values are usually strings; a few directives store
/// structured JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    values: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Value as text (strings verbatim, anything else as JSON)
    pub fn text(&self, key: &str) -> Option<String> {
        self.values.get(key).map(value_to_text)
    }

    /// Whether `key` holds a usable value
    ///
    /// Every present key counts, except `input` holding an empty string: the
    /// host seeds that before the user has typed anything.
    pub fn is_resolved(&self, key: &str) -> bool {
        match self.values.get(key) {
            Some(Value::String(s)) if key == INPUT_KEY => !s.is_empty(),
            Some(_) => true,
            None => false,
        }
    }

    /// Merge directive output fields, overwriting existing keys
    pub fn merge(&mut self, fields: impl IntoIterator<Item = (String, Value)>) {
        self.values.extend(fields);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Selected file paths from `selectedFiles`
    pub fn selected_files(&self) -> Vec<String> {
        self.text(SELECTED_FILES_KEY)
            .map(|raw| split_paths(&raw))
            .unwrap_or_default()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Self::new();
        for (k, v) in iter {
            context.insert(k, v);
        }
        context
    }
}

/// Render a context value as substitution text
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Split a delimited path list (commas or newlines)
pub fn split_paths(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_input_is_unresolved() {
        let ctx = Context::new().with(INPUT_KEY, "");
        assert!(!ctx.is_resolved(INPUT_KEY));

        let ctx = Context::new().with(INPUT_KEY, "typed");
        assert!(ctx.is_resolved(INPUT_KEY));
    }

    #[test]
    fn test_empty_string_counts_as_resolved_for_other_keys() {
        let ctx = Context::new().with("clipboardText", "");
        assert!(ctx.is_resolved("clipboardText"));
        assert!(!ctx.is_resolved("selectedText"));
    }

    #[test]
    fn test_text_renders_structured_values() {
        let ctx = Context::new()
            .with("plain", "hi")
            .with("weather", json!({"temp": 21}))
            .with("nothing", Value::Null);
        assert_eq!(ctx.text("plain").as_deref(), Some("hi"));
        assert_eq!(ctx.text("weather").as_deref(), Some(r#"{"temp":21}"#));
        assert_eq!(ctx.text("nothing").as_deref(), Some(""));
    }

    #[test]
    fn test_selected_files_split() {
        let ctx = Context::new().with(SELECTED_FILES_KEY, "a.png, b.txt\n/tmp/c.pdf,");
        assert_eq!(ctx.selected_files(), vec!["a.png", "b.txt", "/tmp/c.pdf"]);
    }

    #[test]
    fn test_from_iterator_and_merge() {
        let mut ctx: Context = [("a", "1")].into_iter().collect();
        ctx.merge([("b".to_string(), json!("2")), ("a".to_string(), json!("3"))]);
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.text("a").as_deref(), Some("3"));
    }
}
