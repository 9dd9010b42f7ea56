//! Flow-control directives
//!
//! `{{images:yes:no}}` becomes `yes` when any selected file is an image and
//! `no` otherwise. Every category has a directive, and so does every single
//! extension (`{{png:yes:no}}`). The branches may hold further tokens; the
//! chosen branch is evaluated by later directives in the same pass.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::context::SELECTED_FILES_KEY;
use crate::directive::{Directive, DirectiveOutput, DirectiveRef, Scope};
use crate::error::DirectiveError;
use crate::grammar::Token;

/// File categories and their extensions
pub const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "images",
        &["png", "jpg", "jpeg", "gif", "webp", "heic", "heif", "tif", "tiff", "bmp", "svg", "ico", "raw"],
    ),
    (
        "videos",
        &["mp4", "mov", "m4v", "avi", "mkv", "webm", "wmv", "flv", "mpg", "mpeg", "3gp"],
    ),
    ("audio", &["mp3", "wav", "aac", "flac", "ogg", "m4a", "aif", "aiff", "wma", "opus"]),
    (
        "textfiles",
        &["txt", "md", "markdown", "rtf", "csv", "tsv", "json", "xml", "yaml", "yml", "html", "htm", "log", "tex"],
    ),
    ("pdf", &["pdf"]),
];

/// One flow-control directive: a name and the extensions it matches
pub struct FlowControl {
    name: &'static str,
    extensions: &'static [&'static str],
}

impl FlowControl {
    pub fn new(name: &'static str, extensions: &'static [&'static str]) -> Self {
        Self { name, extensions }
    }

    /// Whether any path ends in one of this directive's extensions
    pub fn matches(&self, paths: &[String]) -> bool {
        paths.iter().any(|path| {
            let lower = path.to_lowercase();
            lower
                .rsplit_once('.')
                .is_some_and(|(_, ext)| self.extensions.contains(&ext))
        })
    }
}

/// Category directives, then one per extension not already named by a category
pub fn directives() -> Vec<DirectiveRef> {
    let mut seen: HashSet<&str> = CATEGORIES.iter().map(|(name, _)| *name).collect();
    let mut table: Vec<DirectiveRef> = CATEGORIES
        .iter()
        .map(|&(name, extensions)| Arc::new(FlowControl::new(name, extensions)) as DirectiveRef)
        .collect();

    for &(_, extensions) in CATEGORIES {
        for extension in extensions {
            if seen.insert(*extension) {
                table.push(Arc::new(FlowControl::new(*extension, std::slice::from_ref(extension))));
            }
        }
    }
    table
}

/// Split a body at its first colon outside any nested token
pub fn split_branches(body: &str) -> (&str, &str) {
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(b"{{") {
            depth += 1;
            i += 2;
        } else if bytes[i..].starts_with(b"}}") {
            depth = depth.saturating_sub(1);
            i += 2;
        } else if bytes[i] == b':' && depth == 0 {
            return (&body[..i], &body[i + 1..]);
        } else {
            i += 1;
        }
    }
    (body, "")
}

#[async_trait]
impl Directive for FlowControl {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "First branch if any selected file matches, else the second: {{name:yes:no}}"
    }

    fn constant(&self) -> bool {
        true
    }

    async fn apply(&self, token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        let paths = if scope.context.is_resolved(SELECTED_FILES_KEY) {
            scope.context.selected_files()
        } else {
            scope.env.provider().selected_files().await.unwrap_or_default()
        };
        let matched = self.matches(&paths);
        debug!(name = %self.name, files = paths.len(), %matched, "FlowControl::apply: called");

        let (yes, no) = split_branches(token.body());
        Ok(DirectiveOutput::text(if matched { yes } else { no }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::directive::Environment;
    use crate::grammar::find_first;

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_category_matching() {
        let images = FlowControl::new("images", CATEGORIES[0].1);
        assert!(images.matches(&paths(&["a.png", "b.txt"])));
        assert!(images.matches(&paths(&["/tmp/PHOTO.JPG"])));
        assert!(!images.matches(&paths(&["b.txt", "png"])));
        assert!(!images.matches(&[]));
    }

    #[test]
    fn test_split_branches() {
        assert_eq!(split_branches("yes:no"), ("yes", "no"));
        assert_eq!(split_branches("only"), ("only", ""));
        assert_eq!(split_branches("{{get a:b}}:no"), ("{{get a:b}}", "no"));
        assert_eq!(split_branches("a:b:c"), ("a", "b:c"));
    }

    #[test]
    fn test_directive_names_unique_and_complete() {
        let table = directives();
        let names: Vec<&str> = table.iter().map(|d| d.name()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len());
        assert!(unique.contains("images"));
        assert!(unique.contains("png"));
        assert!(unique.contains("3gp"));
        assert!(table.iter().all(|d| d.constant()));
    }

    #[tokio::test]
    async fn test_apply_uses_context_selection() {
        let env = Environment::for_tests(Default::default());
        let context = Context::new().with(SELECTED_FILES_KEY, "a.png,b.txt");
        let scope = Scope::new(&context, &env);

        let images = FlowControl::new("images", CATEGORIES[0].1);
        let token = find_first("{{images:Y:N}}", "images").unwrap();
        assert_eq!(images.apply(&token, &scope).await.unwrap().result, "Y");

        let pdf = FlowControl::new("pdf", &["pdf"]);
        let token = find_first("{{pdf:Y:N}}", "pdf").unwrap();
        assert_eq!(pdf.apply(&token, &scope).await.unwrap().result, "N");
    }
}
