//! User-defined placeholders
//!
//! A custom placeholder expands to its configured template. `$1`..`$9` are
//! replaced by the token's positional arguments and `$body` by its body, so
//! `{name: sig, value: "-- $1"}` turns `{{sig Ann}}` into `-- Ann`. Tokens
//! in the expansion are evaluated by the built-in directives visited later
//! in the same pass.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::config::CustomPlaceholder;
use crate::directive::{Directive, DirectiveOutput, DirectiveRef, Scope};
use crate::error::DirectiveError;
use crate::grammar::Token;

pub struct CustomDirective {
    placeholder: CustomPlaceholder,
}

impl CustomDirective {
    pub fn new(placeholder: CustomPlaceholder) -> Self {
        Self { placeholder }
    }

    /// Expand the template for one token
    ///
    /// One left-to-right scan: substituted text is never rescanned, and a
    /// `$` followed by anything but `body` or a single digit 1-9 (`$10`,
    /// `$x`) stays literal.
    pub fn expand(&self, token: &Token) -> String {
        let template = &self.placeholder.value;
        let mut out = String::with_capacity(template.len());
        let mut rest = template.as_str();

        while let Some(at) = rest.find('$') {
            out.push_str(&rest[..at]);
            let after = &rest[at + 1..];

            if let Some(tail) = after.strip_prefix("body") {
                out.push_str(token.body());
                rest = tail;
                continue;
            }

            let digits = after.bytes().take_while(u8::is_ascii_digit).count();
            match after[..digits].parse::<usize>() {
                Ok(n) if digits == 1 && n >= 1 => {
                    out.push_str(token.args.positional(n - 1).unwrap_or(""));
                }
                _ => {
                    out.push('$');
                    out.push_str(&after[..digits]);
                }
            }
            rest = &after[digits..];
        }
        out.push_str(rest);
        out
    }
}

#[async_trait]
impl Directive for CustomDirective {
    fn name(&self) -> &str {
        &self.placeholder.name
    }

    fn description(&self) -> &str {
        self.placeholder.description.as_deref().unwrap_or("")
    }

    fn constant(&self) -> bool {
        self.placeholder.constant
    }

    async fn apply(&self, token: &Token, _scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!(name = %self.placeholder.name, "CustomDirective::apply: called");
        Ok(DirectiveOutput::text(self.expand(token)))
    }
}

/// Directives for a list of configured placeholders, skipping unusable names
pub fn from_config(placeholders: &[CustomPlaceholder]) -> Vec<DirectiveRef> {
    placeholders
        .iter()
        .filter(|p| {
            let valid = crate::grammar::is_valid_directive_name(&p.name);
            if !valid {
                tracing::warn!(name = %p.name, "Ignoring custom placeholder with an invalid name");
            }
            valid
        })
        .map(|p| Arc::new(CustomDirective::new(p.clone())) as DirectiveRef)
        .collect()
}
