//! Meta directives, evaluated last: `{{ignore:...}}` and `{{cutoff N:...}}`
//!
//! By the time these run every other directive in their body has been
//! evaluated, so `ignore` can run directives purely for their side effects
//! and `cutoff` trims their combined output.

use async_trait::async_trait;
use tracing::debug;

use crate::directive::{Directive, DirectiveOutput, Scope};
use crate::error::DirectiveError;
use crate::grammar::Token;

/// `{{ignore:...}}` - drop the body
pub struct Ignore;

#[async_trait]
impl Directive for Ignore {
    fn name(&self) -> &str {
        "ignore"
    }

    fn description(&self) -> &str {
        "Evaluate the body for its side effects and insert nothing"
    }

    async fn apply(&self, token: &Token, _scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!(len = token.body().len(), "Ignore::apply: called");
        Ok(DirectiveOutput::empty())
    }
}

/// `{{cutoff N:...}}` - keep the first N characters of the body
pub struct Cutoff;

#[async_trait]
impl Directive for Cutoff {
    fn name(&self) -> &str {
        "cutoff"
    }

    fn description(&self) -> &str {
        "First N characters of the body: {{cutoff 100:...}}"
    }

    async fn apply(&self, token: &Token, _scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        let limit: usize = token
            .args
            .positional(0)
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| DirectiveError::malformed("cutoff", "expected a character count"))?;
        debug!(%limit, "Cutoff::apply: called");
        Ok(DirectiveOutput::text(token.body().chars().take(limit).collect::<String>()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::directive::Environment;
    use crate::grammar::find_first;

    async fn run(directive: &dyn Directive, source: &str) -> Result<DirectiveOutput, DirectiveError> {
        let env = Environment::for_tests(Default::default());
        let context = Context::new();
        let token = find_first(source, directive.name()).unwrap();
        directive.apply(&token, &Scope::new(&context, &env)).await
    }

    #[tokio::test]
    async fn test_ignore() {
        assert_eq!(run(&Ignore, "{{ignore:anything}}").await.unwrap().result, "");
    }

    #[tokio::test]
    async fn test_cutoff_counts_characters() {
        assert_eq!(run(&Cutoff, "{{cutoff 3:héllo}}").await.unwrap().result, "hél");
        assert_eq!(run(&Cutoff, "{{cutoff 10:hi}}").await.unwrap().result, "hi");
    }

    #[tokio::test]
    async fn test_cutoff_without_count() {
        let err = run(&Cutoff, "{{cutoff:hello}}").await.unwrap_err();
        assert!(err.is_silent());
    }
}
