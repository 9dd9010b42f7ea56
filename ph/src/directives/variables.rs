//! Persistent-variable directives
//!
//! `{{set name:value}}`, `{{get name}}`, `{{reset name}}`, `{{delete name}}`,
//! `{{increment:id}}`, `{{decrement:id}}` and `{{vars}}`. They form the
//! high-precedence tier, mutations first, so a `set` anywhere in a template
//! is visible to every `get`.

use async_trait::async_trait;
use tracing::debug;

use super::operand;
use crate::directive::{Directive, DirectiveOutput, Scope};
use crate::error::DirectiveError;
use crate::grammar::Token;

/// Store operation behind a variable directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableOp {
    Set,
    Reset,
    Delete,
    Increment,
    Decrement,
    Get,
    List,
}

impl VariableOp {
    /// Tier order: mutations, then reads
    pub const ALL: &'static [VariableOp] = &[
        Self::Set,
        Self::Reset,
        Self::Delete,
        Self::Increment,
        Self::Decrement,
        Self::Get,
        Self::List,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Set => "set",
            Self::Reset => "reset",
            Self::Delete => "delete",
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Get => "get",
            Self::List => "vars",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Set => "Store a persistent variable: {{set name:value}}",
            Self::Reset => "Restore a variable to its first value and return it: {{reset name}}",
            Self::Delete => "Remove a persistent variable: {{delete name}}",
            Self::Increment => "Add one to a counter and return it: {{increment:id}}",
            Self::Decrement => "Subtract one from a counter and return it: {{decrement:id}}",
            Self::Get => "Value of a persistent variable, empty if unset: {{get name}}",
            Self::List => "Names of all persistent variables, oldest first",
        }
    }
}

pub struct VariableDirective {
    op: VariableOp,
}

impl VariableDirective {
    pub fn new(op: VariableOp) -> Self {
        Self { op }
    }

    /// Variable name: first positional argument (body as fallback for the counters)
    fn target<'t>(&self, token: &'t Token) -> Result<&'t str, DirectiveError> {
        let name = match self.op {
            VariableOp::Increment | VariableOp::Decrement => operand(token),
            _ => token.args.positional(0).filter(|n| !n.is_empty()),
        };
        name.ok_or_else(|| DirectiveError::malformed(self.op.name(), "missing variable name"))
    }
}

#[async_trait]
impl Directive for VariableDirective {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn description(&self) -> &str {
        self.op.description()
    }

    async fn apply(&self, token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        debug!(op = ?self.op, raw = %token.raw, "VariableDirective::apply: called");
        let store = scope.env.store();

        let result = match self.op {
            VariableOp::Set => {
                store.set(self.target(token)?, token.body())?;
                String::new()
            }
            VariableOp::Reset => store.reset(self.target(token)?)?,
            VariableOp::Delete => {
                store.delete(self.target(token)?)?;
                String::new()
            }
            VariableOp::Increment => store.increment(self.target(token)?)?,
            VariableOp::Decrement => store.decrement(self.target(token)?)?,
            VariableOp::Get => store.get(self.target(token)?)?,
            VariableOp::List => store
                .list()?
                .into_iter()
                .map(|v| v.name)
                .collect::<Vec<_>>()
                .join(", "),
        };
        Ok(DirectiveOutput::text(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::directive::Environment;
    use crate::grammar::find_first;

    async fn run(op: VariableOp, source: &str, env: &Environment) -> Result<DirectiveOutput, DirectiveError> {
        let token = find_first(source, op.name()).unwrap();
        let context = Context::new();
        VariableDirective::new(op).apply(&token, &Scope::new(&context, env)).await
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let env = Environment::for_tests(Default::default());
        let out = run(VariableOp::Set, "{{set x:5}}", &env).await.unwrap();
        assert_eq!(out.result, "");
        let out = run(VariableOp::Get, "{{get x}}", &env).await.unwrap();
        assert_eq!(out.result, "5");
    }

    #[tokio::test]
    async fn test_reset_returns_first_value() {
        let env = Environment::for_tests(Default::default());
        run(VariableOp::Set, "{{set x:init}}", &env).await.unwrap();
        run(VariableOp::Set, "{{set x:5}}", &env).await.unwrap();
        let out = run(VariableOp::Reset, "{{reset x}}", &env).await.unwrap();
        assert_eq!(out.result, "init");
        assert_eq!(run(VariableOp::Get, "{{get x}}", &env).await.unwrap().result, "init");
    }

    #[tokio::test]
    async fn test_counters() {
        let env = Environment::for_tests(Default::default());
        assert_eq!(run(VariableOp::Increment, "{{increment:hits}}", &env).await.unwrap().result, "1");
        assert_eq!(run(VariableOp::Increment, "{{increment:hits}}", &env).await.unwrap().result, "2");
        assert_eq!(run(VariableOp::Decrement, "{{decrement hits}}", &env).await.unwrap().result, "1");
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let env = Environment::for_tests(Default::default());
        run(VariableOp::Set, "{{set a:1}}", &env).await.unwrap();
        run(VariableOp::Set, "{{set b:2}}", &env).await.unwrap();
        run(VariableOp::Set, "{{set a:3}}", &env).await.unwrap();
        assert_eq!(run(VariableOp::List, "{{vars}}", &env).await.unwrap().result, "b, a");

        run(VariableOp::Delete, "{{delete b}}", &env).await.unwrap();
        assert_eq!(run(VariableOp::List, "{{vars}}", &env).await.unwrap().result, "a");
    }

    #[tokio::test]
    async fn test_missing_name_is_malformed() {
        let env = Environment::for_tests(Default::default());
        let err = run(VariableOp::Get, "{{get}}", &env).await.unwrap_err();
        assert!(err.is_silent());
    }
}
