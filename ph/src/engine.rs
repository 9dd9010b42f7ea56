//! Substitution engine
//!
//! One call of [`SubstitutionEngine::bulk_apply`] renders one template:
//!
//! 1. Tokens of a directive whose primary result key the caller already
//!    seeded are replaced with the seeded value.
//! 2. Directives are visited once each, in order: caller-supplied custom
//!    directives, then the built-in tiers. A directive is skipped when its
//!    token is absent, or when every one of its result keys is already
//!    resolved.
//! 3. For a visited directive, its dependencies' tokens are resolved first,
//!    then its own: while a token remains, evaluate it and splice the result
//!    over that token (or over every identical token, for constant
//!    directives), merging the output fields into the context.
//!
//! A constant result is broadcast only to tokens with the same raw text:
//! `{{images:a:b}}` and `{{images:c:d}}` are evaluated separately.
//!
//! This is a single ordered pass, not a fixed point. Text produced by a
//! directive is only picked up by directives visited after it (or by the
//! directive itself, while its loop is still running).

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::context::Context;
use crate::directive::{DirectiveOutput, DirectiveRef, Environment, Scope};
use crate::grammar::{self, Token};

/// Result of one substitution call
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    /// The rendered template
    pub text: String,
    /// The seed context plus everything resolved during the call
    pub context: Context,
}

/// Renders templates against an [`Environment`]
#[derive(Clone)]
pub struct SubstitutionEngine {
    env: Environment,
    limits: EngineConfig,
}

impl SubstitutionEngine {
    pub fn new(env: Environment) -> Self {
        Self {
            env,
            limits: EngineConfig::default(),
        }
    }

    pub fn with_limits(mut self, limits: EngineConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Render `template`, starting from `seed`
    ///
    /// `custom` directives take precedence over built-ins of the same name.
    /// Directive failures never abort the call; the failing token becomes an
    /// empty string.
    pub async fn bulk_apply(&self, template: &str, seed: Context, custom: &[DirectiveRef]) -> Substitution {
        debug!(
            template_len = template.len(),
            seed_keys = seed.len(),
            custom = custom.len(),
            "SubstitutionEngine::bulk_apply: called"
        );
        let mut context = seed;

        if !grammar::has_tokens(template) {
            debug!("SubstitutionEngine::bulk_apply: no tokens");
            return Substitution {
                text: template.to_string(),
                context,
            };
        }

        let order = self.evaluation_order(custom);
        let mut working = pre_resolve(template, &context, &order);

        for directive in &order {
            let name = directive.name();
            if !grammar::contains(&working, name) {
                continue;
            }

            let keys = directive.result_keys();
            if !keys.is_empty() && keys.iter().all(|k| context.is_resolved(k)) {
                debug!(%name, "SubstitutionEngine::bulk_apply: result keys already resolved, skipping");
                continue;
            }

            let mut patterns: Vec<&DirectiveRef> = directive
                .dependencies()
                .iter()
                .filter_map(|dep| lookup(&order, dep))
                .collect();
            patterns.push(directive);

            for pattern in patterns {
                working = self.resolve(working, &mut context, pattern).await;
            }
        }

        info!(
            rendered_len = working.len(),
            context_keys = context.len(),
            "Substitution complete"
        );
        Substitution { text: working, context }
    }

    /// Custom directives first, then built-ins not shadowed by a custom one
    fn evaluation_order(&self, custom: &[DirectiveRef]) -> Vec<DirectiveRef> {
        let shadowed: HashSet<&str> = custom.iter().map(|d| d.name()).collect();
        custom
            .iter()
            .cloned()
            .chain(
                self.env
                    .registry()
                    .iter()
                    .filter(|(_, d)| !shadowed.contains(d.name()))
                    .map(|(_, d)| d.clone()),
            )
            .collect()
    }

    /// Evaluate every token of `directive` in `working`
    async fn resolve(&self, mut working: String, context: &mut Context, directive: &DirectiveRef) -> String {
        let name = directive.name();
        let mut passes = 0;

        while let Some(token) = grammar::find_first(&working, name) {
            if passes >= self.limits.max_passes_per_directive {
                warn!(
                    %name,
                    passes,
                    "Directive keeps producing its own token, leaving the rest unevaluated"
                );
                break;
            }
            passes += 1;

            let output = self.evaluate(directive, &token, context).await;

            if directive.constant() {
                let edits = grammar::find_all(&working, name)
                    .into_iter()
                    .filter(|t| t.raw == token.raw)
                    .map(|t| (t.span, output.result.clone()))
                    .collect();
                working = grammar::splice(&working, edits);
            } else {
                working.replace_range(token.span.clone(), &output.result);
            }
            context.merge(output.fields);
        }

        if passes > 0 {
            debug!(%name, passes, "SubstitutionEngine::resolve: done");
        }
        working
    }

    /// Run one directive, turning any failure into an empty result
    async fn evaluate(&self, directive: &DirectiveRef, token: &Token, context: &Context) -> DirectiveOutput {
        let scope = Scope::new(context, &self.env);
        match directive.apply(token, &scope).await {
            Ok(output) => output,
            Err(e) if e.is_silent() => {
                debug!(name = %directive.name(), error = %e, "SubstitutionEngine::evaluate: lookup missed");
                DirectiveOutput::empty()
            }
            Err(e) => {
                warn!(name = %directive.name(), error = %e, "Directive failed, substituting empty text");
                DirectiveOutput::empty()
            }
        }
    }
}

fn lookup<'a>(order: &'a [DirectiveRef], name: &str) -> Option<&'a DirectiveRef> {
    order.iter().find(|d| d.name() == name)
}

/// Replace tokens whose value the caller already supplied
fn pre_resolve(template: &str, context: &Context, order: &[DirectiveRef]) -> String {
    let mut edits = Vec::new();
    for token in grammar::all_tokens(template) {
        let Some(directive) = lookup(order, &token.name) else {
            continue;
        };
        let Some(primary) = directive.result_keys().first() else {
            continue;
        };
        if !context.is_resolved(primary) {
            continue;
        }
        if let Some(value) = context.text(primary) {
            edits.push((token.span, value));
        }
    }

    // A nested token sits inside its parent's span; the parent wins.
    edits.sort_by_key(|(span, _)| span.start);
    let mut kept: Vec<(std::ops::Range<usize>, String)> = Vec::with_capacity(edits.len());
    for (span, value) in edits {
        if kept.last().is_some_and(|(prev, _)| span.start < prev.end) {
            continue;
        }
        kept.push((span, value));
    }

    if kept.is_empty() {
        return template.to_string();
    }
    debug!(replaced = kept.len(), "pre_resolve: seeded values applied");
    grammar::splice(template, kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::Directive;
    use crate::error::DirectiveError;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo {
        name: &'static str,
        output: &'static str,
        constant: bool,
        calls: AtomicUsize,
    }

    impl Echo {
        fn new(name: &'static str, output: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                output,
                constant: false,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Directive for Echo {
        fn name(&self) -> &str {
            self.name
        }

        fn constant(&self) -> bool {
            self.constant
        }

        async fn apply(&self, _token: &Token, _scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(DirectiveOutput::text(self.output))
        }
    }

    fn engine() -> SubstitutionEngine {
        SubstitutionEngine::new(Environment::for_tests(Default::default()))
    }

    #[tokio::test]
    async fn test_plain_text_unchanged() {
        let echo = Echo::new("x", "X");
        let custom: Vec<DirectiveRef> = vec![echo.clone()];
        let out = engine().bulk_apply("no tokens { here }", Context::new(), &custom).await;
        assert_eq!(out.text, "no tokens { here }");
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_custom_directive_each_occurrence() {
        let echo = Echo::new("x", "X");
        let custom: Vec<DirectiveRef> = vec![echo.clone()];
        let out = engine().bulk_apply("{{x}}-{{x}}", Context::new(), &custom).await;
        assert_eq!(out.text, "X-X");
        assert_eq!(echo.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_constant_custom_directive_runs_once() {
        let echo = Arc::new(Echo {
            name: "x",
            output: "X",
            constant: true,
            calls: AtomicUsize::new(0),
        });
        let custom: Vec<DirectiveRef> = vec![echo.clone()];
        let out = engine().bulk_apply("{{x}} {{x}} {{x}}", Context::new(), &custom).await;
        assert_eq!(out.text, "X X X");
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_constant_broadcast_needs_identical_raw() {
        let echo = Arc::new(Echo {
            name: "x",
            output: "X",
            constant: true,
            calls: AtomicUsize::new(0),
        });
        let custom: Vec<DirectiveRef> = vec![echo.clone()];
        let out = engine().bulk_apply("{{x a}} {{x b}} {{x a}}", Context::new(), &custom).await;
        assert_eq!(out.text, "X X X");
        assert_eq!(echo.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_custom_shadows_builtin() {
        let custom: Vec<DirectiveRef> = vec![Echo::new("clipboardText", "mine")];
        let out = engine().bulk_apply("{{clipboardText}}", Context::new(), &custom).await;
        assert_eq!(out.text, "mine");
    }

    #[tokio::test]
    async fn test_self_reproducing_directive_terminates() {
        let custom: Vec<DirectiveRef> = vec![Echo::new("again", "{{again}}")];
        let engine = engine().with_limits(EngineConfig {
            max_passes_per_directive: 5,
        });
        let out = engine.bulk_apply("{{again}}", Context::new(), &custom).await;
        assert_eq!(out.text, "{{again}}");
    }

    #[tokio::test]
    async fn test_seeded_primary_key_pre_resolves() {
        let seed = Context::new().with("clipboardText", "seeded");
        let out = engine().bulk_apply("[{{clipboardText}}]", seed, &[]).await;
        assert_eq!(out.text, "[seeded]");
    }

    #[tokio::test]
    async fn test_empty_input_is_not_pre_resolved() {
        let seed = Context::new().with("input", "");
        let out = engine().bulk_apply("[{{input}}]", seed, &[]).await;
        // The static provider has no input either, so the token resolves empty
        assert_eq!(out.text, "[]");
    }

    #[test]
    fn test_pre_resolve_without_directives_is_identity() {
        let order: Vec<DirectiveRef> = vec![];
        assert_eq!(pre_resolve("{{a}}", &Context::new(), &order), "{{a}}");
    }
}
