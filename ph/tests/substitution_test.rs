//! End-to-end substitution tests against the public engine API

use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use placeholders::config::{Config, CustomPlaceholder, ScriptConfig};
use placeholders::grammar::Token;
use placeholders::{
    Context, Directive, DirectiveError, DirectiveOutput, DirectiveRef, Environment, Scope, StaticContextProvider,
    SubstitutionEngine, custom,
};
use varstore::VariableStore;

fn config() -> Config {
    Config {
        scripts: ScriptConfig {
            default_shell: "sh".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn engine_with(provider: Arc<StaticContextProvider>, store: Arc<VariableStore>) -> SubstitutionEngine {
    SubstitutionEngine::new(Environment::new(&config(), store, provider))
}

fn engine() -> SubstitutionEngine {
    engine_with(Arc::new(StaticContextProvider::new()), Arc::new(VariableStore::in_memory()))
}

/// Counts how often it runs
struct Counter {
    calls: AtomicUsize,
}

#[async_trait]
impl Directive for Counter {
    fn name(&self) -> &str {
        "counted"
    }

    async fn apply(&self, _token: &Token, _scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DirectiveOutput::text("counted"))
    }
}

#[tokio::test]
async fn test_set_is_visible_to_earlier_get() {
    let out = engine().bulk_apply("[{{get x}}][{{set x:5}}]", Context::new(), &[]).await;
    assert_eq!(out.text, "[5][]");
}

#[tokio::test]
async fn test_reset_restores_first_value_across_calls() {
    let store = Arc::new(VariableStore::in_memory());
    let engine = engine_with(Arc::new(StaticContextProvider::new()), store.clone());

    engine.bulk_apply("{{set x:init}}", Context::new(), &[]).await;
    let out = engine
        .bulk_apply("{{set x:5}}{{reset x}}|{{get x}}", Context::new(), &[])
        .await;
    assert_eq!(out.text, "init|init");
    assert_eq!(store.get("x").unwrap(), "init");
}

#[tokio::test]
async fn test_counters_across_calls() {
    let engine = engine();
    let first = engine.bulk_apply("{{increment:visits}}", Context::new(), &[]).await;
    let second = engine.bulk_apply("{{increment:visits}}", Context::new(), &[]).await;
    let third = engine.bulk_apply("{{decrement:visits}}", Context::new(), &[]).await;
    assert_eq!((first.text.as_str(), second.text.as_str(), third.text.as_str()), ("1", "2", "1"));
}

#[tokio::test]
async fn test_flow_control_by_selected_files() {
    let seed = Context::new().with("selectedFiles", "a.png,b.txt");
    let out = engine().bulk_apply("{{images:Y:N}} {{pdf:Y:N}} {{txt:T:F}}", seed, &[]).await;
    assert_eq!(out.text, "Y N T");
}

#[tokio::test]
async fn test_flow_control_branch_holds_evaluated_token() {
    let seed = Context::new().with("selectedFiles", "/tmp/photo.jpeg");
    let out = engine()
        .bulk_apply("{{set mood:bright}}{{images:{{get mood}}:none}}", seed, &[])
        .await;
    assert_eq!(out.text, "bright");
}

#[tokio::test]
async fn test_constant_directive_evaluated_once() {
    let provider = Arc::new(StaticContextProvider::new().with_clipboard("clip"));
    let engine = engine_with(provider.clone(), Arc::new(VariableStore::in_memory()));

    let out = engine
        .bulk_apply("{{clipboardText}} and {{clipboardText}}", Context::new(), &[])
        .await;
    assert_eq!(out.text, "clip and clip");
    assert_eq!(provider.clipboard_reads(), 1);
    assert_eq!(out.context.text("clipboardText").as_deref(), Some("clip"));
}

#[tokio::test]
async fn test_seeded_value_is_not_recomputed() {
    let provider = Arc::new(StaticContextProvider::new().with_clipboard("live"));
    let engine = engine_with(provider.clone(), Arc::new(VariableStore::in_memory()));

    let seed = Context::new().with("clipboardText", "seeded");
    let out = engine.bulk_apply("{{clipboardText}}!", seed, &[]).await;
    assert_eq!(out.text, "seeded!");
    assert_eq!(provider.clipboard_reads(), 0);
}

#[tokio::test]
async fn test_empty_seeded_input_is_resolved_again() {
    let provider = Arc::new(StaticContextProvider::new().with_input("typed"));
    let engine = engine_with(provider, Arc::new(VariableStore::in_memory()));

    let seed = Context::new().with("input", "");
    let out = engine.bulk_apply("> {{input}}", seed, &[]).await;
    assert_eq!(out.text, "> typed");
}

#[tokio::test]
async fn test_failing_script_does_not_block_later_directives() {
    let out = engine()
        .bulk_apply("a{{shell:exit 3}}b{{cutoff 2:hello}}", Context::new(), &[])
        .await;
    assert_eq!(out.text, "abhe");
}

#[tokio::test]
async fn test_invalid_date_format_becomes_empty() {
    let out = engine()
        .bulk_apply(r#"a{{date format="%Q"}}b{{time format="%"}}c{{cutoff 1:xy}}"#, Context::new(), &[])
        .await;
    assert_eq!(out.text, "abcx");
    assert!(out.context.get("date").is_none());
}

#[tokio::test]
async fn test_missing_lookup_becomes_empty() {
    let out = engine().bulk_apply("[{{selectedText}}]", Context::new(), &[]).await;
    assert_eq!(out.text, "[]");
}

#[tokio::test]
async fn test_template_without_tokens_makes_no_calls() {
    let counter = Arc::new(Counter {
        calls: AtomicUsize::new(0),
    });
    let provider = Arc::new(StaticContextProvider::new().with_clipboard("clip"));
    let engine = engine_with(provider.clone(), Arc::new(VariableStore::in_memory()));
    let custom: Vec<DirectiveRef> = vec![counter.clone()];

    let template = "plain text with {braces} and {{ not a token";
    let out = engine.bulk_apply(template, Context::new(), &custom).await;
    assert_eq!(out.text, template);
    assert_eq!(counter.calls.load(Ordering::SeqCst), 0);
    assert_eq!(provider.clipboard_reads(), 0);
}

#[tokio::test]
async fn test_dependency_resolved_first() {
    let provider = Arc::new(
        StaticContextProvider::new()
            .with_application("Safari", "/Applications/Safari.app")
            .with_url("https://example.com"),
    );
    let engine = engine_with(provider, Arc::new(VariableStore::in_memory()));

    let out = engine
        .bulk_apply("{{currentURL}} from {{currentApplication}}", Context::new(), &[])
        .await;
    assert_eq!(out.text, "https://example.com from Safari");
    assert_eq!(out.context.text("currentAppName").as_deref(), Some("Safari"));
    assert_eq!(out.context.text("currentURL").as_deref(), Some("https://example.com"));
}

#[tokio::test]
async fn test_custom_placeholder_expansion_reaches_later_tiers() {
    let store = Arc::new(VariableStore::in_memory());
    store.set("name", "Ann").unwrap();
    let engine = engine_with(Arc::new(StaticContextProvider::new()), store);

    let custom = custom::from_config(&[CustomPlaceholder {
        name: "sig".to_string(),
        value: "-- {{get name}} ($1)".to_string(),
        description: None,
        constant: false,
    }]);
    let out = engine.bulk_apply("{{sig admin}}", Context::new(), &custom).await;
    assert_eq!(out.text, "-- Ann (admin)");
}

#[tokio::test]
async fn test_single_pass_does_not_revisit_earlier_tiers() {
    // The shell prints "{{get x}}"; get runs before shell, so it stays literal
    let out = engine()
        .bulk_apply(r"{{set x:1}}{{shell:printf '\173\173get x\175\175'}}", Context::new(), &[])
        .await;
    assert_eq!(out.text, "{{get x}}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sandboxed_script() {
    let out = engine()
        .bulk_apply(r#"{{set n:4}}{{js:let n = get_var("n").parse_int(); n * 10}}"#, Context::new(), &[])
        .await;
    assert_eq!(out.text, "40");
}

#[tokio::test]
async fn test_unknown_directive_left_alone() {
    let out = engine().bulk_apply("{{noSuchThing}} {{day}}", Context::new(), &[]).await;
    assert!(out.text.starts_with("{{noSuchThing}} "));
    assert!(!out.text.contains("{{day}}"));
}

proptest! {
    #[test]
    fn prop_text_without_tokens_is_unchanged(text in "[^{]*") {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let out = rt.block_on(engine().bulk_apply(&text, Context::new(), &[]));
        prop_assert_eq!(out.text, text);
        prop_assert!(out.context.is_empty());
    }
}
