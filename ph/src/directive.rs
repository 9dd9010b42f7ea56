//! Directive trait and the environment directives run in

use async_trait::async_trait;
use eyre::{Context as _, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use varstore::VariableStore;

use crate::bridge::ScriptBridge;
use crate::config::{Config, NetworkConfig};
use crate::context::Context;
use crate::error::DirectiveError;
use crate::grammar::Token;
use crate::provider::{ContextProvider, SystemContextProvider};
use crate::registry::Registry;

/// What one directive evaluation produced
///
/// `result` replaces the token; `fields` are merged into the context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveOutput {
    pub result: String,
    pub fields: Vec<(String, Value)>,
}

impl DirectiveOutput {
    /// Result text with no context fields
    pub fn text(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            fields: Vec::new(),
        }
    }

    /// Empty replacement, no fields
    pub fn empty() -> Self {
        Self::default()
    }

    /// Result text that is also stored under `key`
    pub fn keyed(key: &str, result: impl Into<String>) -> Self {
        let result = result.into();
        Self {
            fields: vec![(key.to_string(), Value::String(result.clone()))],
            result,
        }
    }

    /// Add a context field
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }
}

/// A named, registered placeholder behavior
///
/// Implementations are immutable once registered. `apply` sees the matched
/// token and the current context, never the whole template.
#[async_trait]
pub trait Directive: Send + Sync {
    /// Name matched against `{{name ...}}`
    fn name(&self) -> &str;

    /// One-line description for listings
    fn description(&self) -> &str {
        ""
    }

    /// Context keys this directive produces; the first is the primary key
    ///
    /// When every key is already in the context the directive is skipped,
    /// and tokens of a directive whose primary key was seeded by the caller
    /// are replaced with the seeded value up front.
    fn result_keys(&self) -> &[&'static str] {
        &[]
    }

    /// Directives whose tokens are resolved before this one's
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    /// Evaluate once and broadcast to every identical token
    fn constant(&self) -> bool {
        false
    }

    async fn apply(&self, token: &Token, scope: &Scope<'_>) -> Result<DirectiveOutput, DirectiveError>;
}

/// Shared directive handle
pub type DirectiveRef = Arc<dyn Directive>;

/// What a directive can see while it runs
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    pub context: &'a Context,
    pub env: &'a Environment,
}

impl<'a> Scope<'a> {
    pub fn new(context: &'a Context, env: &'a Environment) -> Self {
        Self { context, env }
    }
}

/// Long-lived collaborators shared by every substitution call
///
/// Cheap to clone.
#[derive(Clone)]
pub struct Environment {
    registry: Arc<Registry>,
    store: Arc<VariableStore>,
    bridge: ScriptBridge,
    provider: Arc<dyn ContextProvider>,
    http: reqwest::Client,
    network: Arc<NetworkConfig>,
}

impl Environment {
    /// Assemble an environment from explicit collaborators
    pub fn new(config: &Config, store: Arc<VariableStore>, provider: Arc<dyn ContextProvider>) -> Self {
        debug!("Environment::new: called");
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.network.timeout_ms))
            .user_agent(config.network.user_agent.clone())
            .build()
            .unwrap_or_default();

        Self {
            registry: Registry::builtin(),
            store,
            bridge: ScriptBridge::new(config.scripts.clone()),
            provider,
            http,
            network: Arc::new(config.network.clone()),
        }
    }

    /// Environment backed by the configured store file and the system provider
    pub fn from_config(config: &Config) -> Result<Self> {
        debug!(store = %config.store.path.display(), "Environment::from_config: called");
        let store = VariableStore::open(&config.store.path)
            .context(format!("Failed to open variable store {}", config.store.path.display()))?;
        let bridge = ScriptBridge::new(config.scripts.clone());
        let provider = Arc::new(SystemContextProvider::new(bridge));
        Ok(Self::new(config, Arc::new(store), provider))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn bridge(&self) -> &ScriptBridge {
        &self.bridge
    }

    pub fn provider(&self) -> &dyn ContextProvider {
        self.provider.as_ref()
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// In-memory store, static provider, given script settings
    #[cfg(test)]
    pub(crate) fn for_tests(scripts: crate::config::ScriptConfig) -> Self {
        let config = Config {
            scripts,
            ..Default::default()
        };
        Self::new(
            &config,
            Arc::new(VariableStore::in_memory()),
            Arc::new(crate::provider::StaticContextProvider::default()),
        )
    }
}
