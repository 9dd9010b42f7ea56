//! Placeholders - dynamic prompt templates
//!
//! Templates are plain text with `{{directive}}` tokens. Rendering replaces
//! each token with a live value: clipboard text, the frontmost browser tab,
//! calendar events, script output, persistent variables.
//!
//! # Core Concepts
//!
//! - **Tiered single pass**: variable mutations, then reads, then flow
//!   control, scripts and meta directives, each visited once
//! - **Memoized context**: every resolved value lands in a per-call context
//!   map; seeded or already-resolved values are never recomputed
//! - **Failures are empty**: a directive that fails becomes an empty string
//!   and the rest of the template still renders
//!
//! # Modules
//!
//! - [`grammar`] - token grammar and tokenizer
//! - [`engine`] - the substitution algorithm
//! - [`registry`] - built-in directive catalog in precedence tiers
//! - [`directive`] - directive trait and execution environment
//! - [`bridge`] - automation, shell and sandboxed script execution
//! - [`provider`] - desktop state (clipboard, selection, frontmost app)
//! - [`flow`] - file-category flow control
//! - [`custom`] - user-defined placeholders
//! - [`action`] - action scripts run after a response
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod action;
pub mod bridge;
pub mod browser;
pub mod cli;
pub mod config;
pub mod context;
pub mod custom;
pub mod directive;
pub mod directives;
pub mod engine;
pub mod error;
pub mod flow;
pub mod grammar;
pub mod provider;
pub mod registry;

// Re-export commonly used types
pub use action::run_action_script;
pub use bridge::{ExecutionTarget, ScriptBridge};
pub use config::{Config, CustomPlaceholder};
pub use context::Context;
pub use custom::CustomDirective;
pub use directive::{Directive, DirectiveOutput, DirectiveRef, Environment, Scope};
pub use engine::{Substitution, SubstitutionEngine};
pub use error::{ActionScriptFailure, DirectiveError, ProviderError, ScriptError};
pub use provider::{Application, ContextProvider, StaticContextProvider, SystemContextProvider};
pub use registry::{Registry, Tier};
