//! VarStore - durable named variables for placeholder templates
//!
//! Holds two independent families of persistent state behind one
//! string-valued key-value backend:
//!
//! - **Variables**: named records with a current value and the value they
//!   were first created with. `get`/`set`/`reset`/`delete` operate on these.
//!   The record list is ordered by recency: every `set` or `reset` moves the
//!   record to the end.
//! - **Counters**: raw integers under a separate key namespace, driven by
//!   `increment`/`decrement`. A counter that was never written reads as `0`.
//!
//! # Storage layout
//!
//! ```text
//! variables.json
//! {
//!   "--persistent-variables": "[{\"name\":\"x\",\"value\":\"5\",\"initialValue\":\"init\"}]",
//!   "id-visits": "3"
//! }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use varstore::VariableStore;
//!
//! let store = VariableStore::open("variables.json")?;
//! store.set("greeting", "hello")?;
//! assert_eq!(store.get("greeting")?, "hello");
//! assert_eq!(store.increment("visits")?, "1");
//! ```

mod backend;
pub mod cli;
pub mod config;
mod store;

pub use backend::{Backend, JsonFileBackend, MemoryBackend};
pub use store::{PersistentVariable, VariableStore};

/// Backend key holding the serialized variable record list
pub const VARIABLES_KEY: &str = "--persistent-variables";

/// Key prefix for the counter namespace
pub const COUNTER_PREFIX: &str = "id-";
