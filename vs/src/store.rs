//! Core VariableStore implementation

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::backend::{Backend, JsonFileBackend, MemoryBackend};
use crate::{COUNTER_PREFIX, VARIABLES_KEY};

/// A named, durable value that remembers what it was created with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVariable {
    /// Unique variable name
    pub name: String,
    /// Current value
    pub value: String,
    /// Value at first creation; never changes afterwards
    pub initial_value: String,
}

/// Persistent variables and counters over a key-value backend
pub struct VariableStore {
    backend: Box<dyn Backend>,
}

impl VariableStore {
    /// Open a store backed by a JSON file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let backend = JsonFileBackend::open(path)?;
        debug!(path = ?backend.path(), "VariableStore::open: called");
        Ok(Self::with_backend(Box::new(backend)))
    }

    /// Create a store that forgets everything when dropped
    pub fn in_memory() -> Self {
        Self::with_backend(Box::new(MemoryBackend::new()))
    }

    /// Create a store over an arbitrary backend
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    fn load(&self) -> Result<Vec<PersistentVariable>> {
        match self.backend.get_item(VARIABLES_KEY)? {
            Some(raw) => serde_json::from_str(&raw).context("Failed to parse persistent variables"),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, vars: &[PersistentVariable]) -> Result<()> {
        let raw = serde_json::to_string(vars)?;
        self.backend.set_item(VARIABLES_KEY, &raw)
    }

    /// Current value of `name`, or an empty string if it does not exist
    pub fn get(&self, name: &str) -> Result<String> {
        debug!(%name, "VariableStore::get: called");
        let value = self
            .load()?
            .into_iter()
            .find(|v| v.name == name)
            .map(|v| v.value)
            .unwrap_or_default();
        Ok(value)
    }

    /// Create or update `name`
    ///
    /// Updating keeps the original initial value and moves the record to the
    /// end of the list.
    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        debug!(%name, value_len = value.len(), "VariableStore::set: called");
        let mut vars = self.load()?;
        let record = match vars.iter().position(|v| v.name == name) {
            Some(index) => {
                debug!("VariableStore::set: updating existing variable");
                let mut existing = vars.remove(index);
                existing.value = value.to_string();
                existing
            }
            None => {
                debug!("VariableStore::set: creating new variable");
                PersistentVariable {
                    name: name.to_string(),
                    value: value.to_string(),
                    initial_value: value.to_string(),
                }
            }
        };
        vars.push(record);
        self.save(&vars)
    }

    /// Restore `name` to its initial value and return it
    ///
    /// Returns an empty string without touching the store if the variable
    /// does not exist.
    pub fn reset(&self, name: &str) -> Result<String> {
        debug!(%name, "VariableStore::reset: called");
        let mut vars = self.load()?;
        let Some(index) = vars.iter().position(|v| v.name == name) else {
            debug!("VariableStore::reset: no such variable");
            return Ok(String::new());
        };

        let mut record = vars.remove(index);
        record.value = record.initial_value.clone();
        let value = record.value.clone();
        vars.push(record);
        self.save(&vars)?;
        Ok(value)
    }

    /// Remove `name` entirely; absent names are ignored
    pub fn delete(&self, name: &str) -> Result<()> {
        debug!(%name, "VariableStore::delete: called");
        let mut vars = self.load()?;
        let before = vars.len();
        vars.retain(|v| v.name != name);
        if vars.len() != before {
            self.save(&vars)?;
            info!(%name, "Deleted variable");
        }
        Ok(())
    }

    /// All variables, least recently set first
    pub fn list(&self) -> Result<Vec<PersistentVariable>> {
        debug!("VariableStore::list: called");
        self.load()
    }

    /// Add one to counter `id` and return the new value
    pub fn increment(&self, id: &str) -> Result<String> {
        debug!(%id, "VariableStore::increment: called");
        self.step_counter(id, 1)
    }

    /// Subtract one from counter `id` and return the new value
    pub fn decrement(&self, id: &str) -> Result<String> {
        debug!(%id, "VariableStore::decrement: called");
        self.step_counter(id, -1)
    }

    /// Current value of counter `id` without changing it
    pub fn counter(&self, id: &str) -> Result<i64> {
        let key = format!("{COUNTER_PREFIX}{id}");
        let raw = self.backend.get_item(&key)?.unwrap_or_else(|| "0".to_string());
        match raw.trim().parse::<i64>() {
            Ok(n) => Ok(n),
            Err(_) => {
                warn!(%id, %raw, "Counter holds a non-numeric value, treating as 0");
                Ok(0)
            }
        }
    }

    fn step_counter(&self, id: &str, delta: i64) -> Result<String> {
        let key = format!("{COUNTER_PREFIX}{id}");
        let next = self.counter(id)?.saturating_add(delta).to_string();
        self.backend.set_item(&key, &next)?;
        Ok(next)
    }
}
