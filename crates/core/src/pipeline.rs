//! Named operations and the sequencer that runs them.
//!
//! An [`Operation`] is a name plus an ordered parameter set. Handlers are
//! registered by name in an [`OperationRegistry`] at startup; the
//! [`Sequencer`] runs a list of operations strictly in order and stops at the
//! first non-zero status.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// A boolean option that is switched on (`--all`).
    Flag,
    /// An option or argument carrying a value.
    Value(String),
}

/// Ordered parameters for one operation.
///
/// Keys starting with `--` are options; all other keys are positional
/// arguments, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    entries: Vec<(String, ParamValue)>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, key: &str, value: impl Into<String>) -> Self {
        self.entries
            .push((key.to_string(), ParamValue::Value(value.into())));
        self
    }

    pub fn flag(mut self, key: &str) -> Self {
        self.entries.push((key.to_string(), ParamValue::Flag));
        self
    }

    /// Value of a non-flag parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find_map(|(k, v)| match v {
            ParamValue::Value(s) if k == key => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn has_flag(&self, key: &str) -> bool {
        self.entries
            .iter()
            .any(|(k, v)| k == key && *v == ParamValue::Flag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as command-line arguments.
    ///
    /// Positional values come first in insertion order, then options as
    /// `--key` or `--key=value`.
    pub fn to_args(&self) -> Vec<String> {
        let mut positional = Vec::new();
        let mut options = Vec::new();

        for (key, value) in &self.entries {
            if key.starts_with("--") {
                match value {
                    ParamValue::Flag => options.push(key.clone()),
                    ParamValue::Value(v) => options.push(format!("{key}={v}")),
                }
            } else if let ParamValue::Value(v) = value {
                positional.push(v.clone());
            }
        }

        positional.extend(options);
        positional
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// A named step of the install pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub params: Parameters,
}

impl Operation {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: Parameters::new(),
        }
    }

    pub fn value(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params = self.params.value(key, value);
        self
    }

    pub fn flag(mut self, key: &str) -> Self {
        self.params = self.params.flag(key);
        self
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Runs one named operation and reports an integer status (0 = success).
///
/// `Err` is reserved for failures to run at all (spawn errors, storage
/// errors); a failed run is a non-zero status.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn run(&self, name: &str, params: &Parameters) -> Result<i32, CoreError>;

    /// A directory this operation may delete but that must exist afterwards.
    fn preserved_dir(&self) -> Option<&Path> {
        None
    }
}

/// Explicit map from operation name to handler.
#[derive(Default)]
pub struct OperationRegistry {
    handlers: HashMap<String, Arc<dyn OperationHandler>>,
    fallback: Option<Arc<dyn OperationHandler>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `name`, replacing any previous registration.
    pub fn register(&mut self, name: &str, handler: Arc<dyn OperationHandler>) -> &mut Self {
        self.handlers.insert(name.to_string(), handler);
        self
    }

    /// Handler used for names without an explicit registration.
    pub fn set_fallback(&mut self, handler: Arc<dyn OperationHandler>) -> &mut Self {
        self.fallback = Some(handler);
        self
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn OperationHandler>, CoreError> {
        self.handlers
            .get(name)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| CoreError::UnknownOperation(name.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// Runs operations in order against a registry.
pub struct Sequencer<'a> {
    registry: &'a OperationRegistry,
}

impl<'a> Sequencer<'a> {
    pub fn new(registry: &'a OperationRegistry) -> Self {
        Self { registry }
    }

    /// Run every operation in order.
    ///
    /// Every name is resolved before the first operation starts. Returns the
    /// first non-zero status, or 0 when all succeed. An operation name seen
    /// earlier in the list is re-entered with its own full parameter set.
    pub async fn run(&self, operations: &[Operation]) -> Result<i32, CoreError> {
        let handlers = operations
            .iter()
            .map(|op| self.registry.resolve(&op.name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut executed: HashSet<&str> = HashSet::new();

        for (op, handler) in operations.iter().zip(handlers) {
            if !executed.insert(op.name.as_str()) {
                tracing::debug!(operation = %op.name, "Re-entering operation");
            }

            tracing::info!(operation = %op.name, args = ?op.params.to_args(), "Running operation");
            let status = handler.run(&op.name, &op.params).await?;

            if status != 0 {
                tracing::error!(operation = %op.name, status, "Operation failed");
                return Ok(status);
            }

            if let Some(dir) = handler.preserved_dir() {
                if !dir.is_dir() {
                    tracing::debug!(dir = %dir.display(), "Recreating directory removed by operation");
                    if let Err(e) = std::fs::create_dir_all(dir) {
                        tracing::warn!(dir = %dir.display(), error = %e, "Could not recreate directory");
                    }
                }
            }
        }

        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
