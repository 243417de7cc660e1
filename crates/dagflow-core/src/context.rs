//! Execution context threaded through a compiled plan: a wire-compatible
//! JSON object mapping node id -> that node's result.

use serde_json::{Map, Value};

use crate::error::TaskError;

/// Accumulated node results for one workflow run.
///
/// Backed by `serde_json::Map` rather than a `HashMap<String, Value>` so the
/// whole context can be serialized as a single JSON object and handed to an
/// out-of-process substrate unchanged (see the wire payload design note).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    entries: Map<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            entries: Map::new(),
        }
    }

    pub fn get(&self, node_id: &str) -> Option<&Value> {
        self.entries.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.entries.contains_key(node_id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn insert(&mut self, node_id: impl Into<String>, value: Value) {
        self.entries.insert(node_id.into(), value);
    }

    /// Fetch one entry, translating a miss into [`TaskError::MissingContextEntry`].
    pub fn require(&self, node_id: &str) -> Result<&Value, TaskError> {
        self.entries
            .get(node_id)
            .ok_or_else(|| TaskError::MissingContextEntry(node_id.to_string()))
    }

    /// Gather `node_ids`, in order, failing on the first one missing from the
    /// context — used to assemble a join node's dependency payload.
    pub fn require_many(&self, node_ids: &[String]) -> Result<Vec<Value>, TaskError> {
        node_ids.iter().map(|id| self.require(id).cloned()).collect()
    }

    /// Gather `depends_on`'s results for `node_id`, in order.
    ///
    /// Unlike [`Context::require_many`], this doesn't fail on the first miss:
    /// it collects every missing id before erroring, so
    /// [`TaskError::MissingDependencyResult`] reports the full picture (all
    /// missing ids plus every id that *is* available) rather than just the
    /// first one encountered. Should be unreachable after `validate_dag` plus
    /// a correct topological order; guards against hand-built or corrupted
    /// plans.
    pub fn require_dependencies(&self, node_id: &str, depends_on: &[String]) -> Result<Vec<Value>, TaskError> {
        let missing: Vec<String> = depends_on.iter().filter(|id| !self.contains(id)).cloned().collect();
        if !missing.is_empty() {
            let mut available: Vec<String> = self.keys().cloned().collect();
            available.sort();
            return Err(TaskError::MissingDependencyResult {
                node_id: node_id.to_string(),
                missing,
                available,
            });
        }
        Ok(depends_on.iter().map(|id| self.entries[id].clone()).collect())
    }

    /// Move the accumulated entries out as a plain JSON object, e.g. to hand
    /// the final context to a caller or serialize it to a log.
    pub fn into_value(self) -> Value {
        Value::Object(self.entries)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }
}
