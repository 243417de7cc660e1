//! C3: the DAG builder — add/validate/sink queries, ancestor closure, and
//! the stable topological order the compiler relies on.

use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;

use crate::error::WorkflowError;
use crate::node::WorkflowNode;
use crate::task::TaskDescriptor;

/// A mutable collection of [`WorkflowNode`]s, exclusively owning them.
///
/// Nodes are kept in an insertion-ordered map so that `sinks()` and
/// `topological_order()` are reproducible across runs (property P4):
/// compiling the same workflow twice must yield identical plans.
#[derive(Debug, Clone)]
pub struct Workflow {
    name: String,
    nodes: IndexMap<String, WorkflowNode>,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a node bound to `task`, identified by `node_id`, depending on
    /// `depends_on` in declared order.
    ///
    /// Fails with [`WorkflowError::EmptyNodeId`] if `node_id` is empty,
    /// [`WorkflowError::DuplicateNode`] if `node_id` is already used, or
    /// [`WorkflowError::DuplicateDependency`] if `depends_on` repeats a
    /// parent id.
    pub fn add(
        &mut self,
        task: TaskDescriptor,
        node_id: impl Into<String>,
        depends_on: Vec<String>,
        consume_dependency_results: bool,
    ) -> Result<String, WorkflowError> {
        let node_id = node_id.into();
        if node_id.is_empty() {
            return Err(WorkflowError::EmptyNodeId);
        }
        if self.nodes.contains_key(&node_id) {
            return Err(WorkflowError::DuplicateNode(node_id));
        }

        let mut seen = HashSet::with_capacity(depends_on.len());
        for parent in &depends_on {
            if !seen.insert(parent.clone()) {
                return Err(WorkflowError::DuplicateDependency {
                    node: node_id,
                    parent: parent.clone(),
                });
            }
        }

        let node = WorkflowNode::new(node_id.clone(), task, depends_on, consume_dependency_results);
        self.nodes.insert(node_id.clone(), node);
        Ok(node_id)
    }

    pub fn node(&self, node_id: &str) -> Option<&WorkflowNode> {
        self.nodes.get(node_id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &WorkflowNode> {
        self.nodes.values()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Node ids with no dependents, in insertion order.
    pub fn sinks(&self) -> Vec<String> {
        let mut has_dependents: HashSet<&str> = HashSet::new();
        for node in self.nodes.values() {
            for dep in node.depends_on() {
                has_dependents.insert(dep.as_str());
            }
        }
        self.nodes
            .keys()
            .filter(|id| !has_dependents.contains(id.as_str()))
            .cloned()
            .collect()
    }

    /// True iff any node has two or more parents.
    pub fn uses_join(&self) -> bool {
        self.nodes.values().any(|n| n.depends_on().len() > 1)
    }

    /// Check I1 (no dangling deps), I2 (no self-deps), and I3 (acyclic).
    /// I4 and I5 are enforced at `add` time and never reachable here.
    pub fn validate_dag(&self) -> Result<(), WorkflowError> {
        for node in self.nodes.values() {
            for dep in node.depends_on() {
                if dep == node.node_id() {
                    return Err(WorkflowError::SelfDependency(node.node_id().to_string()));
                }
                if !self.nodes.contains_key(dep) {
                    return Err(WorkflowError::MissingDependency {
                        node: node.node_id().to_string(),
                        missing: dep.clone(),
                    });
                }
            }
        }

        let all: HashSet<String> = self.nodes.keys().cloned().collect();
        self.topological_order(&all)?;
        Ok(())
    }

    /// `{node_id} ∪ ancestors`, following the parent relation transitively.
    pub fn ancestor_closure(&self, node_id: &str) -> Result<HashSet<String>, WorkflowError> {
        if !self.nodes.contains_key(node_id) {
            return Err(WorkflowError::UnknownNode(node_id.to_string()));
        }

        let mut closure = HashSet::new();
        let mut stack = vec![node_id.to_string()];
        closure.insert(node_id.to_string());

        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current.as_str()) {
                for dep in node.depends_on() {
                    if closure.insert(dep.clone()) {
                        stack.push(dep.clone());
                    }
                }
            }
        }

        Ok(closure)
    }

    /// Stable Kahn order over the induced subgraph on `selected`. Among
    /// currently-ready nodes (in-degree 0 within the subgraph), the one
    /// inserted earliest into the workflow goes first.
    ///
    /// Fails with [`WorkflowError::Cycle`] if the induced subgraph is
    /// cyclic — unreachable if `validate_dag` passed first.
    pub fn topological_order(&self, selected: &HashSet<String>) -> Result<Vec<String>, WorkflowError> {
        let mut indegree: IndexMap<String, usize> = IndexMap::with_capacity(selected.len());
        let mut children: IndexMap<String, Vec<String>> = IndexMap::with_capacity(selected.len());

        for id in selected {
            if !self.nodes.contains_key(id.as_str()) {
                return Err(WorkflowError::UnknownNode(id.clone()));
            }
            indegree.insert(id.clone(), 0);
            children.entry(id.clone()).or_default();
        }

        for id in selected {
            let node = self.nodes.get(id.as_str()).expect("checked above");
            for dep in node.depends_on() {
                if selected.contains(dep) {
                    *indegree.get_mut(id).expect("inserted above") += 1;
                    children.get_mut(dep).expect("inserted above").push(id.clone());
                }
            }
        }

        // Ready set ordered by insertion index so ties resolve to "earliest
        // inserted into the workflow" regardless of HashSet iteration order.
        let mut ready: BTreeSet<(usize, String)> = BTreeSet::new();
        for (id, &deg) in &indegree {
            if deg == 0 {
                let idx = self.nodes.get_index_of(id.as_str()).expect("known node");
                ready.insert((idx, id.clone()));
            }
        }

        let mut order = Vec::with_capacity(selected.len());
        while let Some(entry) = ready.iter().next().cloned() {
            ready.remove(&entry);
            let (_, id) = entry;

            for child in &children[&id] {
                let deg = indegree.get_mut(child).expect("known node");
                *deg -= 1;
                if *deg == 0 {
                    let idx = self.nodes.get_index_of(child.as_str()).expect("known node");
                    ready.insert((idx, child.clone()));
                }
            }

            order.push(id);
        }

        if order.len() != selected.len() {
            return Err(WorkflowError::Cycle);
        }

        Ok(order)
    }
}
