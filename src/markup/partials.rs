//! Named reusable markup fragments

use std::sync::Arc;

use dashmap::DashMap;

use super::ast::Node;
use super::parser::{parse_with_depth, DEFAULT_MAX_BLOCK_DEPTH};

/// A parsed partial
#[derive(Debug)]
pub struct Partial {
    pub name: String,
    pub source: String,
    nodes: Vec<Node>,
}

impl Partial {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self::with_max_block_depth(name, source, DEFAULT_MAX_BLOCK_DEPTH)
    }

    pub fn with_max_block_depth(
        name: impl Into<String>,
        source: impl Into<String>,
        max_block_depth: usize,
    ) -> Self {
        let source = source.into();
        let nodes = parse_with_depth(&source, max_block_depth);
        Self {
            name: name.into(),
            source,
            nodes,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

/// In-memory partial storage, last write wins
pub struct PartialRegistry {
    partials: DashMap<String, Arc<Partial>>,
    max_block_depth: usize,
}

impl Default for PartialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialRegistry {
    pub fn new() -> Self {
        Self::with_max_block_depth(DEFAULT_MAX_BLOCK_DEPTH)
    }

    pub fn with_max_block_depth(max_block_depth: usize) -> Self {
        Self {
            partials: DashMap::new(),
            max_block_depth,
        }
    }

    /// Parse and store a partial, replacing any previous one with the same name
    pub fn register(&self, name: impl Into<String>, source: impl Into<String>) -> Arc<Partial> {
        let partial = Arc::new(Partial::with_max_block_depth(
            name,
            source,
            self.max_block_depth,
        ));
        if self
            .partials
            .insert(partial.name.clone(), Arc::clone(&partial))
            .is_some()
        {
            tracing::debug!(partial = %partial.name, "Replaced existing partial");
        }
        partial
    }

    pub fn get(&self, name: &str) -> Option<Arc<Partial>> {
        self.partials.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.partials.contains_key(name)
    }

    pub fn remove(&self, name: &str) -> bool {
        self.partials.remove(name).is_some()
    }

    pub fn count(&self) -> usize {
        self.partials.len()
    }

    /// Registered partial names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .partials
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}
