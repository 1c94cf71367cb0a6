//! Render context with copy-on-extend scoping.
//!
//! A context is a chain of immutable scopes shared through `Arc`. Loop
//! iterations and partial calls push a child scope holding only the new
//! bindings, so the caller's context is never mutated and never deep-copied.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::value::Value;

/// Key holding the current `{{#each}}` element
pub const THIS: &str = "this";
/// Zero-based loop index
pub const INDEX: &str = "@index";
/// True on the first loop iteration
pub const FIRST: &str = "@first";
/// True on the last loop iteration
pub const LAST: &str = "@last";

#[derive(Debug)]
struct Scope {
    bindings: BTreeMap<String, Value>,
    parent: Option<Arc<Scope>>,
}

/// Data graph that expressions resolve against
#[derive(Debug, Clone)]
pub struct RenderContext {
    scope: Arc<Scope>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(Value::Map(BTreeMap::new()))
    }
}

impl RenderContext {
    /// Create a root context. A non-object root is bound to `this`.
    pub fn new(data: Value) -> Self {
        let bindings = match data {
            Value::Map(map) => map,
            other => BTreeMap::from([(THIS.to_string(), other)]),
        };
        Self {
            scope: Arc::new(Scope {
                bindings,
                parent: None,
            }),
        }
    }

    pub fn from_json(data: serde_json::Value) -> Self {
        Self::new(Value::from(data))
    }

    /// Look up a top-level key, innermost scope first
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut scope: &Scope = &*self.scope;
        loop {
            if let Some(value) = scope.bindings.get(key) {
                return Some(value);
            }
            match &scope.parent {
                Some(parent) => scope = &**parent,
                None => return None,
            }
        }
    }

    /// Resolve a dotted path. `None` means undefined.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        match path.split_once('.') {
            None => self.get(path),
            Some((head, rest)) => self.get(head)?.get_path(rest),
        }
    }

    /// New context whose bindings override this one's
    pub fn extend<I>(&self, bindings: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        Self {
            scope: Arc::new(Scope {
                bindings: bindings.into_iter().collect(),
                parent: Some(Arc::clone(&self.scope)),
            }),
        }
    }

    /// Context for one `{{#each}}` iteration
    pub fn with_loop_item(&self, item: Value, index: usize, len: usize) -> Self {
        self.extend([
            (THIS.to_string(), item),
            (INDEX.to_string(), Value::from(index)),
            (FIRST.to_string(), Value::Bool(index == 0)),
            (LAST.to_string(), Value::Bool(index + 1 == len)),
        ])
    }

    /// Number of scopes in the chain
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut scope: &Scope = &*self.scope;
        while let Some(parent) = &scope.parent {
            depth += 1;
            scope = &**parent;
        }
        depth
    }
}

impl From<serde_json::Value> for RenderContext {
    fn from(data: serde_json::Value) -> Self {
        Self::from_json(data)
    }
}
