//! Helper registry.
//!
//! Helpers are pure functions over positional arguments, callable from
//! `{{name arg1 arg2}}` expressions and from `{{#if}}` / rule conditions.
//! Built-ins are a closed enum; anything registered at runtime is wrapped
//! in the `Custom` variant.
//!
//! # Example
//!
//! ```ignore
//! let helpers = HelperRegistry::new(FormatDefaults::default());
//! helpers.register("initials", |args| {
//!     let name = args.first().map(Value::render).unwrap_or_default();
//!     Ok(Value::String(name.split_whitespace().filter_map(|w| w.chars().next()).collect()))
//! });
//! ```

mod builtin;
pub mod format;

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::config::RenderConfig;
use crate::error::HelperError;
use crate::value::Value;

pub use builtin::BuiltinHelper;

/// Signature of a user-supplied helper
pub type HelperFn = dyn Fn(&[Value]) -> Result<Value, HelperError> + Send + Sync;

/// Locale and currency used when a formatting helper gets no explicit one
#[derive(Debug, Clone)]
pub struct FormatDefaults {
    pub locale: String,
    pub currency: String,
}

impl Default for FormatDefaults {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            currency: "USD".to_string(),
        }
    }
}

impl From<&RenderConfig> for FormatDefaults {
    fn from(config: &RenderConfig) -> Self {
        Self {
            locale: config.default_locale.clone(),
            currency: config.default_currency.clone(),
        }
    }
}

/// A registered helper
#[derive(Clone)]
pub enum Helper {
    Builtin(BuiltinHelper),
    Custom(Arc<HelperFn>),
}

impl fmt::Debug for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Helper::Builtin(kind) => f.debug_tuple("Builtin").field(kind).finish(),
            Helper::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Name -> helper mapping, last write wins
pub struct HelperRegistry {
    helpers: DashMap<String, Helper>,
    defaults: FormatDefaults,
}

impl Default for HelperRegistry {
    fn default() -> Self {
        Self::new(FormatDefaults::default())
    }
}

impl HelperRegistry {
    /// Create a registry preloaded with every built-in helper
    pub fn new(defaults: FormatDefaults) -> Self {
        let registry = Self::empty(defaults);
        for kind in BuiltinHelper::ALL {
            registry
                .helpers
                .insert(kind.name().to_string(), Helper::Builtin(kind));
        }
        registry
    }

    /// Create a registry without built-ins
    pub fn empty(defaults: FormatDefaults) -> Self {
        Self {
            helpers: DashMap::new(),
            defaults,
        }
    }

    /// Register a custom helper, replacing any helper with the same name
    pub fn register<F>(&self, name: impl Into<String>, helper: F)
    where
        F: Fn(&[Value]) -> Result<Value, HelperError> + Send + Sync + 'static,
    {
        let name = name.into();
        if self
            .helpers
            .insert(name.clone(), Helper::Custom(Arc::new(helper)))
            .is_some()
        {
            tracing::debug!(helper = %name, "Replaced existing helper");
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Helper> {
        self.helpers.get(name).map(|entry| entry.value().clone())
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.helpers.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }

    pub fn defaults(&self) -> &FormatDefaults {
        &self.defaults
    }

    /// Invoke a helper by name. `None` if no helper has that name.
    pub fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, HelperError>> {
        // No shard lock may be held while a custom helper runs
        let helper = self.get(name)?;
        Some(self.invoke(&helper, args))
    }

    /// Invoke an already looked-up helper
    pub fn invoke(&self, helper: &Helper, args: &[Value]) -> Result<Value, HelperError> {
        match helper {
            Helper::Builtin(kind) => kind.call(args, &self.defaults),
            Helper::Custom(f) => f(args),
        }
    }
}
