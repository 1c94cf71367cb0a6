// Shared infrastructure
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;

// Data model
pub mod context;
pub mod template;
pub mod value;

// Markup language
pub mod helpers;
pub mod markup;

// Compilation and rendering
pub mod compiler;
pub mod engine;
pub mod renderer;
pub mod rules;

pub use context::RenderContext;
pub use engine::{create_engine, TemplateEngine, TemplateEngineBuilder};
pub use error::{EngineError, Result};
pub use renderer::RenderedDocument;
pub use template::Template;
pub use value::Value;
