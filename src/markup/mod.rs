//! Report markup language.
//!
//! Supported tags:
//! - `{{path.to.value}}` and `{{helper arg1 "literal" 2}}`
//! - `{{#if cond}}...{{else}}...{{/if}}`
//! - `{{#each path}}...{{else}}...{{/each}}` with `this`, `@index`, `@first`, `@last`
//! - `{{> partial key=path key2="literal"}}`
//!
//! Markup is parsed once into a node tree and interpreted in a single walk.
//! `#if` / `#each` nesting is capped, also when blocks stack up through
//! partials.
//!
//! # Example
//!
//! ```ignore
//! let renderer = MarkupRenderer::new(helpers, partials, 32);
//! let ctx = RenderContext::from_json(json!({"items": [1, 2, 3]}));
//! assert_eq!(renderer.render_str("{{#each items}}{{this}}{{/each}}", &ctx), "123");
//! ```

mod ast;
mod evaluator;
mod parser;
mod partials;
mod renderer;

pub use ast::{Arg, Expression, Node};
pub use evaluator::{evaluate, evaluate_condition, parse_condition};
pub use parser::{parse, parse_expression, parse_with_depth, DEFAULT_MAX_BLOCK_DEPTH};
pub use partials::{Partial, PartialRegistry};
pub use renderer::MarkupRenderer;
