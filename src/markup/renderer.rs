//! Tree-walking interpreter for parsed markup

use std::sync::Arc;

use crate::context::RenderContext;
use crate::helpers::HelperRegistry;
use crate::metrics::EvaluationMetrics;
use crate::value::Value;

use super::ast::{Arg, Node};
use super::evaluator::{evaluate, evaluate_condition};
use super::parser::{parse_with_depth, DEFAULT_MAX_BLOCK_DEPTH};
use super::partials::PartialRegistry;

/// Renders node trees against a context.
///
/// Rendering is infallible: every token-level failure is logged and
/// resolved locally, so one bad tag never loses a section.
pub struct MarkupRenderer {
    helpers: Arc<HelperRegistry>,
    partials: Arc<PartialRegistry>,
    max_partial_depth: usize,
    max_block_depth: usize,
}

/// Nesting reached so far, counted across partial boundaries
#[derive(Debug, Clone, Copy, Default)]
struct Depth {
    partials: usize,
    blocks: usize,
}

impl Depth {
    fn block(self) -> Self {
        Self {
            blocks: self.blocks + 1,
            ..self
        }
    }

    fn partial(self) -> Self {
        Self {
            partials: self.partials + 1,
            ..self
        }
    }
}

impl MarkupRenderer {
    pub fn new(
        helpers: Arc<HelperRegistry>,
        partials: Arc<PartialRegistry>,
        max_partial_depth: usize,
    ) -> Self {
        Self {
            helpers,
            partials,
            max_partial_depth,
            max_block_depth: DEFAULT_MAX_BLOCK_DEPTH,
        }
    }

    /// Cap on `#if` / `#each` nesting, both when parsing and when blocks
    /// stack up through partials
    pub fn with_max_block_depth(mut self, max_block_depth: usize) -> Self {
        self.max_block_depth = max_block_depth;
        self
    }

    pub fn max_block_depth(&self) -> usize {
        self.max_block_depth
    }

    /// Parse markup with this renderer's nesting cap
    pub fn parse(&self, source: &str) -> Vec<Node> {
        parse_with_depth(source, self.max_block_depth)
    }

    pub fn helpers(&self) -> &Arc<HelperRegistry> {
        &self.helpers
    }

    pub fn partials(&self) -> &Arc<PartialRegistry> {
        &self.partials
    }

    pub fn render(&self, nodes: &[Node], ctx: &RenderContext) -> String {
        let mut out = String::new();
        self.render_nodes(nodes, ctx, Depth::default(), &mut out);
        out
    }

    /// Parse and render in one step
    pub fn render_str(&self, source: &str, ctx: &RenderContext) -> String {
        self.render(&self.parse(source), ctx)
    }

    /// Blocks that would push nesting past the cap render nothing
    fn enter_block(&self, depth: Depth) -> Option<Depth> {
        if depth.blocks >= self.max_block_depth {
            EvaluationMetrics::record_depth_exceeded();
            tracing::warn!(
                max_depth = self.max_block_depth,
                "Block nesting through partials too deep, block skipped"
            );
            return None;
        }
        Some(depth.block())
    }

    fn render_nodes(&self, nodes: &[Node], ctx: &RenderContext, depth: Depth, out: &mut String) {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Expression { raw, expr } => match evaluate(expr, ctx, &self.helpers) {
                    Ok(value) => out.push_str(&value.render()),
                    Err(e) => {
                        EvaluationMetrics::record_helper_failure();
                        tracing::warn!(expression = %expr.source, error = %e, "Expression left unresolved");
                        out.push_str(raw);
                    }
                },
                Node::If {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    let Some(depth) = self.enter_block(depth) else {
                        continue;
                    };
                    let branch = if evaluate_condition(condition, ctx, &self.helpers) {
                        then_branch
                    } else {
                        else_branch
                    };
                    self.render_nodes(branch, ctx, depth, out);
                }
                Node::Each {
                    source,
                    body,
                    else_branch,
                } => {
                    let Some(depth) = self.enter_block(depth) else {
                        continue;
                    };
                    match evaluate(source, ctx, &self.helpers) {
                        Ok(Value::Array(items)) if !items.is_empty() => {
                            let len = items.len();
                            for (index, item) in items.into_iter().enumerate() {
                                let scoped = ctx.with_loop_item(item, index, len);
                                self.render_nodes(body, &scoped, depth, out);
                            }
                        }
                        Ok(_) => self.render_nodes(else_branch, ctx, depth, out),
                        Err(e) => {
                            EvaluationMetrics::record_helper_failure();
                            tracing::warn!(expression = %source.source, error = %e, "Each source evaluation failed");
                            self.render_nodes(else_branch, ctx, depth, out);
                        }
                    }
                }
                Node::Partial { raw, name, args } => {
                    self.render_partial(raw, name, args, ctx, depth, out)
                }
            }
        }
    }

    fn render_partial(
        &self,
        raw: &str,
        name: &str,
        args: &[(String, Arg)],
        ctx: &RenderContext,
        depth: Depth,
        out: &mut String,
    ) {
        if depth.partials >= self.max_partial_depth {
            EvaluationMetrics::record_depth_exceeded();
            tracing::warn!(
                partial = %name,
                max_depth = self.max_partial_depth,
                "Partial nesting too deep, left unexpanded"
            );
            out.push_str(raw);
            return;
        }

        let Some(partial) = self.partials.get(name) else {
            EvaluationMetrics::record_missing_partial();
            tracing::warn!(partial = %name, "Partial not found");
            out.push_str(raw);
            return;
        };

        // Arguments resolve against the caller's context
        let scoped = if args.is_empty() {
            ctx.clone()
        } else {
            ctx.extend(
                args.iter()
                    .map(|(key, arg)| (key.clone(), arg.resolve(ctx)))
                    .collect::<Vec<_>>(),
            )
        };
        self.render_nodes(partial.nodes(), &scoped, depth.partial(), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HelperError;
    use serde_json::json;

    fn renderer() -> MarkupRenderer {
        MarkupRenderer::new(
            Arc::new(HelperRegistry::default()),
            Arc::new(PartialRegistry::new()),
            8,
        )
    }

    fn render(source: &str, data: serde_json::Value) -> String {
        renderer().render_str(source, &RenderContext::from_json(data))
    }

    #[test]
    fn test_each_concatenates_in_order() {
        assert_eq!(
            render("{{#each items}}{{this}}{{/each}}", json!({"items": [1, 2, 3]})),
            "123"
        );
    }

    #[test]
    fn test_each_empty_or_not_array() {
        assert_eq!(render("{{#each items}}{{this}}{{/each}}", json!({"items": []})), "");
        assert_eq!(render("{{#each items}}{{this}}{{/each}}", json!({"items": "abc"})), "");
        assert_eq!(render("{{#each items}}{{this}}{{/each}}", json!({})), "");
        assert_eq!(
            render("{{#each items}}x{{else}}none{{/each}}", json!({"items": []})),
            "none"
        );
    }

    #[test]
    fn test_each_loop_fields() {
        let out = render(
            "{{#each owners}}{{@index}}:{{this.name}}{{#if @first}}(first){{/if}}{{#if @last}}(last){{/if}};{{/each}}",
            json!({"owners": [{"name": "Ada"}, {"name": "Bo"}, {"name": "Cy"}]}),
        );
        assert_eq!(out, "0:Ada(first);1:Bo;2:Cy(last);");
    }

    #[test]
    fn test_nested_each_shadows_this() {
        let out = render(
            "{{#each groups}}[{{#each this.items}}{{this}}{{/each}}]{{/each}}",
            json!({"groups": [{"items": [1, 2]}, {"items": [3]}]}),
        );
        assert_eq!(out, "[12][3]");
    }

    #[test]
    fn test_if_truthiness() {
        assert_eq!(render("{{#if 0}}X{{/if}}", json!({})), "");
        assert_eq!(render("{{#if \"a\"}}X{{/if}}", json!({})), "X");
        assert_eq!(render("{{#if list}}X{{/if}}", json!({"list": []})), "");
        assert_eq!(render("{{#if obj}}X{{/if}}", json!({"obj": {}})), "");
        assert_eq!(render("{{#if obj}}X{{/if}}", json!({"obj": {"a": 1}})), "X");
        assert_eq!(render("{{#if missing}}X{{else}}Y{{/if}}", json!({})), "Y");
    }

    #[test]
    fn test_if_with_helper_condition() {
        let out = render(
            r#"{{#if eq tier "enterprise"}}E{{else}}P{{/if}}"#,
            json!({"tier": "enterprise"}),
        );
        assert_eq!(out, "E");
    }

    #[test]
    fn test_deep_nesting() {
        let depth = 50;
        let source = format!("{}x{}", "{{#if t}}".repeat(depth), "{{/if}}".repeat(depth));
        assert_eq!(render(&source, json!({"t": true})), "x");
    }

    #[test]
    fn test_block_depth_boundary() {
        let renderer = renderer().with_max_block_depth(4);
        let ctx = RenderContext::from_json(json!({"t": true}));

        let at_cap = format!("{}x{}", "{{#if t}}".repeat(4), "{{/if}}".repeat(4));
        assert_eq!(renderer.render_str(&at_cap, &ctx), "x");

        let past_cap = format!("{}x{}", "{{#if t}}".repeat(5), "{{/if}}".repeat(5));
        assert_eq!(
            renderer.render_str(&past_cap, &ctx),
            "{{#if t}}x{{/if}}"
        );
    }

    #[test]
    fn test_block_depth_counts_through_partials() {
        let renderer = renderer().with_max_block_depth(3);
        renderer
            .partials()
            .register("inner", "{{#if t}}{{#if t}}deep{{/if}}{{/if}}");
        let ctx = RenderContext::from_json(json!({"t": true}));

        assert_eq!(renderer.render_str("[{{> inner}}]", &ctx), "[deep]");
        assert_eq!(
            renderer.render_str("[{{#if t}}{{#if t}}{{> inner}}{{/if}}{{/if}}]", &ctx),
            "[]"
        );
    }

    #[test]
    fn test_undefined_renders_empty() {
        assert_eq!(render("[{{nothing.here}}]", json!({})), "[]");
    }

    #[test]
    fn test_failing_helper_leaves_tag() {
        let renderer = renderer();
        renderer.helpers().register("boom", |_| {
            Err(HelperError::Custom {
                name: "boom".to_string(),
                message: "exploded".to_string(),
            })
        });
        let out = renderer.render_str("a {{boom 1}} b {{uppercase \"ok\"}}", &RenderContext::default());
        assert_eq!(out, "a {{boom 1}} b OK");
    }

    #[test]
    fn test_missing_partial_left_verbatim() {
        assert_eq!(render("before {{> missing}} after", json!({})), "before {{> missing}} after");
    }

    #[test]
    fn test_partial_with_arguments() {
        let renderer = renderer();
        renderer
            .partials()
            .register("kpi", r#"<b>{{label}}</b>={{formatCurrency value}}"#);

        let ctx = RenderContext::from_json(json!({"business_data": {"revenue": 1500}}));
        let out = renderer.render_str(
            r#"{{> kpi label="Revenue" value=business_data.revenue}}"#,
            &ctx,
        );
        assert_eq!(out, "<b>Revenue</b>=$1,500.00");
        // caller context untouched
        assert_eq!(ctx.resolve("label"), None);
    }

    #[test]
    fn test_partial_sees_caller_context_and_nests() {
        let renderer = renderer();
        renderer.partials().register("inner", "{{company}}");
        renderer
            .partials()
            .register("outer", "<{{#each rows}}{{> inner company=this}}{{/each}}>");

        let ctx = RenderContext::from_json(json!({"rows": ["a", "b"]}));
        assert_eq!(renderer.render_str("{{> outer}}", &ctx), "<ab>");
    }

    #[test]
    fn test_recursive_partial_is_bounded() {
        let renderer = renderer();
        renderer.partials().register("loop", "x{{> loop}}");

        let out = renderer.render_str("{{> loop}}", &RenderContext::default());
        assert_eq!(out, format!("{}{{{{> loop}}}}", "x".repeat(8)));
    }
}
