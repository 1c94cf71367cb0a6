//! Engine facade.
//!
//! `TemplateEngine` owns one set of registries, a compiler and a renderer.
//! Nothing is global: two engines built with different settings or
//! registries never see each other's helpers, partials or cached templates.

use std::sync::Arc;

use crate::cache::CacheStats;
use crate::compiler::{CompiledTemplate, Compiler};
use crate::config::Settings;
use crate::context::RenderContext;
use crate::error::{HelperError, Result};
use crate::helpers::{FormatDefaults, HelperRegistry};
use crate::markup::{MarkupRenderer, PartialRegistry};
use crate::renderer::{
    context_from_json, PlaceholderVisualizer, RenderedDocument, ReportRenderer,
    VisualizationRenderer,
};
use crate::template::Template;
use crate::value::Value;

pub struct TemplateEngine {
    settings: Arc<Settings>,
    helpers: Arc<HelperRegistry>,
    partials: Arc<PartialRegistry>,
    markup: Arc<MarkupRenderer>,
    compiler: Compiler,
    renderer: ReportRenderer,
}

/// Injects registries and collaborators before the engine is built
pub struct TemplateEngineBuilder {
    settings: Settings,
    helpers: Option<Arc<HelperRegistry>>,
    partials: Option<Arc<PartialRegistry>>,
    visualizer: Option<Arc<dyn VisualizationRenderer>>,
}

impl TemplateEngineBuilder {
    pub fn helpers(mut self, helpers: Arc<HelperRegistry>) -> Self {
        self.helpers = Some(helpers);
        self
    }

    pub fn partials(mut self, partials: Arc<PartialRegistry>) -> Self {
        self.partials = Some(partials);
        self
    }

    pub fn visualizer(mut self, visualizer: Arc<dyn VisualizationRenderer>) -> Self {
        self.visualizer = Some(visualizer);
        self
    }

    pub fn build(self) -> TemplateEngine {
        let settings = self.settings;
        let helpers = self.helpers.unwrap_or_else(|| {
            Arc::new(HelperRegistry::new(FormatDefaults::from(&settings.render)))
        });
        let partials = self.partials.unwrap_or_else(|| {
            Arc::new(PartialRegistry::with_max_block_depth(
                settings.render.max_block_depth,
            ))
        });
        let visualizer = self
            .visualizer
            .unwrap_or_else(|| Arc::new(PlaceholderVisualizer));

        let markup = Arc::new(
            MarkupRenderer::new(
                Arc::clone(&helpers),
                Arc::clone(&partials),
                settings.render.max_partial_depth,
            )
            .with_max_block_depth(settings.render.max_block_depth),
        );
        let compiler = Compiler::new(Arc::clone(&markup), &settings.cache, &settings.compiler);
        let renderer = ReportRenderer::new(Arc::clone(&helpers), visualizer);

        tracing::debug!(
            helpers = helpers.len(),
            partials = partials.count(),
            "Template engine initialized"
        );

        TemplateEngine {
            settings: Arc::new(settings),
            helpers,
            partials,
            markup,
            compiler,
            renderer,
        }
    }
}

impl TemplateEngine {
    pub fn new(settings: Settings) -> Self {
        Self::builder(settings).build()
    }

    /// Build an engine from layered configuration (defaults, config files,
    /// `REPORT_ENGINE__*` environment variables)
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Settings::new()?))
    }

    pub fn builder(settings: Settings) -> TemplateEngineBuilder {
        TemplateEngineBuilder {
            settings,
            helpers: None,
            partials: None,
            visualizer: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn helpers(&self) -> &Arc<HelperRegistry> {
        &self.helpers
    }

    pub fn partials(&self) -> &Arc<PartialRegistry> {
        &self.partials
    }

    /// Register a custom helper, replacing any helper of the same name
    pub fn register_helper<F>(&self, name: impl Into<String>, helper: F)
    where
        F: Fn(&[Value]) -> std::result::Result<Value, HelperError> + Send + Sync + 'static,
    {
        self.helpers.register(name, helper);
    }

    /// Register a partial, replacing any partial of the same name
    pub fn register_partial(&self, name: impl Into<String>, source: impl Into<String>) {
        self.partials.register(name, source);
    }

    pub fn compile(&self, template: &Template) -> Result<Arc<CompiledTemplate>> {
        Ok(self.compiler.compile(template)?)
    }

    pub fn compile_json(&self, definition: serde_json::Value) -> Result<Arc<CompiledTemplate>> {
        Ok(self.compiler.compile_json(definition)?)
    }

    pub async fn render(
        &self,
        template: &CompiledTemplate,
        ctx: &RenderContext,
    ) -> Result<RenderedDocument> {
        Ok(self.renderer.render(template, ctx).await?)
    }

    /// Render against raw JSON data; the root must be an object
    pub async fn render_json(
        &self,
        template: &CompiledTemplate,
        data: serde_json::Value,
    ) -> Result<RenderedDocument> {
        let ctx = context_from_json(data)?;
        self.render(template, &ctx).await
    }

    pub async fn compile_and_render(
        &self,
        template: &Template,
        ctx: &RenderContext,
    ) -> Result<RenderedDocument> {
        let compiled = self.compile(template)?;
        self.render(&compiled, ctx).await
    }

    /// Render an ad-hoc markup string with this engine's helpers and partials
    pub fn render_markup(&self, markup: &str, ctx: &RenderContext) -> String {
        self.markup.render_str(markup, ctx)
    }

    pub fn clear_cache(&self) {
        self.compiler.clear_cache();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.compiler.cache_stats()
    }

    /// Compilations performed so far, cache hits excluded
    pub fn compile_count(&self) -> u64 {
        self.compiler.compile_count()
    }
}

/// Build a shareable engine
pub fn create_engine(settings: Settings) -> Arc<TemplateEngine> {
    Arc::new(TemplateEngine::new(settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use serde_json::json;

    fn template() -> serde_json::Value {
        json!({
            "id": "engine-test",
            "name": "Engine Test",
            "version": "1",
            "tier": "professional",
            "sections": [
                {"id": "intro", "title": "Intro", "type": "custom", "order": 1,
                 "markup": "{{> header}}{{shout business_data.company_name}}"}
            ]
        })
    }

    fn data() -> serde_json::Value {
        json!({"business_data": {"company_name": "acme"}, "metadata": {"title": "Report"}})
    }

    #[tokio::test]
    async fn test_custom_helpers_and_partials() {
        let engine = TemplateEngine::new(Settings::default());
        engine.register_helper("shout", |args| {
            Ok(Value::String(format!(
                "{}!",
                args.first().map(Value::render).unwrap_or_default().to_uppercase()
            )))
        });
        engine.register_partial("header", "<h1>{{metadata.title}}</h1>");

        let compiled = engine.compile_json(template()).unwrap();
        let doc = engine.render_json(&compiled, data()).await.unwrap();
        assert_eq!(doc.content, "<h1>Report</h1>ACME!");
    }

    #[tokio::test]
    async fn test_engines_are_isolated() {
        let first = TemplateEngine::new(Settings::default());
        let second = TemplateEngine::new(Settings::default());
        first.register_partial("header", "first");

        let ctx = RenderContext::default();
        assert_eq!(first.render_markup("{{> header}}", &ctx), "first");
        assert_eq!(second.render_markup("{{> header}}", &ctx), "{{> header}}");

        first.compile_json(template()).unwrap();
        assert_eq!(first.compile_count(), 1);
        assert_eq!(second.compile_count(), 0);
    }

    #[tokio::test]
    async fn test_injected_registries() {
        let helpers = Arc::new(HelperRegistry::new(FormatDefaults {
            locale: "de-DE".to_string(),
            currency: "EUR".to_string(),
        }));
        let engine = TemplateEngine::builder(Settings::default())
            .helpers(Arc::clone(&helpers))
            .build();

        let ctx = RenderContext::from_json(json!({"amount": 1234.5}));
        assert!(Arc::ptr_eq(engine.helpers(), &helpers));
        assert_eq!(engine.render_markup("{{formatCurrency amount}}", &ctx), "1.234,50\u{a0}€");
    }

    #[tokio::test]
    async fn test_render_json_rejects_non_object() {
        let engine = TemplateEngine::new(Settings::default());
        let compiled = engine.compile_json(template()).unwrap();

        let err = engine.render_json(&compiled, json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_from_env_uses_layered_settings() {
        let engine = TemplateEngine::from_env().unwrap();
        assert!(engine.settings().render.max_block_depth > 0);
    }

    #[test]
    fn test_render_settings_reach_markup() {
        let mut settings = Settings::default();
        settings.render.max_block_depth = 2;
        let engine = TemplateEngine::new(settings);
        engine.register_partial("deep", "{{#if t}}{{#if t}}{{#if t}}x{{/if}}{{/if}}{{/if}}");

        let ctx = RenderContext::from_json(json!({"t": true}));
        assert_eq!(engine.render_markup("{{> deep}}", &ctx), "{{#if t}}x{{/if}}");
        assert_eq!(
            engine.render_markup("a {{formatNumber 1 70000}} b", &ctx),
            format!("a 1.{} b", "0".repeat(20))
        );
    }

    #[test]
    fn test_cache_settings_size_compiled_cache() {
        let mut settings = Settings::default();
        settings.cache.max_size = 2;
        let engine = TemplateEngine::new(settings);

        for id in ["a", "b", "c"] {
            let mut definition = template();
            definition["id"] = json!(id);
            engine.compile_json(definition).unwrap();
        }

        let stats = engine.cache_stats();
        assert_eq!(stats.max_size, 2);
        assert_eq!(stats.evictions, 1);
    }

    #[test]
    fn test_compile_error_surfaces_through_facade() {
        let engine = create_engine(Settings::default());
        let mut definition = template();
        definition["sections"] = json!([]);

        match engine.compile_json(definition) {
            Err(EngineError::Compilation(e)) => assert_eq!(e.template_id, "engine-test"),
            other => panic!("expected compilation error, got {:?}", other.map(|c| c.id.clone())),
        }
    }
}
