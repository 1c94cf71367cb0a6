//! Template compilation.
//!
//! Compiling validates a [`Template`], resolves every section's markup
//! (falling back to the built-in markup of its tier), parses it once and
//! binds a render closure per section. Results are cached by
//! `(id, version)`: compiling the same pair again within the TTL returns the
//! same `Arc` without redoing any work.

mod builtin;
mod profile;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cache::{CacheStats, TtlCache};
use crate::config::{CacheConfig, CompilerConfig};
use crate::context::RenderContext;
use crate::error::{CompilationCause, CompilationError};
use crate::helpers::HelperRegistry;
use crate::markup::MarkupRenderer;
use crate::metrics::CompileMetrics;
use crate::rules::RuleSet;
use crate::template::{Section, SectionType, Styling, Template, Tier, Visualization};

pub use builtin::builtin_markup;
pub use profile::{Complexity, PerformanceProfile};

/// Renders one section's markup against a context
pub type SectionRenderFn = Arc<dyn Fn(&RenderContext) -> String + Send + Sync>;

const UNKNOWN_TEMPLATE_ID: &str = "<unknown>";

/// A section ready to render
pub struct CompiledSection {
    pub id: String,
    pub title: String,
    pub section_type: SectionType,
    pub order: i32,
    pub required: bool,
    pub visualizations: Vec<Visualization>,
    pub rules: RuleSet,
    render: SectionRenderFn,
}

impl CompiledSection {
    pub fn render(&self, ctx: &RenderContext) -> String {
        (self.render)(ctx)
    }

    /// Required sections are always included; others defer to their rules
    pub fn should_include(&self, ctx: &RenderContext, helpers: &HelperRegistry) -> bool {
        self.required || self.rules.evaluate(ctx, helpers)
    }
}

impl fmt::Debug for CompiledSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSection")
            .field("id", &self.id)
            .field("section_type", &self.section_type)
            .field("order", &self.order)
            .field("required", &self.required)
            .field("rules", &self.rules.len())
            .field("visualizations", &self.visualizations.len())
            .finish_non_exhaustive()
    }
}

/// A compiled template, shared between renders
#[derive(Debug)]
pub struct CompiledTemplate {
    pub id: String,
    pub name: String,
    pub version: String,
    pub tier: Tier,
    pub styling: Styling,
    pub sections: Vec<Arc<CompiledSection>>,
    pub profile: PerformanceProfile,
    pub compiled_at: DateTime<Utc>,
}

pub struct Compiler {
    renderer: Arc<MarkupRenderer>,
    cache: TtlCache<String, Arc<CompiledTemplate>>,
    compilations: AtomicU64,
    cache_ttl: Duration,
}

impl Compiler {
    /// Capacity comes from the shared cache settings, entry lifetime from
    /// the compiler's own TTL
    pub fn new(
        renderer: Arc<MarkupRenderer>,
        cache_config: &CacheConfig,
        config: &CompilerConfig,
    ) -> Self {
        Self {
            renderer,
            cache: TtlCache::from_config("compiled_templates", cache_config),
            compilations: AtomicU64::new(0),
            cache_ttl: config.cache_ttl(),
        }
    }

    pub fn renderer(&self) -> &Arc<MarkupRenderer> {
        &self.renderer
    }

    /// Compile a template, or return the cached result for its `(id, version)`
    pub fn compile(&self, template: &Template) -> Result<Arc<CompiledTemplate>, CompilationError> {
        let key = template.cache_key();
        if let Some(compiled) = self.cache.get(&key) {
            CompileMetrics::record_cache_hit();
            tracing::debug!(template_id = %template.id, version = %template.version, "Compiled template cache hit");
            return Ok(compiled);
        }
        CompileMetrics::record_cache_miss();

        let compiled = match self.build(template) {
            Ok(compiled) => Arc::new(compiled),
            Err(cause) => {
                CompileMetrics::record_failure();
                tracing::warn!(template_id = %template.id, error = %cause, "Template compilation failed");
                return Err(CompilationError::new(template.id.clone(), cause));
            }
        };

        self.compilations.fetch_add(1, Ordering::Relaxed);
        CompileMetrics::record_compiled();
        tracing::info!(
            template_id = %compiled.id,
            version = %compiled.version,
            sections = compiled.sections.len(),
            complexity = ?compiled.profile.complexity,
            score = compiled.profile.score,
            "Template compiled"
        );

        self.cache
            .set(key, Arc::clone(&compiled), Some(self.cache_ttl));
        Ok(compiled)
    }

    /// Deserialize and compile an untyped definition
    pub fn compile_json(
        &self,
        definition: serde_json::Value,
    ) -> Result<Arc<CompiledTemplate>, CompilationError> {
        let template_id = definition
            .get("id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(UNKNOWN_TEMPLATE_ID)
            .to_string();

        let template: Template = serde_json::from_value(definition).map_err(|e| {
            CompileMetrics::record_failure();
            CompilationError::new(template_id, CompilationCause::Malformed(e.to_string()))
        })?;
        self.compile(&template)
    }

    /// Number of compilations actually performed, cache hits excluded
    pub fn compile_count(&self) -> u64 {
        self.compilations.load(Ordering::Relaxed)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::debug!("Compiled template cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn build(&self, template: &Template) -> Result<CompiledTemplate, CompilationCause> {
        template.validate()?;

        let sections = template
            .sections
            .iter()
            .map(|section| self.compile_section(template.tier, section).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledTemplate {
            id: template.id.clone(),
            name: template.name.clone(),
            version: template.version.clone(),
            tier: template.tier,
            styling: template.styling.clone(),
            sections,
            profile: PerformanceProfile::analyze(template),
            compiled_at: Utc::now(),
        })
    }

    fn compile_section(
        &self,
        tier: Tier,
        section: &Section,
    ) -> Result<CompiledSection, CompilationCause> {
        let markup = section
            .markup
            .as_deref()
            .or_else(|| builtin_markup(tier, section.section_type))
            .ok_or_else(|| CompilationCause::NoMarkup {
                section_id: section.id.clone(),
                section_type: section.section_type.to_string(),
            })?;

        let nodes = Arc::new(self.renderer.parse(markup));
        let renderer = Arc::clone(&self.renderer);
        let render: SectionRenderFn = Arc::new(move |ctx: &RenderContext| renderer.render(&nodes, ctx));

        Ok(CompiledSection {
            id: section.id.clone(),
            title: section.title.clone(),
            section_type: section.section_type,
            order: section.order,
            required: section.required,
            visualizations: section.visualizations.clone(),
            rules: RuleSet::new(&section.rules),
            render,
        })
    }
}
