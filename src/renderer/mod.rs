//! Report rendering.
//!
//! Every section of a compiled template renders in its own task. Results
//! are collected once all tasks finish and assembled by declared `order`,
//! never by completion order. A section that panics becomes a failed,
//! empty entry in the document; its siblings are unaffected.

mod document;
mod validation;
mod visualization;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use uuid::Uuid;

use crate::compiler::{CompiledSection, CompiledTemplate};
use crate::context::RenderContext;
use crate::error::{RenderError, ValidationError};
use crate::helpers::HelperRegistry;
use crate::metrics::RenderMetrics;

pub use document::{DocumentMetadata, RenderedDocument, RenderedSection, RenderedVisualization};
pub use validation::{context_from_json, validate_context, BUSINESS_DATA, ENTERPRISE_DATA, METADATA};
pub use visualization::{PlaceholderVisualizer, VisualizationRenderer};

pub struct ReportRenderer {
    helpers: Arc<HelperRegistry>,
    visualizer: Arc<dyn VisualizationRenderer>,
}

impl ReportRenderer {
    pub fn new(helpers: Arc<HelperRegistry>, visualizer: Arc<dyn VisualizationRenderer>) -> Self {
        Self { helpers, visualizer }
    }

    /// Render every section of `template` against `ctx`
    pub async fn render(
        &self,
        template: &CompiledTemplate,
        ctx: &RenderContext,
    ) -> Result<RenderedDocument, ValidationError> {
        if let Err(e) = validate_context(&template.id, template.tier, ctx) {
            RenderMetrics::record_invalid_context();
            tracing::warn!(template_id = %template.id, error = %e, "Render context rejected");
            return Err(e);
        }

        let started = Instant::now();
        let tasks = template.sections.iter().map(|section| {
            let section = Arc::clone(section);
            let ctx = ctx.clone();
            let helpers = Arc::clone(&self.helpers);
            let visualizer = Arc::clone(&self.visualizer);
            tokio::spawn(async move { render_section(&section, &ctx, &helpers, visualizer.as_ref()).await })
        });
        let results = join_all(tasks).await;

        let mut sections: Vec<RenderedSection> = results
            .into_iter()
            .zip(&template.sections)
            .map(|(result, section)| match result {
                Ok(rendered) => rendered,
                Err(join_error) => {
                    let error = RenderError {
                        template_id: template.id.clone(),
                        section_id: section.id.clone(),
                        cause: join_error.to_string(),
                    };
                    RenderMetrics::record_failed();
                    tracing::error!(
                        template_id = %template.id,
                        section_id = %section.id,
                        error = %error,
                        "Section render failed"
                    );
                    RenderedSection::failed(section, error.to_string())
                }
            })
            .collect();

        // Stable: equal orders keep declaration order
        sections.sort_by_key(|section| section.order);

        let document = assemble(template, sections, started);
        RenderMetrics::record_document();
        tracing::info!(
            template_id = %template.id,
            render_id = %document.metadata.render_id,
            included = document.metadata.included_sections,
            excluded = document.metadata.excluded_section_ids.len(),
            failed = document.metadata.failed_section_ids.len(),
            elapsed_ms = document.metadata.total_render_time_ms,
            "Document rendered"
        );
        Ok(document)
    }
}

async fn render_section(
    section: &CompiledSection,
    ctx: &RenderContext,
    helpers: &HelperRegistry,
    visualizer: &dyn VisualizationRenderer,
) -> RenderedSection {
    if !section.should_include(ctx, helpers) {
        RenderMetrics::record_excluded();
        tracing::debug!(section_id = %section.id, "Section excluded by rules");
        return RenderedSection::excluded(section);
    }

    let started = Instant::now();
    let content = section.render(ctx);
    let elapsed = started.elapsed();
    RenderMetrics::record_included(elapsed.as_secs_f64());

    let mut visualizations = Vec::with_capacity(section.visualizations.len());
    for visualization in &section.visualizations {
        let rendered = match visualizer.render(visualization, ctx).await {
            Ok(content) => RenderedVisualization {
                id: visualization.id.clone(),
                kind: visualization.kind,
                content: Some(content),
                error: None,
            },
            Err(e) => {
                tracing::warn!(
                    section_id = %section.id,
                    visualization_id = %visualization.id,
                    error = %e,
                    "Visualization failed"
                );
                RenderedVisualization {
                    id: visualization.id.clone(),
                    kind: visualization.kind,
                    content: None,
                    error: Some(e.to_string()),
                }
            }
        };
        visualizations.push(rendered);
    }

    RenderedSection {
        id: section.id.clone(),
        title: section.title.clone(),
        section_type: section.section_type,
        order: section.order,
        content,
        included: true,
        render_time_ms: elapsed.as_secs_f64() * 1000.0,
        visualizations,
        error: None,
    }
}

fn assemble(
    template: &CompiledTemplate,
    sections: Vec<RenderedSection>,
    started: Instant,
) -> RenderedDocument {
    let content: String = sections
        .iter()
        .filter(|section| section.included)
        .map(|section| section.content.as_str())
        .collect();

    let excluded_section_ids = sections
        .iter()
        .filter(|section| !section.included && !section.is_failed())
        .map(|section| section.id.clone())
        .collect();
    let failed_section_ids = sections
        .iter()
        .filter(|section| section.is_failed())
        .map(|section| section.id.clone())
        .collect();

    let metadata = DocumentMetadata {
        template_id: template.id.clone(),
        version: template.version.clone(),
        total_sections: sections.len(),
        included_sections: sections.iter().filter(|section| section.included).count(),
        excluded_section_ids,
        failed_section_ids,
        rendered_at: Utc::now(),
        render_id: Uuid::new_v4(),
        total_render_time_ms: started.elapsed().as_secs_f64() * 1000.0,
    };

    RenderedDocument {
        sections,
        content,
        styling: template.styling.clone(),
        metadata,
    }
}
