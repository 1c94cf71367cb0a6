//! Chart rendering collaborator

use async_trait::async_trait;

use crate::context::RenderContext;
use crate::error::VisualizationError;
use crate::template::Visualization;

/// Renders a visualization descriptor to embeddable markup
#[async_trait]
pub trait VisualizationRenderer: Send + Sync {
    async fn render(
        &self,
        visualization: &Visualization,
        ctx: &RenderContext,
    ) -> Result<String, VisualizationError>;
}

/// Emits a placeholder element for a downstream chart service to fill in
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderVisualizer;

#[async_trait]
impl VisualizationRenderer for PlaceholderVisualizer {
    async fn render(
        &self,
        visualization: &Visualization,
        ctx: &RenderContext,
    ) -> Result<String, VisualizationError> {
        let points = visualization
            .data_path
            .as_deref()
            .and_then(|path| ctx.resolve(path))
            .and_then(|data| data.as_array())
            .map_or(0, <[_]>::len);
        let kind = serde_json::to_value(visualization.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        Ok(format!(
            r#"<div class="chart-placeholder" data-chart-id="{}" data-chart-type="{}" data-points="{}">{}</div>"#,
            visualization.id,
            kind,
            points,
            visualization.title.as_deref().unwrap_or_default()
        ))
    }
}
