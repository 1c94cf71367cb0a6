//! Rendered output types

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::compiler::CompiledSection;
use crate::template::{SectionType, Styling, VisualizationKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedVisualization {
    pub id: String,
    pub kind: VisualizationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSection {
    pub id: String,
    pub title: String,
    pub section_type: SectionType,
    pub order: i32,
    pub content: String,
    pub included: bool,
    /// Time spent in the section's markup, in milliseconds
    pub render_time_ms: f64,
    pub visualizations: Vec<RenderedVisualization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RenderedSection {
    /// Zero-content entry for a section whose rules excluded it
    pub(crate) fn excluded(section: &CompiledSection) -> Self {
        Self::empty(section, None)
    }

    /// Zero-content entry for a section whose render failed
    pub(crate) fn failed(section: &CompiledSection, error: String) -> Self {
        Self::empty(section, Some(error))
    }

    fn empty(section: &CompiledSection, error: Option<String>) -> Self {
        Self {
            id: section.id.clone(),
            title: section.title.clone(),
            section_type: section.section_type,
            order: section.order,
            content: String::new(),
            included: false,
            render_time_ms: 0.0,
            visualizations: Vec::new(),
            error,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentMetadata {
    pub template_id: String,
    pub version: String,
    pub total_sections: usize,
    pub included_sections: usize,
    pub excluded_section_ids: Vec<String>,
    pub failed_section_ids: Vec<String>,
    pub rendered_at: DateTime<Utc>,
    pub render_id: Uuid,
    pub total_render_time_ms: f64,
}

/// A fully rendered report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDocument {
    /// Every section in ascending `order`, excluded and failed ones included
    pub sections: Vec<RenderedSection>,
    /// Included sections' content, concatenated in section order
    pub content: String,
    pub styling: Styling,
    pub metadata: DocumentMetadata,
}

impl RenderedDocument {
    pub fn section(&self, id: &str) -> Option<&RenderedSection> {
        self.sections.iter().find(|section| section.id == id)
    }

    pub fn included(&self) -> impl Iterator<Item = &RenderedSection> {
        self.sections.iter().filter(|section| section.included)
    }
}
