//! Compile-time performance heuristics

use serde::Serialize;

use crate::template::{Template, Tier};

/// Coarse rendering cost bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
    Extreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PerformanceProfile {
    pub complexity: Complexity,
    pub score: u32,
    pub cacheable: bool,
    pub parallelizable: bool,
}

impl PerformanceProfile {
    /// Score a template: two points per section, three per visualization,
    /// ten for the enterprise tier and five per complex section type.
    pub fn analyze(template: &Template) -> Self {
        let sections = template.sections.len() as u32;
        let visualizations: u32 = template
            .sections
            .iter()
            .map(|section| section.visualizations.len() as u32)
            .sum();
        let complex = template
            .sections
            .iter()
            .filter(|section| section.section_type.is_complex())
            .count() as u32;
        let tier_weight = match template.tier {
            Tier::Enterprise => 10,
            Tier::Professional => 0,
        };

        let score = 2 * sections + 3 * visualizations + tier_weight + 5 * complex;
        let complexity = match score {
            0..=9 => Complexity::Low,
            10..=24 => Complexity::Medium,
            25..=49 => Complexity::High,
            _ => Complexity::Extreme,
        };

        Self {
            complexity,
            score,
            cacheable: complexity != Complexity::Extreme,
            parallelizable: sections > 1 && complexity != Complexity::Extreme,
        }
    }
}
