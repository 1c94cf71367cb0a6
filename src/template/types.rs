//! Template, section and rule types

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CompilationCause;

/// Subscription tier a template targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Professional,
    Enterprise,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Professional => write!(f, "professional"),
            Tier::Enterprise => write!(f, "enterprise"),
        }
    }
}

/// Kinds of report section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    ExecutiveSummary,
    CompanyOverview,
    FinancialAnalysis,
    ValuationSummary,
    ValuationMethods,
    MarketAnalysis,
    RiskAssessment,
    IndustryBenchmarks,
    ScenarioAnalysis,
    Recommendations,
    Appendix,
    Custom,
}

impl SectionType {
    /// Section kinds that weigh on the compile-time performance profile
    pub fn is_complex(self) -> bool {
        matches!(
            self,
            SectionType::FinancialAnalysis
                | SectionType::ValuationMethods
                | SectionType::ScenarioAnalysis
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SectionType::ExecutiveSummary => "executive_summary",
            SectionType::CompanyOverview => "company_overview",
            SectionType::FinancialAnalysis => "financial_analysis",
            SectionType::ValuationSummary => "valuation_summary",
            SectionType::ValuationMethods => "valuation_methods",
            SectionType::MarketAnalysis => "market_analysis",
            SectionType::RiskAssessment => "risk_assessment",
            SectionType::IndustryBenchmarks => "industry_benchmarks",
            SectionType::ScenarioAnalysis => "scenario_analysis",
            SectionType::Recommendations => "recommendations",
            SectionType::Appendix => "appendix",
            SectionType::Custom => "custom",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a matching rule does to its section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Include,
    Exclude,
}

/// Business rule deciding whether a section appears
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    /// Expression evaluated for truthiness, e.g. `gt business_data.revenue 1000000`
    pub condition: String,

    pub action: RuleAction,

    /// Higher priorities are evaluated first
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationKind {
    Bar,
    Line,
    Pie,
    Area,
    Scatter,
    Waterfall,
    Table,
}

/// Chart attached to a section, rendered by an external collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visualization {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: VisualizationKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Context path holding the chart's data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_path: Option<String>,

    /// Collaborator-specific options, passed through untouched
    #[serde(default)]
    pub options: serde_json::Value,
}

/// One addressable unit of report content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,

    pub title: String,

    #[serde(rename = "type")]
    pub section_type: SectionType,

    /// Position in the assembled document
    #[serde(default)]
    pub order: i32,

    /// Required sections are rendered regardless of rules
    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub rules: Vec<ConditionalRule>,

    /// Markup body; built-in markup for the section type is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,

    #[serde(default)]
    pub visualizations: Vec<Visualization>,
}

/// Document-wide styling defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Styling {
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_primary_color")]
    pub primary_color: String,
    #[serde(default = "default_secondary_color")]
    pub secondary_color: String,
    #[serde(default = "default_page_size")]
    pub page_size: String,
}

fn default_font_family() -> String {
    "Inter, sans-serif".to_string()
}

fn default_primary_color() -> String {
    "#1f3a5f".to_string()
}

fn default_secondary_color() -> String {
    "#4a90d9".to_string()
}

fn default_page_size() -> String {
    "A4".to_string()
}

impl Default for Styling {
    fn default() -> Self {
        Self {
            font_family: default_font_family(),
            primary_color: default_primary_color(),
            secondary_color: default_secondary_color(),
            page_size: default_page_size(),
        }
    }
}

/// A report template definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,

    pub name: String,

    pub version: String,

    pub tier: Tier,

    pub sections: Vec<Section>,

    #[serde(default)]
    pub styling: Styling,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Template {
    /// Check the structural invariants compilation relies on
    pub fn validate(&self) -> Result<(), CompilationCause> {
        if self.id.trim().is_empty() {
            return Err(CompilationCause::MissingId);
        }

        if self.name.trim().is_empty() {
            return Err(CompilationCause::MissingName);
        }

        if self.version.trim().is_empty() {
            return Err(CompilationCause::MissingVersion);
        }

        if self.sections.is_empty() {
            return Err(CompilationCause::NoSections);
        }

        let mut seen = HashSet::with_capacity(self.sections.len());
        for (position, section) in self.sections.iter().enumerate() {
            if section.id.trim().is_empty() {
                return Err(CompilationCause::MissingSectionId(position));
            }
            if section.title.trim().is_empty() {
                return Err(CompilationCause::MissingSectionTitle(section.id.clone()));
            }
            if !seen.insert(section.id.as_str()) {
                return Err(CompilationCause::DuplicateSectionId(section.id.clone()));
            }
        }

        Ok(())
    }

    /// Cache key for compiled output
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.id, self.version)
    }
}
