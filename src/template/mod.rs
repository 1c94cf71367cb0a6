//! Report template definitions.
//!
//! A template is a named, versioned, tier-scoped list of sections. Each
//! section carries its own markup (or falls back to built-in markup for its
//! type), its conditional rules and its visualization descriptors.
//!
//! # Example
//!
//! ```ignore
//! let template: Template = serde_json::from_value(json!({
//!     "id": "valuation-pro",
//!     "name": "Professional Valuation",
//!     "version": "1.0.0",
//!     "tier": "professional",
//!     "sections": [
//!         {"id": "summary", "title": "Summary", "type": "executive_summary", "order": 1, "required": true}
//!     ]
//! }))?;
//! template.validate()?;
//! ```

mod types;

pub use types::{
    ConditionalRule, RuleAction, Section, SectionType, Styling, Template, Tier, Visualization,
    VisualizationKind,
};
