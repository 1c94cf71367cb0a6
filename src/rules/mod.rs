//! Conditional section inclusion.
//!
//! Rules are sorted once, when a section is compiled, by descending
//! priority. Equal priorities keep their declared order. At render time the
//! first rule whose condition is truthy decides; with no match the section
//! is included.

use std::cmp::Reverse;

use crate::context::RenderContext;
use crate::helpers::HelperRegistry;
use crate::markup::{evaluate_condition, parse_condition, Expression};
use crate::template::{ConditionalRule, RuleAction};

#[derive(Debug, Clone)]
struct CompiledRule {
    condition: Expression,
    action: RuleAction,
    priority: i32,
}

/// A section's rules in evaluation order
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    pub fn new(rules: &[ConditionalRule]) -> Self {
        let mut compiled: Vec<CompiledRule> = rules
            .iter()
            .map(|rule| CompiledRule {
                condition: parse_condition(&rule.condition),
                action: rule.action,
                priority: rule.priority,
            })
            .collect();
        // sort_by_key is stable
        compiled.sort_by_key(|rule| Reverse(rule.priority));
        Self { rules: compiled }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Decide inclusion for a context
    pub fn evaluate(&self, ctx: &RenderContext, helpers: &HelperRegistry) -> bool {
        for rule in &self.rules {
            if evaluate_condition(&rule.condition, ctx, helpers) {
                tracing::trace!(
                    condition = %rule.condition.source,
                    priority = rule.priority,
                    action = ?rule.action,
                    "Conditional rule matched"
                );
                return rule.action == RuleAction::Include;
            }
        }
        true
    }

    /// Conditions in evaluation order
    pub fn conditions(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.condition.source.as_str())
    }
}
