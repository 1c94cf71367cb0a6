//! Expression evaluation: helper call, literal, or path lookup

use smallvec::SmallVec;

use crate::context::RenderContext;
use crate::error::HelperError;
use crate::helpers::HelperRegistry;
use crate::metrics::EvaluationMetrics;
use crate::value::Value;

use super::ast::Expression;
use super::parser::parse_expression;

/// Evaluate an expression.
///
/// A leading word naming a registered helper makes this a helper call with
/// the remaining words as arguments. Otherwise a single literal evaluates to
/// itself and anything else is resolved as a path, undefined becoming `Null`.
pub fn evaluate(
    expr: &Expression,
    ctx: &RenderContext,
    helpers: &HelperRegistry,
) -> Result<Value, HelperError> {
    if let Some(literal) = &expr.literal {
        return Ok(literal.clone());
    }

    if let Some(helper) = helpers.get(&expr.head) {
        let args: SmallVec<[Value; 4]> = expr.args.iter().map(|arg| arg.resolve(ctx)).collect();
        return helpers.invoke(&helper, &args);
    }

    Ok(ctx.resolve(&expr.source).cloned().unwrap_or_default())
}

/// Evaluate and coerce to a boolean. A failing helper counts as false.
pub fn evaluate_condition(expr: &Expression, ctx: &RenderContext, helpers: &HelperRegistry) -> bool {
    match evaluate(expr, ctx, helpers) {
        Ok(value) => value.is_truthy(),
        Err(e) => {
            EvaluationMetrics::record_helper_failure();
            tracing::warn!(expression = %expr.source, error = %e, "Condition evaluation failed");
            false
        }
    }
}

/// Parse a free-standing condition such as a rule's, with optional `{{ }}`
pub fn parse_condition(condition: &str) -> Expression {
    let trimmed = condition.trim();
    let inner = trimmed
        .strip_prefix("{{")
        .and_then(|rest| rest.strip_suffix("}}"))
        .unwrap_or(trimmed);
    parse_expression(inner)
}
