//! Render context checks

use crate::context::RenderContext;
use crate::error::ValidationError;
use crate::template::Tier;
use crate::value::Value;

pub const BUSINESS_DATA: &str = "business_data";
pub const METADATA: &str = "metadata";
pub const ENTERPRISE_DATA: &str = "enterprise_data";

fn present(ctx: &RenderContext, key: &str) -> bool {
    ctx.get(key).is_some_and(|value| !value.is_null())
}

/// Ensure the context carries the data every template of `tier` reads
pub fn validate_context(
    template_id: &str,
    tier: Tier,
    ctx: &RenderContext,
) -> Result<(), ValidationError> {
    if !present(ctx, BUSINESS_DATA) {
        return Err(ValidationError::MissingBusinessData(BUSINESS_DATA));
    }
    if !present(ctx, METADATA) {
        return Err(ValidationError::MissingMetadata(METADATA));
    }
    if tier == Tier::Enterprise && !present(ctx, ENTERPRISE_DATA) {
        return Err(ValidationError::MissingEnterpriseData(template_id.to_string()));
    }
    Ok(())
}

/// Build a context from raw JSON, rejecting non-object roots
pub fn context_from_json(data: serde_json::Value) -> Result<RenderContext, ValidationError> {
    match Value::from(data) {
        root @ Value::Map(_) => Ok(RenderContext::new(root)),
        _ => Err(ValidationError::NotAnObject),
    }
}
