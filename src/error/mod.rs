//! Error taxonomy for compilation, context validation and section rendering.
//!
//! Token-level failures (a bad helper call, a missing partial) never reach
//! this module's fatal types; they are recovered where they happen.

use thiserror::Error;

/// Why a template failed to compile
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilationCause {
    #[error("template id is empty")]
    MissingId,

    #[error("template name is empty")]
    MissingName,

    #[error("template version is empty")]
    MissingVersion,

    #[error("template has no sections")]
    NoSections,

    #[error("section at position {0} has an empty id")]
    MissingSectionId(usize),

    #[error("section '{0}' has an empty title")]
    MissingSectionTitle(String),

    #[error("duplicate section id '{0}'")]
    DuplicateSectionId(String),

    #[error("section '{section_id}' has no markup and no built-in markup exists for type '{section_type}'")]
    NoMarkup {
        section_id: String,
        section_type: String,
    },

    #[error("malformed template definition: {0}")]
    Malformed(String),
}

/// Fatal: the template definition is structurally invalid
#[derive(Debug, Clone, Error)]
#[error("Compilation of template '{template_id}' failed: {cause}")]
pub struct CompilationError {
    pub template_id: String,
    #[source]
    pub cause: CompilationCause,
}

impl CompilationError {
    pub fn new(template_id: impl Into<String>, cause: CompilationCause) -> Self {
        Self {
            template_id: template_id.into(),
            cause,
        }
    }
}

/// Fatal for one render call: the context lacks data the template needs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Render context is missing business data ('{0}')")]
    MissingBusinessData(&'static str),

    #[error("Render context is missing metadata ('{0}')")]
    MissingMetadata(&'static str),

    #[error("Enterprise template '{0}' requires enterprise data in the render context")]
    MissingEnterpriseData(String),

    #[error("Render context root must be an object")]
    NotAnObject,
}

/// A single section failed; siblings are unaffected
#[derive(Debug, Clone, Error)]
#[error("Rendering section '{section_id}' of template '{template_id}' failed: {cause}")]
pub struct RenderError {
    pub template_id: String,
    pub section_id: String,
    pub cause: String,
}

/// The visualization collaborator could not render a chart
#[derive(Debug, Clone, Error)]
#[error("Visualization '{visualization_id}' failed: {message}")]
pub struct VisualizationError {
    pub visualization_id: String,
    pub message: String,
}

impl VisualizationError {
    pub fn new(visualization_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            visualization_id: visualization_id.into(),
            message: message.into(),
        }
    }
}

/// A helper invocation failed. Always recovered at the token level.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HelperError {
    #[error("helper '{name}' expects at least {expected} argument(s), got {actual}")]
    Arity {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("helper '{name}' expects a number, got '{value}'")]
    NotANumber { name: String, value: String },

    #[error("helper '{name}' failed: {message}")]
    Custom { name: String, message: String },
}

/// Error type of the public engine facade
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compilation_error_carries_template_id() {
        let err = CompilationError::new("valuation-pro", CompilationCause::NoSections);
        let msg = err.to_string();
        assert!(msg.contains("valuation-pro"));
        assert!(msg.contains("no sections"));
    }

    #[test]
    fn test_engine_error_from_validation() {
        let err: EngineError = ValidationError::MissingMetadata("metadata").into();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_engine_error_from_config() {
        let err: EngineError = config::ConfigError::NotFound("render".to_string()).into();
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
