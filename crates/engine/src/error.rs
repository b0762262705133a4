use dentbooks_forms::FormError;

/// Errors returned by the JSON-facing engine entry points.
///
/// The typed passes themselves cannot fail; everything here comes from
/// reading input or configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("invalid engine configuration '{field}': {message}")]
    InvalidConfig { field: String, message: String },
}
