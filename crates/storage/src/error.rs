use dentbooks_forms::{CalculationMethod, FormError};

/// All errors that can be returned by an `EntryStorage` implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An entry with this id already exists (committed or staged).
    #[error("entry already exists: {entry_id}")]
    AlreadyExists { entry_id: String },

    /// No entry with the given id.
    #[error("entry not found: {entry_id}")]
    EntryNotFound { entry_id: String },

    /// The entry is soft-deleted and can no longer be replaced.
    #[error("entry is deleted: {entry_id}")]
    EntryDeleted { entry_id: String },

    /// A backend-specific storage error (connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors converting between the flat and normalized entry shapes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Form(#[from] FormError),

    /// The stored `calculations` document is not a calculation result.
    #[error("entry {entry_id}: invalid calculations: {message}")]
    InvalidCalculations { entry_id: String, message: String },

    /// The calculation was produced under a different method than the form's.
    #[error("entry {entry_id}: calculation method '{found}' does not match form method '{expected}'")]
    MethodMismatch {
        entry_id: String,
        expected: CalculationMethod,
        found: CalculationMethod,
    },

    /// A field value row does not hold valid JSON.
    #[error("entry {entry_id}: stored value for field '{field_id}' is not valid JSON: {message}")]
    InvalidStoredValue {
        entry_id: String,
        field_id: String,
        message: String,
    },

    #[error("entry {entry_id}: failed to serialize {context}: {message}")]
    Serialize {
        entry_id: String,
        context: String,
        message: String,
    },
}
