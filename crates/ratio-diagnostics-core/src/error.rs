use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticsError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Inconsistent inputs: {fields} — {reason}")]
    CrossFieldCheck { fields: String, reason: String },

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DiagnosticsError {
    /// Name of the offending field(s), for presenters that highlight input.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidInput { field, .. } => Some(field),
            Self::CrossFieldCheck { fields, .. } => Some(fields),
            Self::UnknownMetric(_) => Some("metric"),
            Self::SerializationError(_) => None,
        }
    }
}

impl From<serde_json::Error> for DiagnosticsError {
    fn from(e: serde_json::Error) -> Self {
        DiagnosticsError::SerializationError(e.to_string())
    }
}
