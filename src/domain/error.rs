use thiserror::Error;

/// Reasons a student record is rejected before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("email `{value}` is not a valid address")]
    MalformedEmail { value: String },
}

impl DomainError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field } | Self::TooLong { field, .. } => field,
            Self::MalformedEmail { .. } => "email",
        }
    }
}
