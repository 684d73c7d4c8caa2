use crate::interpretation::InterpretationError;
use ehr_types::{CodeError, TextError};

#[derive(Debug, thiserror::Error)]
pub enum EhrError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid text: {0}")]
    Text(#[from] TextError),
    #[error("invalid code: {0}")]
    Code(#[from] CodeError),
    #[error("invalid analyte value: {0}")]
    Interpretation(#[from] InterpretationError),

    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: String },
    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: &'static str, key: String },
    #[error("referenced {kind} {key} does not exist")]
    UnknownReference { kind: &'static str, key: String },
    #[error("{kind} {key} is still referenced by {referenced_by}")]
    InUse {
        kind: &'static str,
        key: String,
        referenced_by: &'static str,
    },

    #[error("failed to read reference range file: {0}")]
    FileRead(std::io::Error),
    #[error("translation error: {0}")]
    Translation(String),

    #[error("clinical store is unavailable (lock poisoned)")]
    StoreUnavailable,
}

impl EhrError {
    pub(crate) fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub(crate) fn unknown_reference(kind: &'static str, key: impl ToString) -> Self {
        Self::UnknownReference {
            kind,
            key: key.to_string(),
        }
    }
}

pub type EhrResult<T> = std::result::Result<T, EhrError>;
