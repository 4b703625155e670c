use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Failure taxonomy of the allocation engine. Everything is returned to
/// the caller as-is; the engine never retries internally.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no such {0}")]
    NotFound(&'static str),

    /// A requirement could not be met at plan time. Names the type so the
    /// caller can tell which pool ran dry.
    #[error("not enough {resource_type} resources available for this time slot")]
    InsufficientResources { resource_type: String },

    /// A concurrent writer won the race for a resource, or a duplicate
    /// registration was attempted.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("forbidden")]
    Forbidden,

    /// Transient store failure. Distinct from the variants above so callers
    /// can tell "try again" from "this slot is truly unavailable".
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<DieselError> for EngineError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => EngineError::NotFound("record"),
            DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, info) => {
                EngineError::Conflict(info.message().to_string())
            }
            other => EngineError::Unavailable(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for EngineError {
    fn from(err: r2d2::Error) -> Self {
        EngineError::Unavailable(err.to_string())
    }
}
