use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for Folio operations.
///
/// Each kind names a category of failure so callers can branch on it
/// without parsing messages.
///
/// # Examples
///
/// ```rust,ignore
/// use folio::errors::{FolioError, ErrorKind, FolioResult};
///
/// fn example() -> FolioResult<()> {
///     Err(FolioError::new("projection mixes modes", ErrorKind::ValidationError))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// Malformed filter, projection, update or pipeline stage.
    /// Raised before any side effect takes place.
    ValidationError,
    /// An aggregation expression referenced a missing or mistyped field.
    EvaluationError,

    /// Generic indexing error
    IndexingError,
    /// Index does not exist
    IndexNotFound,
    /// A unique index already holds the key
    UniqueConstraintViolation,

    /// The provided id is invalid
    InvalidId,
    /// Invalid field name
    InvalidFieldName,

    /// The operation is not valid in the current state
    InvalidOperation,
    /// The collection has been dropped
    CollectionDropped,
    /// The database has already been closed
    DatabaseClosed,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::EvaluationError => write!(f, "Evaluation error"),
            ErrorKind::IndexingError => write!(f, "Indexing error"),
            ErrorKind::IndexNotFound => write!(f, "Index not found"),
            ErrorKind::UniqueConstraintViolation => write!(f, "Unique constraint violation"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::InvalidFieldName => write!(f, "Invalid field name"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::CollectionDropped => write!(f, "Collection dropped"),
            ErrorKind::DatabaseClosed => write!(f, "Database closed"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Folio error type.
///
/// Carries a message, an [ErrorKind], an optional cause and the backtrace
/// captured where the error was created.
///
/// ```rust,ignore
/// use folio::errors::{FolioError, ErrorKind};
///
/// let cause = FolioError::new("division by zero", ErrorKind::EvaluationError);
/// let err = FolioError::new_with_cause("$addFields failed", ErrorKind::EvaluationError, cause);
/// ```
#[derive(Clone)]
pub struct FolioError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<FolioError>>,
    backtrace: Atomic<Backtrace>,
}

impl FolioError {
    /// Creates a new `FolioError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        FolioError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `FolioError` chained to the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: FolioError) -> Self {
        FolioError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&FolioError> {
        self.cause.as_deref()
    }
}

impl Display for FolioError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for FolioError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for FolioError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// Shorthand for `Result<T, FolioError>`, returned by every fallible
/// Folio operation.
pub type FolioResult<T> = Result<T, FolioError>;
