//! Error types returned by the record store.

use thiserror::Error;

/// Failure of a record store operation.
///
/// Driver errors are carried unchanged so their message reaches the caller.
#[derive(Error, Debug)]
pub enum RecordStoreError {
    /// Database or collection name was empty. Raised before any network activity.
    #[error("invalid argument: {0} is empty")]
    InvalidArgument(&'static str),

    /// The client could not be built or the server did not answer the handshake.
    #[error("{0}")]
    Connection(#[source] mongodb::error::Error),

    /// Insert, update, find or count failed on an established connection.
    #[error("{0}")]
    Operation(#[source] mongodb::error::Error),

    /// Uniqueness was requested but more than one record matched.
    #[error("illegal records: {count} documents match a query expected to be unique")]
    IllegalRecords { count: u64 },

    /// A unique lookup matched nothing.
    #[error("not found")]
    NotFound,

    /// A caller record could not be encoded as a BSON document.
    #[error("record is not a document: {0}")]
    Serialization(#[from] bson::ser::Error),

    /// A document could not be encoded to BSON bytes.
    #[error("document cannot be encoded: {0}")]
    Encoding(#[from] bson::raw::Error),
}

/// Discriminant of [`RecordStoreError`], for comparing failures by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    Connection,
    Operation,
    IllegalRecords,
    NotFound,
    Serialization,
}

impl RecordStoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecordStoreError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            RecordStoreError::Connection(_) => ErrorKind::Connection,
            RecordStoreError::Operation(_) => ErrorKind::Operation,
            RecordStoreError::IllegalRecords { .. } => ErrorKind::IllegalRecords,
            RecordStoreError::NotFound => ErrorKind::NotFound,
            RecordStoreError::Serialization(_) | RecordStoreError::Encoding(_) => {
                ErrorKind::Serialization
            }
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }
}

pub type Result<T> = std::result::Result<T, RecordStoreError>;
