//! Error types for resolution.

use std::time::Duration;

use thiserror::Error;

use crate::dns::RecordType;

/// Result type alias for resolution operations
pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of a failed lookup against one nameserver pair.
///
/// The first three kinds are recovered by the query engine; `Unclassified`
/// is always propagated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The queried name does not exist (NXDOMAIN).
    #[error("The DNS query name does not exist: {name}")]
    NameNotFound { name: String },

    /// The name exists but has no records of the requested type.
    #[error("The DNS response does not contain an answer to the question: {name} IN {rtype}")]
    NoAnswer { name: String, rtype: RecordType },

    /// No nameserver answered in time.
    #[error("The DNS operation timed out after {:.3} seconds", .elapsed.as_secs_f64())]
    Timeout { elapsed: Duration },

    /// Any other failure.
    #[error("{0}")]
    Unclassified(String),
}

impl QueryError {
    pub fn unclassified(msg: impl Into<String>) -> Self {
        Self::Unclassified(msg.into())
    }

    /// Whether the query engine handles this error itself.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Unclassified(_))
    }
}

/// Errors that end a run.
#[derive(Error, Debug)]
pub enum Error {
    /// A query failed in a way the engine does not recover from
    #[error("{context}")]
    Query {
        context: String,
        #[source]
        source: QueryError,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
