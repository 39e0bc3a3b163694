//! Error types and result types for fake driver operations.
//!
//! Every fallible call in the workspace returns [`MongoFakeResult<T>`]. Failures are
//! synchronous and local to the call that caused them. A lookup miss is never an
//! error: `find_one` returns `None` and an exhausted cursor simply stops yielding.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised by the fake client, its databases and collections.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MongoFakeError {
    /// An argument had the wrong shape (negative skip, `$set` not a document, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A filter specification could not be parsed.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// A filter or update operator outside the supported set was used.
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),
    /// The document violates key rules or tries to change its identifier.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// A database name contains forbidden characters or is empty.
    #[error("Invalid name: {0}")]
    InvalidName(String),
    /// The connection string could not be parsed.
    #[error("Invalid URI: {0}")]
    InvalidUri(String),
    /// The client was configured without a usable host.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// No fake node could be selected from the configured seeds.
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),
    /// The key was not present in an ordered store.
    #[error("Key not found: {0}")]
    KeyNotFound(String),
    /// Conversion between BSON, JSON and typed values failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A specialized `Result` type for fake driver operations.
pub type MongoFakeResult<T> = Result<T, MongoFakeError>;

impl From<BsonError> for MongoFakeError {
    fn from(err: BsonError) -> Self {
        MongoFakeError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for MongoFakeError {
    fn from(err: SerdeJsonError) -> Self {
        MongoFakeError::Serialization(err.to_string())
    }
}
