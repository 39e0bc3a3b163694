//! Acknowledgement documents returned by write operations.
//!
//! Field names follow the legacy driver acknowledgement shape so callers that inspect
//! `n`, `updatedExisting` or `err` keep working. The connection id and server address
//! are fixed synthetic values.

use bson::{Bson, Document, ser::serialize_to_document};
use serde::{Deserialize, Serialize};

use crate::error::MongoFakeResult;

/// Synthetic connection id echoed by every acknowledgement.
pub const CONNECTION_ID: i32 = 42;

/// Synthetic server address echoed by remove acknowledgements.
pub const SERVER_USED: &str = "localhost:27017";

/// Acknowledgement of an `update` or `save` call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UpdateResult {
    /// Number of documents updated or upserted.
    pub n: i64,
    /// Whether an existing document was updated.
    #[serde(rename = "updatedExisting")]
    pub updated_existing: bool,
    #[serde(rename = "connectionId")]
    pub connection_id: i32,
    pub ok: f64,
    /// Always `None` on success.
    pub err: Option<String>,
    /// Identifier of the inserted document when an upsert found no match.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub upserted: Option<Bson>,
}

impl UpdateResult {
    pub fn new(n: i64, updated_existing: bool) -> Self {
        Self {
            n,
            updated_existing,
            connection_id: CONNECTION_ID,
            ok: 1.0,
            err: None,
            upserted: None,
        }
    }

    pub fn upserted(id: Bson) -> Self {
        Self { upserted: Some(id), ..Self::new(1, false) }
    }

    /// Renders the acknowledgement as a BSON document with driver field names.
    pub fn to_document(&self) -> MongoFakeResult<Document> {
        Ok(serialize_to_document(self)?)
    }
}

/// Acknowledgement of a `remove` call.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RemoveResult {
    #[serde(rename = "serverUsed")]
    pub server_used: String,
    /// Number of documents removed.
    pub n: i64,
    #[serde(rename = "connectionId")]
    pub connection_id: i32,
    pub wtime: i32,
    pub err: Option<String>,
    pub ok: f64,
}

impl RemoveResult {
    pub fn new(n: i64) -> Self {
        Self {
            server_used: SERVER_USED.to_string(),
            n,
            connection_id: CONNECTION_ID,
            wtime: 0,
            err: None,
            ok: 1.0,
        }
    }

    pub fn to_document(&self) -> MongoFakeResult<Document> {
        Ok(serialize_to_document(self)?)
    }
}
