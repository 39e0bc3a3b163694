//! Document helpers shared by every layer of the fake driver.
//!
//! Stored documents are plain [`bson::Document`] values. This module knows about the
//! identifier field, the string form used as the storage key, the key rules applied
//! on write, and conversions between stored documents and typed or JSON values.

use bson::{
    Bson, Document,
    de::deserialize_from_document,
    ser::serialize_to_document,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, to_value};

use crate::error::{MongoFakeError, MongoFakeResult};

/// Name of the identifier field carried by every stored document.
pub const ID_FIELD: &str = "_id";

/// Returns the storage key for an identifier value.
///
/// ObjectIds use their hex form, strings are used verbatim and every other value
/// falls back to its display form.
pub fn id_key(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(value) => value.clone(),
        other => other.to_string(),
    }
}

/// Rebuilds a document with checked keys.
///
/// The result is a deep copy of `document`. Keys must be non-empty and may not
/// contain `.` or NUL. Top-level keys may not start with `$`; nested ones may, so
/// references shaped like `{"$ref": .., "$id": ..}` survive.
pub fn normalize_document(document: &Document) -> MongoFakeResult<Document> {
    normalize_level(document, true)
}

fn normalize_level(document: &Document, top_level: bool) -> MongoFakeResult<Document> {
    let mut normalized = Document::new();

    for (key, value) in document {
        check_key(key, top_level)?;
        normalized.insert(key.clone(), normalize_value(value)?);
    }

    Ok(normalized)
}

fn normalize_value(value: &Bson) -> MongoFakeResult<Bson> {
    Ok(match value {
        Bson::Document(doc) => Bson::Document(normalize_level(doc, false)?),
        Bson::Array(items) => Bson::Array(
            items
                .iter()
                .map(normalize_value)
                .collect::<MongoFakeResult<Vec<_>>>()?,
        ),
        other => other.clone(),
    })
}

fn check_key(key: &str, top_level: bool) -> MongoFakeResult<()> {
    if key.is_empty() {
        return Err(MongoFakeError::InvalidDocument("key must not be empty".into()));
    }
    if key.contains('\0') {
        return Err(MongoFakeError::InvalidDocument(format!("key {key:?} must not contain NUL")));
    }
    if key.contains('.') {
        return Err(MongoFakeError::InvalidDocument(format!("key {key:?} must not contain '.'")));
    }
    if top_level && key.starts_with('$') {
        return Err(MongoFakeError::InvalidDocument(format!("key {key:?} must not start with '$'")));
    }

    Ok(())
}

/// Extension trait converting typed values to and from stored documents.
///
/// Implemented for every type that is `Serialize + DeserializeOwned`.
pub trait DocumentExt: Sized {
    /// Converts this value into a BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not serialize to a document.
    fn to_document(&self) -> MongoFakeResult<Document>;

    /// Builds a value from a stored BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_document(document: Document) -> MongoFakeResult<Self>;
}

impl<T: Serialize + DeserializeOwned> DocumentExt for T {
    fn to_document(&self) -> MongoFakeResult<Document> {
        Ok(serialize_to_document(self)?)
    }

    fn from_document(document: Document) -> MongoFakeResult<Self> {
        Ok(deserialize_from_document(document)?)
    }
}

/// Converts a JSON object into a BSON document.
///
/// # Errors
///
/// Returns [`MongoFakeError::Serialization`] if `value` is not a JSON object.
pub fn document_from_json(value: &Value) -> MongoFakeResult<Document> {
    Ok(serialize_to_document(value)?)
}

/// Converts a BSON document into its relaxed JSON form.
pub fn document_to_json(document: &Document) -> MongoFakeResult<Value> {
    Ok(to_value(document)?)
}
