//! Update specifications.
//!
//! An update document is either a full replacement or a partial merge keyed under
//! `$set`. Nothing else is accepted.

use bson::{Bson, Document};

use crate::{
    document::{ID_FIELD, normalize_document},
    error::{MongoFakeError, MongoFakeResult},
};

/// Reserved key marking a partial merge.
pub const SET_OPERATOR: &str = "$set";

/// A parsed update document.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateSpec {
    /// Replace the whole stored document, keeping its identifier.
    Replace(Document),
    /// Overwrite or create the named fields; dotted names address nested documents.
    Set(Document),
}

impl UpdateSpec {
    /// Parses an update document.
    ///
    /// # Errors
    ///
    /// - [`MongoFakeError::UnsupportedOperator`] for any `$` key other than `$set`
    /// - [`MongoFakeError::InvalidArgument`] when `$set` is mixed with plain keys or its
    ///   value is not a document
    /// - [`MongoFakeError::InvalidDocument`] for replacement documents or `$set` paths
    ///   breaking the key rules
    pub fn parse(update: &Document) -> MongoFakeResult<Self> {
        if let Some(key) = update.keys().find(|key| key.starts_with('$') && *key != SET_OPERATOR) {
            log::warn!("rejecting unsupported update operator {key}");
            return Err(MongoFakeError::UnsupportedOperator(key.clone()));
        }

        match update.get(SET_OPERATOR) {
            None => Ok(UpdateSpec::Replace(normalize_document(update)?)),
            Some(_) if update.len() > 1 => Err(MongoFakeError::InvalidArgument(
                "$set cannot be combined with replacement fields".into(),
            )),
            Some(Bson::Document(fields)) => {
                let mut checked = Document::new();
                for (path, value) in fields {
                    check_path(path)?;
                    checked.insert(path.clone(), normalize_value(value)?);
                }
                Ok(UpdateSpec::Set(checked))
            }
            Some(_) => Err(MongoFakeError::InvalidArgument("$set value must be a document".into())),
        }
    }

    /// Returns true if applying this update would change the identifier of a
    /// document whose current identifier is `id`.
    pub fn touches_id(&self, id: Option<&Bson>) -> bool {
        let target = match self {
            UpdateSpec::Replace(doc) | UpdateSpec::Set(doc) => doc.get(ID_FIELD),
        };

        match (target, id) {
            (Some(new), Some(current)) => new != current,
            _ => false,
        }
    }
}

fn check_path(path: &str) -> MongoFakeResult<()> {
    if path.starts_with('$') {
        return Err(MongoFakeError::InvalidDocument(format!("field {path:?} must not start with '$'")));
    }
    if path.contains('\0') || path.split('.').any(str::is_empty) {
        return Err(MongoFakeError::InvalidDocument(format!("invalid field path {path:?}")));
    }

    Ok(())
}

fn normalize_value(value: &Bson) -> MongoFakeResult<Bson> {
    // wrap so nested keys go through the same rules as inserted documents
    let mut holder = Document::new();
    holder.insert("value", value.clone());
    let mut normalized = normalize_document(&holder)?;

    Ok(normalized.remove("value").unwrap_or(Bson::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn plain_documents_replace() {
        let spec = UpdateSpec::parse(&doc! { "a": 1, "b": { "c": 2 } }).unwrap();
        assert_eq!(spec, UpdateSpec::Replace(doc! { "a": 1, "b": { "c": 2 } }));
    }

    #[test]
    fn set_documents_merge() {
        let spec = UpdateSpec::parse(&doc! { "$set": { "a": 9, "b.c": 3 } }).unwrap();
        assert_eq!(spec, UpdateSpec::Set(doc! { "a": 9, "b.c": 3 }));
    }

    #[test]
    fn other_operators_are_rejected() {
        assert_eq!(
            UpdateSpec::parse(&doc! { "$inc": { "a": 1 } }),
            Err(MongoFakeError::UnsupportedOperator("$inc".into()))
        );
        assert!(matches!(
            UpdateSpec::parse(&doc! { "$set": 1 }),
            Err(MongoFakeError::InvalidArgument(_))
        ));
        assert!(matches!(
            UpdateSpec::parse(&doc! { "$set": { "a": 1 }, "b": 2 }),
            Err(MongoFakeError::InvalidArgument(_))
        ));
        assert!(matches!(
            UpdateSpec::parse(&doc! { "$set": { "a..b": 1 } }),
            Err(MongoFakeError::InvalidDocument(_))
        ));
    }

    #[test]
    fn detects_identifier_changes() {
        let spec = UpdateSpec::parse(&doc! { "$set": { "_id": 2 } }).unwrap();
        assert!(spec.touches_id(Some(&Bson::Int32(1))));
        assert!(!spec.touches_id(Some(&Bson::Int32(2))));

        let spec = UpdateSpec::parse(&doc! { "a": 1 }).unwrap();
        assert!(!spec.touches_id(Some(&Bson::Int32(1))));
    }
}
