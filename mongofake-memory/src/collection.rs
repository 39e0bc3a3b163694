//! Collections of stored documents.
//!
//! A [`Collection`] keeps its documents in an [`OrderedStore`] keyed by the string form
//! of each document's `_id`, so scans always run in first-insertion order. Writes store
//! normalized deep copies and reads hand out copies, so callers never share state with
//! the store.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use mongofake_core::query::{FindOptions, SortDirection};
//! use mongofake_memory::Collection;
//!
//! let mut users = Collection::new("app", "users");
//! users.insert_many(vec![doc! { "name": "Ann", "age": 31 }, doc! { "name": "Bob", "age": 27 }])?;
//!
//! let adults = users.find(
//!     &doc! { "age": { "$gte": 30 } },
//!     FindOptions::builder().sort("name", SortDirection::Asc).build(),
//! )?;
//! assert_eq!(adults.count_documents(true), 1);
//! ```

use bson::{Bson, Document, oid::ObjectId};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;

use mongofake_core::{
    document::{DocumentExt, ID_FIELD, id_key, normalize_document},
    error::{MongoFakeError, MongoFakeResult},
    query::{Filter, FindOptions, Selector, Sort, SortDirection},
    result::{RemoveResult, UpdateResult},
    update::UpdateSpec,
};

use crate::{
    cursor::{Cursor, query},
    evaluator::values_equal,
    ordered::OrderedStore,
    path::set_path,
    projection::Projection,
};

#[derive(Debug, Clone)]
pub struct Collection {
    database: String,
    name: String,
    documents: OrderedStore<Document>,
}

impl Collection {
    /// Creates an empty collection named `name` inside `database`.
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
            documents: OrderedStore::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    /// `"<database>.<collection>"`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }

    /// Stores a copy of `document` and returns its identifier.
    ///
    /// A missing or `null` `_id` is replaced by a fresh [`ObjectId`] placed first in the
    /// stored document. A document whose identifier is already stored replaces the
    /// stored one in place.
    ///
    /// # Errors
    ///
    /// Returns [`MongoFakeError::InvalidDocument`] if a key breaks the key rules.
    pub fn insert_one(&mut self, document: Document) -> MongoFakeResult<Bson> {
        let (id, stored) = with_id(&document)?;
        self.documents.set(&id_key(&id), &stored);

        log::debug!("inserted document {id} into {}", self.full_name());

        Ok(id)
    }

    /// Inserts `documents` one after another and returns their identifiers in input order.
    ///
    /// Documents before a failing one stay inserted.
    pub fn insert_many<I>(&mut self, documents: I) -> MongoFakeResult<Vec<Bson>>
    where
        I: IntoIterator<Item = Document>,
    {
        documents
            .into_iter()
            .map(|document| self.insert_one(document))
            .collect()
    }

    /// Serializes `value` and inserts the resulting document.
    pub fn insert_typed<T>(&mut self, value: &T) -> MongoFakeResult<Bson>
    where
        T: Serialize + DeserializeOwned,
    {
        self.insert_one(value.to_document()?)
    }

    /// Inserts `document` when it has no identifier, otherwise upserts it by identifier.
    ///
    /// Returns the identifier of the stored document.
    pub fn save(&mut self, document: Document) -> MongoFakeResult<Bson> {
        match document.get(ID_FIELD) {
            None | Some(Bson::Null) => self.insert_one(document),
            Some(id) => {
                let id = id.clone();
                let mut spec = Document::new();
                spec.insert(ID_FIELD, id.clone());

                self.update(&spec, &document, true, false)?;
                Ok(id)
            }
        }
    }

    /// Applies `update` to stored documents equal to `spec` on every top-level field.
    ///
    /// Matching is flat equality, narrower than [`Collection::find`]: no operators and
    /// no dotted paths. Documents are visited in insertion order and only the first
    /// match is updated unless `multi` is set. With `upsert` and no match, a new
    /// document is built from the equality fields of `spec` and the update.
    ///
    /// # Arguments
    ///
    /// * `spec` - Field/value pairs a document must carry
    /// * `update` - A replacement document or `{"$set": {...}}`
    /// * `upsert` - Insert when nothing matches
    /// * `multi` - Update every match instead of the first one
    ///
    /// # Errors
    ///
    /// - [`MongoFakeError::UnsupportedOperator`] or [`MongoFakeError::InvalidArgument`]
    ///   for a malformed update document
    /// - [`MongoFakeError::InvalidDocument`] when the update would change an `_id`
    ///
    /// Nothing is written when an error is returned.
    pub fn update(
        &mut self,
        spec: &Document,
        update: &Document,
        upsert: bool,
        multi: bool,
    ) -> MongoFakeResult<UpdateResult> {
        let update = UpdateSpec::parse(update)?;

        let targets = self
            .documents
            .items()
            .filter(|(_, document)| equals_on_fields(document, spec))
            .take(if multi { usize::MAX } else { 1 })
            .map(|(key, document)| Ok((key.to_string(), apply_update(document, &update)?)))
            .collect::<MongoFakeResult<Vec<_>>>()?;

        if targets.is_empty() {
            if !upsert {
                return Ok(UpdateResult::new(0, false));
            }

            let id = self.insert_one(upsert_document(spec, &update)?)?;
            log::debug!("upserted document {id} into {}", self.full_name());
            return Ok(UpdateResult::upserted(id));
        }

        for (key, document) in &targets {
            self.documents.set(key, document);
        }

        log::debug!("updated {} document(s) in {}", targets.len(), self.full_name());

        Ok(UpdateResult::new(targets.len() as i64, true))
    }

    /// Deletes every document selected by `selector`.
    ///
    /// Selection uses full [`Collection::find`] matching. A bare identifier selects at
    /// most one document; [`Selector::All`] empties the collection.
    pub fn remove(&mut self, selector: impl Into<Selector>) -> MongoFakeResult<RemoveResult> {
        let spec = selector.into().into_document();
        let options = FindOptions::builder().projection(Vec::<String>::new()).build();

        let victims = self
            .find(&spec, options)?
            .filter_map(|document| document.get(ID_FIELD).map(id_key))
            .collect::<Vec<_>>();

        for key in &victims {
            self.documents.delete(key)?;
        }

        log::debug!("removed {} document(s) from {}", victims.len(), self.full_name());

        Ok(RemoveResult::new(victims.len() as i64))
    }

    /// Runs a query and returns a cursor over copies of the matching documents.
    ///
    /// Sorting happens before projection, so sort keys need not be projected. `skip`
    /// and `limit` from `options` are applied to the cursor before it is returned.
    ///
    /// # Errors
    ///
    /// - [`MongoFakeError::InvalidArgument`] for a negative skip
    /// - [`MongoFakeError::UnsupportedOperator`] or [`MongoFakeError::InvalidQuery`]
    ///   for a filter that cannot be parsed
    pub fn find(&self, spec: &Document, options: FindOptions) -> MongoFakeResult<Cursor> {
        let skip = usize::try_from(options.skip)
            .map_err(|_| MongoFakeError::InvalidArgument(format!("skip must be >= 0, got {}", options.skip)))?;
        // a zero limit in find options means unlimited
        let limit = match options.limit {
            0 => usize::MAX,
            limit => usize::try_from(limit.unsigned_abs()).unwrap_or(usize::MAX),
        };

        let filter = Filter::parse(spec)?;
        log::trace!("scanning {} document(s) of {}", self.documents.len(), self.full_name());

        let mut documents = query(self.documents.items(), &filter, options.sort.as_deref())?;

        if let Some(fields) = &options.projection {
            let projection = Projection::new(fields);
            documents = documents
                .iter()
                .map(|document| projection.apply(document))
                .collect::<MongoFakeResult<Vec<_>>>()?;
        }

        Ok(Cursor::new(self.full_name(), documents).skip(skip).limit(limit))
    }

    /// Returns a copy of the first document selected by `selector`, if any.
    pub fn find_one(&self, selector: impl Into<Selector>) -> MongoFakeResult<Option<Document>> {
        let spec = selector.into().into_document();
        let mut cursor = self.find(&spec, FindOptions::builder().limit(1).build())?;

        Ok(cursor.next())
    }

    /// Number of stored documents.
    pub fn count(&self) -> usize {
        self.documents.len()
    }

    pub fn clear(&mut self) {
        log::debug!("clearing {}", self.full_name());
        self.documents.clear();
    }

    /// Accepts an index definition and returns the name a server would give it.
    ///
    /// No index is built; every query is a scan.
    pub fn ensure_index(&self, keys: &[Sort]) -> String {
        let name = keys
            .iter()
            .map(|key| {
                let direction = match key.direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                };
                format!("{}_{direction}", key.field)
            })
            .collect::<Vec<_>>()
            .join("_");

        log::debug!("ignoring index {name} on {}", self.full_name());
        name
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Collection(Database('{}'), '{}')", self.database, self.name)
    }
}

/// Normalizes `document` and makes sure it carries an identifier.
fn with_id(document: &Document) -> MongoFakeResult<(Bson, Document)> {
    let normalized = normalize_document(document)?;

    match normalized.get(ID_FIELD) {
        Some(id) if *id != Bson::Null => Ok((id.clone(), normalized)),
        _ => {
            let id = Bson::ObjectId(ObjectId::new());
            let mut stored = Document::new();
            stored.insert(ID_FIELD, id.clone());
            for (key, value) in normalized {
                if key != ID_FIELD {
                    stored.insert(key, value);
                }
            }
            Ok((id, stored))
        }
    }
}

fn equals_on_fields(document: &Document, spec: &Document) -> bool {
    spec.iter().all(|(field, expected)| {
        document
            .get(field)
            .is_some_and(|value| values_equal(value, expected))
    })
}

/// Builds the new version of `current`; `current` itself is left untouched.
fn apply_update(current: &Document, update: &UpdateSpec) -> MongoFakeResult<Document> {
    if update.touches_id(current.get(ID_FIELD)) {
        return Err(MongoFakeError::InvalidDocument("the _id field cannot be changed".into()));
    }

    match update {
        UpdateSpec::Replace(replacement) => {
            let mut replaced = Document::new();
            if let Some(id) = current.get(ID_FIELD) {
                replaced.insert(ID_FIELD, id.clone());
            }
            for (key, value) in replacement {
                if key != ID_FIELD {
                    replaced.insert(key.clone(), value.clone());
                }
            }
            Ok(replaced)
        }
        UpdateSpec::Set(fields) => {
            let mut merged = current.clone();
            for (path, value) in fields {
                set_path(&mut merged, path, value.clone())?;
            }
            Ok(merged)
        }
    }
}

fn upsert_document(spec: &Document, update: &UpdateSpec) -> MongoFakeResult<Document> {
    let mut document = Document::new();

    match update {
        UpdateSpec::Replace(replacement) => {
            if let Some(id) = spec.get(ID_FIELD) {
                document.insert(ID_FIELD, id.clone());
            }
            for (key, value) in replacement {
                if !document.contains_key(key) {
                    document.insert(key.clone(), value.clone());
                }
            }
        }
        UpdateSpec::Set(fields) => {
            for (key, value) in spec {
                if !key.starts_with('$') {
                    document.insert(key.clone(), value.clone());
                }
            }
            for (path, value) in fields {
                set_path(&mut document, path, value.clone())?;
            }
        }
    }

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde::Deserialize;

    fn people() -> Collection {
        let mut collection = Collection::new("db", "people");
        collection
            .insert_many(vec![
                doc! { "_id": 1, "name": "Ann", "age": 31 },
                doc! { "_id": 2, "name": "Bob", "age": 27 },
                doc! { "_id": 3, "name": "Cid", "age": 31 },
            ])
            .unwrap();
        collection
    }

    fn names(cursor: Cursor) -> Vec<String> {
        cursor
            .map(|doc| doc.get_str("name").unwrap().to_string())
            .collect()
    }

    #[test]
    fn insert_generates_leading_object_id() {
        let mut collection = Collection::new("db", "c");
        let id = collection.insert_one(doc! { "a": 1, "_id": Bson::Null }).unwrap();

        assert!(matches!(id, Bson::ObjectId(_)));
        let stored = collection.find_one(Selector::id(id.clone())).unwrap().unwrap();
        assert_eq!(stored.keys().next().map(String::as_str), Some(ID_FIELD));
        assert_eq!(stored, doc! { "_id": id, "a": 1 });
    }

    #[test]
    fn insert_rejects_bad_keys_and_overwrites_same_id() {
        let mut collection = Collection::new("db", "c");
        assert!(matches!(
            collection.insert_one(doc! { "a.b": 1 }),
            Err(MongoFakeError::InvalidDocument(_))
        ));

        collection.insert_one(doc! { "_id": "x", "v": 1 }).unwrap();
        collection.insert_one(doc! { "_id": "y", "v": 2 }).unwrap();
        collection.insert_one(doc! { "_id": "x", "v": 3 }).unwrap();

        assert_eq!(collection.count(), 2);
        let all = collection.find(&doc! {}, FindOptions::new()).unwrap().collect::<Vec<_>>();
        assert_eq!(all, vec![doc! { "_id": "x", "v": 3 }, doc! { "_id": "y", "v": 2 }]);
    }

    #[test]
    fn stored_documents_are_isolated_from_results() {
        let collection = people();
        let mut found = collection.find_one(Selector::id(1)).unwrap().unwrap();
        found.insert("name", "Changed");

        assert_eq!(
            collection.find_one(Selector::id(1)).unwrap().unwrap().get_str("name").unwrap(),
            "Ann"
        );
    }

    #[test]
    fn find_applies_options() {
        let collection = people();
        let options = FindOptions::builder()
            .sort("age", SortDirection::Desc)
            .sort("name", SortDirection::Asc)
            .skip(1)
            .build();
        assert_eq!(names(collection.find(&doc! {}, options).unwrap()), vec!["Cid", "Bob"]);

        let negative_limit = FindOptions::builder().limit(-2).build();
        assert_eq!(names(collection.find(&doc! {}, negative_limit).unwrap()), vec!["Ann", "Bob"]);

        let bad_skip = FindOptions::builder().skip(-1).build();
        assert!(matches!(
            collection.find(&doc! {}, bad_skip),
            Err(MongoFakeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn zero_limit_differs_between_options_and_cursor() {
        let collection = people();
        let unlimited = FindOptions::builder().limit(0).build();
        assert_eq!(names(collection.find(&doc! {}, unlimited).unwrap()), vec!["Ann", "Bob", "Cid"]);

        let emptied = collection.find(&doc! { "age": 31 }, FindOptions::new()).unwrap().limit(0);
        assert_eq!(names(emptied), Vec::<String>::new());
    }

    #[test]
    fn find_projects_after_sorting() {
        let collection = people();
        let options = FindOptions::builder()
            .projection(["name"])
            .sort("age", SortDirection::Asc)
            .limit(1)
            .build();
        let cursor = collection.find(&doc! {}, options).unwrap();

        assert_eq!(cursor.count_documents(false), 3);
        assert_eq!(cursor.collect::<Vec<_>>(), vec![doc! { "_id": 2, "name": "Bob" }]);
    }

    #[test]
    fn unsupported_operators_fail_before_scanning() {
        let collection = people();
        assert_eq!(
            collection.find(&doc! { "age": { "$regex": "3" } }, FindOptions::new()).unwrap_err(),
            MongoFakeError::UnsupportedOperator("$regex".into())
        );
    }

    #[test]
    fn update_stops_at_first_match_unless_multi() {
        let mut collection = people();
        let single = collection
            .update(&doc! { "age": 31 }, &doc! { "$set": { "seen": true } }, false, false)
            .unwrap();
        assert_eq!(single, UpdateResult::new(1, true));
        assert_eq!(collection.find(&doc! { "seen": true }, FindOptions::new()).unwrap().count(), 1);
        assert!(collection.find_one(Selector::id(1)).unwrap().unwrap().contains_key("seen"));

        let multi = collection
            .update(&doc! { "age": 31 }, &doc! { "$set": { "seen": false } }, false, true)
            .unwrap();
        assert_eq!(multi.n, 2);

        let none = collection.update(&doc! { "age": 99 }, &doc! { "a": 1 }, false, false).unwrap();
        assert_eq!(none, UpdateResult::new(0, false));
    }

    #[test]
    fn set_merges_named_fields_only() {
        let mut collection = Collection::new("db", "c");
        collection.insert_one(doc! { "_id": 1, "a": 1, "b": 2 }).unwrap();
        collection
            .update(&doc! { "_id": 1 }, &doc! { "$set": { "a": 9, "c.d": 4 } }, false, false)
            .unwrap();

        assert_eq!(
            collection.find_one(Selector::id(1)).unwrap().unwrap(),
            doc! { "_id": 1, "a": 9, "b": 2, "c": { "d": 4 } }
        );
    }

    #[test]
    fn set_rejects_array_indexes_far_past_the_end() {
        let mut collection = Collection::new("db", "c");
        collection.insert_one(doc! { "_id": 1, "list": [1, 2] }).unwrap();

        for path in ["list.18446744073709551615", "list.100000000000"] {
            let err = collection
                .update(&doc! { "_id": 1 }, &doc! { "$set": { path: 1 } }, false, false)
                .unwrap_err();
            assert!(matches!(err, MongoFakeError::InvalidDocument(_)), "{path}");
        }
        assert_eq!(
            collection.find_one(Selector::id(1)).unwrap().unwrap(),
            doc! { "_id": 1, "list": [1, 2] }
        );
    }

    #[test]
    fn replacement_keeps_identifier_and_position() {
        let mut collection = people();
        collection.update(&doc! { "_id": 1 }, &doc! { "name": "Ada" }, false, false).unwrap();

        let all = collection.find(&doc! {}, FindOptions::new()).unwrap().collect::<Vec<_>>();
        assert_eq!(all[0], doc! { "_id": 1, "name": "Ada" });
    }

    #[test]
    fn changing_the_identifier_is_rejected() {
        let mut collection = people();
        let err = collection
            .update(&doc! { "_id": 1 }, &doc! { "$set": { "_id": 5 } }, false, false)
            .unwrap_err();

        assert!(matches!(err, MongoFakeError::InvalidDocument(_)));
        assert!(collection.find_one(Selector::id(1)).unwrap().is_some());
    }

    #[test]
    fn upsert_inserts_when_nothing_matches() {
        let mut collection = Collection::new("db", "c");
        let result = collection
            .update(&doc! { "name": "Eve" }, &doc! { "$set": { "age": 40 } }, true, false)
            .unwrap();

        assert_eq!(result.n, 1);
        assert!(!result.updated_existing);
        let id = result.upserted.unwrap();
        assert_eq!(
            collection.find_one(Selector::id(id.clone())).unwrap().unwrap(),
            doc! { "_id": id, "name": "Eve", "age": 40 }
        );
    }

    #[test]
    fn save_inserts_or_replaces() {
        let mut collection = Collection::new("db", "c");
        let id = collection.save(doc! { "v": 1 }).unwrap();
        let mut document = collection.find_one(Selector::id(id.clone())).unwrap().unwrap();

        document.insert("v", 2);
        assert_eq!(collection.save(document).unwrap(), id);
        assert_eq!(collection.count(), 1);

        collection.save(doc! { "_id": "fixed", "v": 3 }).unwrap();
        assert_eq!(collection.count(), 2);
        assert_eq!(
            collection.find_one(Selector::id("fixed")).unwrap().unwrap(),
            doc! { "_id": "fixed", "v": 3 }
        );
    }

    #[test]
    fn remove_by_identifier_and_filter() {
        let mut collection = people();
        assert_eq!(collection.remove(Selector::id(2)).unwrap().n, 1);
        assert_eq!(collection.remove(Selector::id(2)).unwrap().n, 0);

        let removed = collection.remove(doc! { "age": { "$gt": 30 } }).unwrap();
        assert_eq!(removed.n, 2);
        assert_eq!(collection.count(), 0);
    }

    #[test]
    fn remove_all_and_clear() {
        let mut collection = people();
        assert_eq!(collection.remove(Selector::All).unwrap().n, 3);

        let mut other = people();
        other.clear();
        assert_eq!(other.count(), 0);
        assert_eq!(other.find_one(Selector::All).unwrap(), None);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Person {
        name: String,
        age: i32,
    }

    #[test]
    fn typed_round_trip() {
        let mut collection = Collection::new("db", "c");
        collection.insert_typed(&Person { name: "Ann".into(), age: 31 }).unwrap();

        let mut cursor = collection.find(&doc! { "name": "Ann" }, FindOptions::new()).unwrap();
        let person = cursor.next_as::<Person>().unwrap().unwrap();
        assert_eq!(person, Person { name: "Ann".into(), age: 31 });
    }

    #[test]
    fn names_and_repr() {
        let collection = Collection::new("db", "people");
        assert_eq!(collection.full_name(), "db.people");
        assert_eq!(collection.to_string(), "Collection(Database('db'), 'people')");
        assert_eq!(
            collection.ensure_index(&[Sort::new("a", SortDirection::Asc), Sort::new("b", SortDirection::Desc)]),
            "a_1_b_-1"
        );
    }
}
