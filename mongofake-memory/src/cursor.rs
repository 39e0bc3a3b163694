//! Materialized query results.
//!
//! A [`Cursor`] owns deep copies of the documents that matched when the query ran, so
//! later writes to the collection never show up in it. It can be refined with
//! [`Cursor::sort`], [`Cursor::skip`] and [`Cursor::limit`] and is consumed as a
//! single-pass [`Iterator`]: every yielded document is removed from the cursor.

use bson::Document;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::VecDeque;

use mongofake_core::{
    document::DocumentExt,
    error::MongoFakeResult,
    query::{Filter, Sort, SortDirection},
};

use crate::{
    evaluator::{DocumentEvaluator, compare_values},
    path::resolve,
};

/// Scans `items` in order and copies every document that satisfies `filter`,
/// then stably sorts the copies by `sort` when given.
pub fn query<'a>(
    items: impl IntoIterator<Item = (&'a str, &'a Document)>,
    filter: &Filter,
    sort: Option<&[Sort]>,
) -> MongoFakeResult<Vec<Document>> {
    let mut documents = Vec::new();

    for (key, document) in items {
        if DocumentEvaluator::new(document).evaluate(filter)? {
            log::trace!("document {key} matched");
            documents.push(document.clone());
        }
    }

    if let Some(keys) = sort {
        sort_documents(&mut documents, keys);
    }

    Ok(documents)
}

/// Stable multi-key sort; each key breaks ties left by the previous one.
pub fn sort_documents(documents: &mut [Document], keys: &[Sort]) {
    documents.sort_by(|a, b| {
        keys.iter()
            .map(|key| {
                let ordering = compare_values(
                    resolve(a, &key.field).value(),
                    resolve(b, &key.field).value(),
                );
                match key.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[derive(Debug, Clone)]
pub struct Cursor {
    collection: String,
    documents: VecDeque<Document>,
    total: usize,
}

impl Cursor {
    /// Wraps already materialized documents; `collection` is the full name of the
    /// collection that produced them.
    pub fn new(collection: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            collection: collection.into(),
            total: documents.len(),
            documents: documents.into(),
        }
    }

    /// Full name (`database.collection`) of the queried collection.
    pub fn collection_full_name(&self) -> &str {
        &self.collection
    }

    /// Drops the first `skip` remaining documents. Repeated calls add up.
    pub fn skip(mut self, skip: usize) -> Self {
        let skip = skip.min(self.documents.len());
        self.documents.drain(..skip);
        self
    }

    /// Keeps at most `limit` remaining documents.
    pub fn limit(mut self, limit: usize) -> Self {
        self.documents.truncate(limit);
        self
    }

    /// Re-sorts the remaining documents.
    pub fn sort(mut self, keys: &[Sort]) -> Self {
        sort_documents(self.documents.make_contiguous(), keys);
        self
    }

    /// Number of remaining documents when `with_limit_and_skip` is set, otherwise the
    /// number of documents matched when the query ran.
    ///
    /// Named apart from [`Iterator::count`], which consumes the cursor.
    pub fn count_documents(&self, with_limit_and_skip: bool) -> usize {
        if with_limit_and_skip {
            self.documents.len()
        } else {
            self.total
        }
    }

    /// Pops the next document and converts it into `T`.
    pub fn next_as<T: Serialize + DeserializeOwned>(&mut self) -> Option<MongoFakeResult<T>> {
        self.next().map(T::from_document)
    }
}

impl Iterator for Cursor {
    type Item = Document;

    fn next(&mut self) -> Option<Self::Item> {
        self.documents.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.documents.len(), Some(self.documents.len()))
    }
}
