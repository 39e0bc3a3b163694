//! Field projections applied to materialized query results.

use bson::Document;

use mongofake_core::{document::ID_FIELD, error::MongoFakeResult};

use crate::{
    ordered::OrderedStore,
    path::{Lookup, resolve, set_path},
};

/// Ordered set of fields to keep. `_id` is always the first member.
#[derive(Debug, Clone)]
pub struct Projection {
    fields: OrderedStore<bool>,
}

impl Projection {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = OrderedStore::new();
        set.set(ID_FIELD, &true);
        for field in fields {
            set.set(field.as_ref(), &true);
        }

        Projection { fields: set }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys()
    }

    /// Copies the projected fields of `document` into a new document.
    ///
    /// Dotted fields rebuild the nested documents leading to them; fields the
    /// document lacks are skipped.
    pub fn apply(&self, document: &Document) -> MongoFakeResult<Document> {
        let mut projected = Document::new();

        for field in self.fields.keys() {
            if let Lookup::Found(value) = resolve(document, field) {
                set_path(&mut projected, field, value.into_owned())?;
            }
        }

        Ok(projected)
    }
}
