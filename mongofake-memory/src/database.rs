//! Databases: named registries of collections.
//!
//! Collections are created on first access and listed in first-creation order.

use std::fmt;

use mongofake_core::error::{MongoFakeError, MongoFakeResult};

use crate::{collection::Collection, ordered::OrderedStore};

const FORBIDDEN_NAME_CHARS: [char; 6] = [' ', '.', '/', '\\', '$', '\0'];

/// Checks a database name: non-empty and free of ` ./\$` and NUL.
///
/// # Errors
///
/// Returns [`MongoFakeError::InvalidName`] when the name is unusable.
pub fn check_database_name(name: &str) -> MongoFakeResult<()> {
    if name.is_empty() {
        return Err(MongoFakeError::InvalidName("database name cannot be empty".into()));
    }
    if let Some(invalid) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(MongoFakeError::InvalidName(format!(
            "database name {name:?} cannot contain {invalid:?}"
        )));
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    collections: OrderedStore<Collection>,
}

impl Database {
    /// Creates an empty database after checking its name.
    pub fn new(name: impl Into<String>) -> MongoFakeResult<Self> {
        let name = name.into();
        check_database_name(&name)?;

        Ok(Self::named(name))
    }

    pub(crate) fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collections: OrderedStore::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the collection called `name`, creating it if needed.
    pub fn collection(&mut self, name: &str) -> &mut Collection {
        let database = self.name.clone();
        self.collections
            .get_or_insert_with(name, || Collection::new(database, name))
    }

    /// Returns the collection called `name` without creating it.
    pub fn get_collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// Returns the `parent.child` collection, creating it if needed.
    pub fn sub_collection(&mut self, parent: &str, child: &str) -> &mut Collection {
        self.collection(&format!("{parent}.{child}"))
    }

    /// Explicitly creates a collection. Creating an existing one is not an error.
    pub fn create_collection(&mut self, name: &str) -> bool {
        self.collection(name);
        true
    }

    /// Drops a collection and all of its documents; returns whether it existed.
    pub fn drop_collection(&mut self, name: &str) -> bool {
        match self.collections.delete(name) {
            Ok(collection) => {
                log::debug!("dropped {} with {} document(s)", collection.full_name(), collection.count());
                true
            }
            Err(_) => false,
        }
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.collections.keys().map(str::to_string).collect()
    }

    /// Drops every collection.
    pub fn clear(&mut self) {
        log::debug!("clearing database {}", self.name);
        self.collections.clear();
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Database('{}')", self.name)
    }
}
