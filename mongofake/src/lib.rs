//! An in-memory, single-process stand-in for a MongoDB client.
//!
//! `mongofake` lets code written against a document-database driver run in tests
//! without a server. It keeps databases, collections and documents in process memory
//! and mirrors the driver's calling contract: lazily created registries, filter
//! documents with the common comparison operators, `$set` updates, cursors with
//! sort/skip/limit, and driver-shaped acknowledgements.
//!
//! # Features
//!
//! - **No server** - every call is synchronous and local; nothing touches the network
//! - **Driver-shaped surface** - `find`, `find_one`, `insert_one`, `update`, `save`, `remove`
//! - **Query subset** - equality, dotted paths and `$gt $lt $gte $lte $ne $in $nin $exists $all`
//! - **Copy isolation** - stored documents and query results never alias each other
//! - **Test harness** - an explicit set-up/tear-down lifecycle in [`testing`]
//!
//! # Quick Start
//!
//! ```ignore
//! use mongofake::prelude::*;
//! use mongofake::bson::doc;
//!
//! fn main() -> MongoFakeResult<()> {
//!     let mut client = Client::with_uri("mongodb://localhost:27017")?;
//!     let users = client.database("app")?.collection("users");
//!
//!     let id = users.insert_one(doc! { "name": "Ann", "age": 31 })?;
//!     users.update(&doc! { "_id": id.clone() }, &doc! { "$set": { "age": 32 } }, false, false)?;
//!
//!     let cursor = users.find(
//!         &doc! { "age": { "$gt": 30 } },
//!         FindOptions::builder().sort("name", SortDirection::Asc).build(),
//!     )?;
//!     for user in cursor {
//!         println!("{user}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Typed Documents
//!
//! Any `Serialize + Deserialize` type can be stored and read back:
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct User { name: String }
//!
//! users.insert_typed(&User { name: "Bob".into() })?;
//! let mut cursor = users.find(&doc! { "name": "Bob" }, FindOptions::new())?;
//! let bob: User = cursor.next_as().transpose()?.unwrap();
//! ```

pub mod prelude;
pub mod testing;

pub use mongofake_core::{document, error, oid, options, query, result, update};
pub use mongofake_memory::{client, collection, cursor, database, evaluator, ordered, path, projection};
pub use mongofake_memory::{Client, Collection, Cursor, Database, OrderedStore};

// Re-export BSON types for convenience
pub use bson;
