//! In-memory engine of the fake MongoDB driver.
//!
//! Everything lives in plain process memory and every call runs synchronously to
//! completion. Isolation comes from copying: stored documents are deep copies of what
//! was written, and query results are deep copies of what was stored.
//!
//! # Building Blocks
//!
//! - [`ordered`] - insertion-ordered key/value store backing every registry
//! - [`path`] - dotted-path resolution with typed access strategies
//! - [`evaluator`] - filter evaluation and the total order used for sorting
//! - [`cursor`] - query execution and single-pass result cursors
//! - [`projection`] - field selection on query results
//! - [`collection`], [`database`], [`client`] - the driver-shaped registries
//!
//! # Quick Start
//!
//! ```ignore
//! use bson::doc;
//! use mongofake_core::query::FindOptions;
//! use mongofake_memory::Client;
//!
//! let mut client = Client::with_uri("localhost:27017")?;
//! let scores = client.database("game")?.collection("scores");
//!
//! scores.insert_many(vec![doc! { "v": 1 }, doc! { "v": 5 }, doc! { "v": 10 }])?;
//! let high = scores.find(&doc! { "v": { "$gte": 5 } }, FindOptions::new())?;
//! assert_eq!(high.count_documents(false), 2);
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongofake_memory;

pub mod client;
pub mod collection;
pub mod cursor;
pub mod database;
pub mod evaluator;
pub mod ordered;
pub mod path;
pub mod projection;

pub use client::Client;
pub use collection::Collection;
pub use cursor::Cursor;
pub use database::Database;
pub use ordered::OrderedStore;
