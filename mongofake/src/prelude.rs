//! Convenient re-exports of commonly used types from mongofake.
//!
//! ```ignore
//! use mongofake::prelude::*;
//! ```

pub use mongofake_core::{
    document::{DocumentExt, ID_FIELD, document_from_json, document_to_json},
    error::{MongoFakeError, MongoFakeResult},
    oid::{object_id_from_secs, object_id_from_time_str},
    options::{ClientOptions, ClientOptionsBuilder, Node},
    query::{FindOptions, FindOptionsBuilder, Selector, Sort, SortDirection},
    result::{RemoveResult, UpdateResult},
};
pub use mongofake_memory::{Client, Collection, Cursor, Database};
