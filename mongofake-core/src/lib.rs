//! Value-level vocabulary of the fake MongoDB driver.
//!
//! This crate holds everything that does not need storage:
//!
//! - **Errors** ([`error`]) - the error taxonomy shared by every layer
//! - **Documents** ([`document`]) - identifier field, key rules, typed and JSON conversion
//! - **Identifiers** ([`oid`]) - deterministic ObjectIds derived from timestamps
//! - **Queries** ([`query`]) - filter parsing, sort keys, find options and the visitor trait
//! - **Updates** ([`update`]) - replacement and `$set` update specifications
//! - **Results** ([`result`]) - driver-shaped write acknowledgements
//! - **Options** ([`options`]) - client options and connection-string parsing
//!
//! The in-memory engine lives in `mongofake-memory`.

#[allow(unused_extern_crates)]
extern crate self as mongofake_core;

pub mod document;
pub mod error;
pub mod oid;
pub mod options;
pub mod query;
pub mod result;
pub mod update;
