//! Deterministic identifier construction.
//!
//! Generated identifiers are regular [`ObjectId`] values. For fixtures that must be
//! reproducible, identifiers can be derived from a timestamp instead: the first four
//! bytes hold the big-endian seconds and the remaining eight bytes are zero, so two
//! independent implementations given the same time produce the same identifier.

use bson::oid::ObjectId;
use chrono::NaiveDateTime;

use crate::error::{MongoFakeError, MongoFakeResult};

/// Default layout accepted by [`object_id_from_time_str`].
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Builds an identifier whose timestamp prefix is `secs` seconds after the epoch.
///
/// Only the low 32 bits of `secs` are kept, matching the width of the prefix.
pub fn object_id_from_secs(secs: i64) -> ObjectId {
    let mut bytes = [0u8; 12];
    bytes[..4].copy_from_slice(&(secs as i32).to_be_bytes());
    ObjectId::from_bytes(bytes)
}

/// Builds an identifier from a time string interpreted as UTC.
///
/// # Errors
///
/// Returns [`MongoFakeError::InvalidArgument`] if `value` does not match `format`.
pub fn object_id_from_time_str(value: &str, format: &str) -> MongoFakeResult<ObjectId> {
    let parsed = NaiveDateTime::parse_from_str(value, format)
        .map_err(|err| MongoFakeError::InvalidArgument(format!("time {value:?}: {err}")))?;

    Ok(object_id_from_secs(parsed.and_utc().timestamp()))
}
