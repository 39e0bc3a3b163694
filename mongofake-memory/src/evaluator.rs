//! Filter evaluation for in-memory documents.
//!
//! This module decides whether a stored document satisfies a parsed filter and
//! provides the value order used by range operators and cursor sorting.

use bson::{Bson, DateTime, Document, oid::ObjectId};
use std::cmp::Ordering;

use mongofake_core::{
    error::{MongoFakeError, MongoFakeResult},
    query::{FieldOp, Filter, QueryVisitor},
};

use crate::path::{Lookup, resolve};

/// Comparable view over BSON values.
///
/// Integers and doubles compare by numeric value across widths. Values of different
/// kinds are never equal; for sorting they fall back to a fixed kind rank so the
/// order stays total.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value (also used for missing fields when sorting)
    Null,
    /// Integer value (int32 and int64)
    Int(i64),
    /// Floating point value
    Double(f64),
    /// String value
    String(&'a str),
    /// Embedded document, keys in stored order
    Map(Vec<(&'a str, Comparable<'a>)>),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Binary payload
    Binary(&'a [u8]),
    /// ObjectId value
    ObjectId(ObjectId),
    /// Boolean value
    Bool(bool),
    /// DateTime value
    DateTime(DateTime),
    /// Internal timestamp as (time, increment)
    Timestamp(u32, u32),
    /// Anything else, compared by plain BSON equality
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null | Bson::Undefined => Comparable::Null,
            Bson::Int32(value) => Comparable::Int(i64::from(*value)),
            Bson::Int64(value) => Comparable::Int(*value),
            Bson::Double(value) => Comparable::Double(*value),
            Bson::String(value) | Bson::Symbol(value) => Comparable::String(value),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<Vec<_>>()
            ),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Binary(binary) => Comparable::Binary(&binary.bytes),
            Bson::ObjectId(oid) => Comparable::ObjectId(*oid),
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::Timestamp(ts) => Comparable::Timestamp(ts.time, ts.increment),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> Comparable<'a> {
    /// Position of the value's kind in the cross-kind sort order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Int(_) | Comparable::Double(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::Binary(_) => 5,
            Comparable::ObjectId(_) => 6,
            Comparable::Bool(_) => 7,
            Comparable::DateTime(_) => 8,
            Comparable::Timestamp(..) => 9,
            Comparable::Other(_) => 10,
        }
    }

    /// Compares two values of the same kind; `None` when the kinds differ.
    fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Int(a), Comparable::Int(b)) => Some(a.cmp(b)),
            (Comparable::Int(a), Comparable::Double(b)) => Some((*a as f64).total_cmp(b)),
            (Comparable::Double(a), Comparable::Int(b)) => Some(a.total_cmp(&(*b as f64))),
            (Comparable::Double(a), Comparable::Double(b)) => Some(a.total_cmp(b)),
            (Comparable::String(a), Comparable::String(b)) => Some(a.cmp(b)),
            (Comparable::Map(a), Comparable::Map(b)) => Some(
                a.iter()
                    .zip(b.iter())
                    .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| va.total_cmp(vb)))
                    .find(|ord| ord.is_ne())
                    .unwrap_or_else(|| a.len().cmp(&b.len())),
            ),
            (Comparable::Array(a), Comparable::Array(b)) => Some(
                a.iter()
                    .zip(b.iter())
                    .map(|(va, vb)| va.total_cmp(vb))
                    .find(|ord| ord.is_ne())
                    .unwrap_or_else(|| a.len().cmp(&b.len())),
            ),
            (Comparable::Binary(a), Comparable::Binary(b)) => Some(a.cmp(b)),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => Some(a.bytes().cmp(&b.bytes())),
            (Comparable::Bool(a), Comparable::Bool(b)) => Some(a.cmp(b)),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => Some(a.cmp(b)),
            (Comparable::Timestamp(ta, ia), Comparable::Timestamp(tb, ib)) => Some((ta, ia).cmp(&(tb, ib))),
            (Comparable::Other(a), Comparable::Other(b)) if a == b => Some(Ordering::Equal),
            _ => None,
        }
    }

    /// Total order used for sorting: same-kind comparison, otherwise kind rank.
    pub(crate) fn total_cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Double(a), Comparable::Double(b)) => a == b,
            (Comparable::Int(a), Comparable::Double(b)) | (Comparable::Double(b), Comparable::Int(a)) => *a as f64 == *b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            _ => self.compare(other) == Some(Ordering::Equal),
        }
    }
}

/// Equality between two BSON values as the matcher sees it.
pub fn values_equal(left: &Bson, right: &Bson) -> bool {
    Comparable::from(left) == Comparable::from(right)
}

/// Sort-order comparison between two optional BSON values; `None` sorts like `null`.
pub fn compare_values(left: Option<&Bson>, right: Option<&Bson>) -> Ordering {
    let left = left.map(Comparable::from).unwrap_or(Comparable::Null);
    let right = right.map(Comparable::from).unwrap_or(Comparable::Null);

    left.total_cmp(&right)
}

/// Evaluates a parsed [`Filter`] against one document.
pub struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns true when every criterion of `filter` holds.
    pub fn evaluate(&mut self, filter: &Filter) -> MongoFakeResult<bool> {
        for criterion in filter.criteria() {
            if !self.visit_criterion(criterion)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn check(value: Option<&Bson>, op: FieldOp, argument: &Bson) -> MongoFakeResult<bool> {
        // an absent field fails every operator, `$exists` included
        let Some(value) = value else {
            return Ok(false);
        };

        Ok(match op {
            FieldOp::Exists => argument == &Bson::Boolean(true),
            FieldOp::Ne => !values_equal(value, argument),
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                match Comparable::from(value).compare(&Comparable::from(argument)) {
                    Some(ordering) => match op {
                        FieldOp::Gt => ordering == Ordering::Greater,
                        FieldOp::Gte => ordering != Ordering::Less,
                        FieldOp::Lt => ordering == Ordering::Less,
                        _ => ordering != Ordering::Greater,
                    },
                    None => false,
                }
            }
            FieldOp::In => Self::candidates(op, argument)?
                .iter()
                .any(|candidate| values_equal(value, candidate)),
            FieldOp::Nin => !Self::candidates(op, argument)?
                .iter()
                .any(|candidate| values_equal(value, candidate)),
            FieldOp::All => {
                let held = match value {
                    Bson::Array(items) => items.as_slice(),
                    single => std::slice::from_ref(single),
                };
                Self::candidates(op, argument)?
                    .iter()
                    .all(|wanted| held.iter().any(|item| values_equal(item, wanted)))
            }
        })
    }

    fn candidates(op: FieldOp, argument: &Bson) -> MongoFakeResult<&Vec<Bson>> {
        match argument {
            Bson::Array(values) => Ok(values),
            _ => Err(MongoFakeError::InvalidQuery(format!("{op} needs an array"))),
        }
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = MongoFakeError;

    fn visit_literal(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(match resolve(self.document, field) {
            Lookup::Found(found) => values_equal(&found, value),
            Lookup::Missing => false,
        })
    }

    fn visit_operators(&mut self, field: &str, ops: &[(FieldOp, Bson)]) -> Result<Self::Output, Self::Error> {
        let resolved = resolve(self.document, field);

        for (op, argument) in ops {
            if !Self::check(resolved.value(), *op, argument)? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

/// Parses `spec` and evaluates it against `document`.
///
/// # Errors
///
/// Fails for the same reasons as [`Filter::parse`].
pub fn matches(document: &Document, spec: &Document) -> MongoFakeResult<bool> {
    DocumentEvaluator::new(document).evaluate(&Filter::parse(spec)?)
}
