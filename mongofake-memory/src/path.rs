//! Dotted field paths.
//!
//! [`resolve`] walks a path such as `"address.lines.0"` through a document. Each
//! segment is tried against a fixed list of access strategies (named attributes of
//! composite values, document keys, array indexes); the first one that succeeds wins.
//! A segment starting with `$` that fails is retried without the sigil, so reference
//! aliases such as `owner.$id` also find a plain `id` field.
//!
//! [`set_path`] is the write-side counterpart used by `$set` and projections.

use bson::{Bson, Document};
use std::borrow::Cow;

use mongofake_core::error::{MongoFakeError, MongoFakeResult};

/// Sigil marking reference-style segments such as `$id`.
pub const REFERENCE_SIGIL: char = '$';

/// Most `null` slots a single array write may pad in before the index it sets.
pub const MAX_ARRAY_PADDING: usize = 1024;

/// Outcome of resolving a path.
///
/// `Missing` is distinct from a present `null` value.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    Found(Cow<'a, Bson>),
    Missing,
}

impl<'a> Lookup<'a> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Lookup::Missing)
    }

    pub fn value(&self) -> Option<&Bson> {
        match self {
            Lookup::Found(value) => Some(value.as_ref()),
            Lookup::Missing => None,
        }
    }
}

type Strategy = for<'v> fn(&'v Bson, &str) -> Option<Cow<'v, Bson>>;

const STRATEGIES: [Strategy; 3] = [attribute, key, index];

fn attribute<'v>(value: &'v Bson, segment: &str) -> Option<Cow<'v, Bson>> {
    match (value, segment) {
        (Bson::Timestamp(ts), "time") => Some(Cow::Owned(Bson::Int64(ts.time.into()))),
        (Bson::Timestamp(ts), "increment") => Some(Cow::Owned(Bson::Int64(ts.increment.into()))),
        (Bson::JavaScriptCodeWithScope(code), "code") => Some(Cow::Owned(Bson::String(code.code.clone()))),
        (Bson::JavaScriptCodeWithScope(code), "scope") => Some(Cow::Owned(Bson::Document(code.scope.clone()))),
        _ => None,
    }
}

fn key<'v>(value: &'v Bson, segment: &str) -> Option<Cow<'v, Bson>> {
    match value {
        Bson::Document(doc) => doc.get(segment).map(Cow::Borrowed),
        _ => None,
    }
}

fn index<'v>(value: &'v Bson, segment: &str) -> Option<Cow<'v, Bson>> {
    match value {
        Bson::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|idx| items.get(idx))
            .map(Cow::Borrowed),
        _ => None,
    }
}

fn step<'v>(value: &'v Bson, segment: &str) -> Option<Cow<'v, Bson>> {
    let attempt = |segment: &str| STRATEGIES.iter().find_map(|strategy| strategy(value, segment));

    attempt(segment).or_else(|| segment.strip_prefix(REFERENCE_SIGIL).and_then(attempt))
}

fn root<'v>(document: &'v Document, segment: &str) -> Option<Cow<'v, Bson>> {
    document
        .get(segment)
        .or_else(|| segment.strip_prefix(REFERENCE_SIGIL).and_then(|bare| document.get(bare)))
        .map(Cow::Borrowed)
}

/// Resolves a dotted `path` against `document`.
pub fn resolve<'a>(document: &'a Document, path: &str) -> Lookup<'a> {
    let mut segments = path.split('.');
    let Some(mut current) = segments.next().and_then(|first| root(document, first)) else {
        return Lookup::Missing;
    };

    for segment in segments {
        let next = match current {
            Cow::Borrowed(value) => step(value, segment),
            Cow::Owned(value) => step(&value, segment).map(|found| Cow::Owned(found.into_owned())),
        };

        match next {
            Some(value) => current = value,
            None => return Lookup::Missing,
        }
    }

    Lookup::Found(current)
}

/// Writes `value` at a dotted `path`, creating intermediate documents as needed.
///
/// Numeric segments index into existing arrays, padding with `null` when the index is
/// past the end.
///
/// # Errors
///
/// Returns [`MongoFakeError::InvalidDocument`] when the path runs through a scalar
/// or an index lies more than [`MAX_ARRAY_PADDING`] slots past the end of its array.
pub fn set_path(document: &mut Document, path: &str, value: Bson) -> MongoFakeResult<()> {
    let segments = path.split('.').collect::<Vec<_>>();
    set_in_document(document, &segments, value)
}

fn set_in_document(document: &mut Document, segments: &[&str], value: Bson) -> MongoFakeResult<()> {
    let Some((head, rest)) = segments.split_first() else {
        return Err(MongoFakeError::InvalidDocument("empty field path".into()));
    };

    if rest.is_empty() {
        document.insert(*head, value);
        return Ok(());
    }

    if !document.contains_key(*head) {
        document.insert(*head, Document::new());
    }

    match document.get_mut(*head) {
        Some(child) => set_in_value(child, rest, value),
        None => Err(MongoFakeError::InvalidDocument(format!("cannot create field {head:?}"))),
    }
}

fn set_in_value(target: &mut Bson, segments: &[&str], value: Bson) -> MongoFakeResult<()> {
    match target {
        Bson::Document(doc) => set_in_document(doc, segments, value),
        Bson::Array(items) => {
            let Some((head, rest)) = segments.split_first() else {
                return Err(MongoFakeError::InvalidDocument("empty field path".into()));
            };
            let idx = head
                .parse::<usize>()
                .map_err(|_| MongoFakeError::InvalidDocument(format!("cannot use the part {head:?} to traverse an array")))?;

            if idx >= items.len() {
                let padding = idx - items.len();
                let new_len = idx
                    .checked_add(1)
                    .filter(|_| padding <= MAX_ARRAY_PADDING)
                    .ok_or_else(|| {
                        MongoFakeError::InvalidDocument(format!(
                            "array index {idx} is more than {MAX_ARRAY_PADDING} past the end of {} element(s)",
                            items.len()
                        ))
                    })?;
                items.resize(new_len, Bson::Null);
            }

            if rest.is_empty() {
                items[idx] = value;
                return Ok(());
            }

            if items[idx] == Bson::Null {
                items[idx] = Bson::Document(Document::new());
            }
            set_in_value(&mut items[idx], rest, value)
        }
        other => Err(MongoFakeError::InvalidDocument(format!(
            "cannot create field {:?} in element {other}",
            segments.first().copied().unwrap_or_default()
        ))),
    }
}
