//! Filter specifications, sort keys and find options.
//!
//! A filter specification arrives as a [`bson::Document`] mapping field paths to
//! either a literal (equality) or an operator sub-document such as `{"$gt": 5}`.
//! [`Filter::parse`] validates the specification up front and turns it into a flat
//! list of [`Criterion`] values, so an unsupported operator fails before any stored
//! document is touched. Backends walk the parsed filter through [`QueryVisitor`].
//!
//! # Supported operators
//!
//! `$gt`, `$lt`, `$gte`, `$lte`, `$ne`, `$in`, `$nin`, `$exists` and `$all`.
//! Anything else is rejected with [`MongoFakeError::UnsupportedOperator`].
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use mongofake_core::query::{Filter, FindOptions, SortDirection};
//!
//! let filter = Filter::parse(&doc! { "age": { "$gte": 18 }, "name": "Ann" })?;
//! let options = FindOptions::builder()
//!     .skip(1)
//!     .limit(10)
//!     .sort("age", SortDirection::Desc)
//!     .build();
//! ```

use bson::{Bson, Document, oid::ObjectId};
use std::fmt;

use crate::{
    document::ID_FIELD,
    error::{MongoFakeError, MongoFakeResult},
};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

impl SortDirection {
    /// Maps the driver's numeric direction (`1` or `-1`) to a [`SortDirection`].
    pub fn from_i32(direction: i32) -> MongoFakeResult<Self> {
        match direction {
            1 => Ok(SortDirection::Asc),
            -1 => Ok(SortDirection::Desc),
            other => Err(MongoFakeError::InvalidArgument(format!(
                "sort direction must be 1 or -1, got {other}"
            ))),
        }
    }
}

/// One sort key: the field to sort by and its direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Sort { field: field.into(), direction }
    }
}

/// Filter operators understood by the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Greater than or equal to.
    Gte,
    /// Less than or equal to.
    Lte,
    /// Not equal to.
    Ne,
    /// Value is one of the listed values.
    In,
    /// Value is none of the listed values.
    Nin,
    /// Field presence.
    Exists,
    /// Array contains every listed value.
    All,
}

impl FieldOp {
    /// Looks up an operator by its `$`-prefixed name.
    ///
    /// # Errors
    ///
    /// Returns [`MongoFakeError::UnsupportedOperator`] for names outside the supported set.
    pub fn from_name(name: &str) -> MongoFakeResult<Self> {
        Ok(match name {
            "$gt" => FieldOp::Gt,
            "$lt" => FieldOp::Lt,
            "$gte" => FieldOp::Gte,
            "$lte" => FieldOp::Lte,
            "$ne" => FieldOp::Ne,
            "$in" => FieldOp::In,
            "$nin" => FieldOp::Nin,
            "$exists" => FieldOp::Exists,
            "$all" => FieldOp::All,
            other => {
                log::warn!("rejecting unsupported query operator {other}");
                return Err(MongoFakeError::UnsupportedOperator(other.to_string()));
            }
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldOp::Gt => "$gt",
            FieldOp::Lt => "$lt",
            FieldOp::Gte => "$gte",
            FieldOp::Lte => "$lte",
            FieldOp::Ne => "$ne",
            FieldOp::In => "$in",
            FieldOp::Nin => "$nin",
            FieldOp::Exists => "$exists",
            FieldOp::All => "$all",
        }
    }

    /// Validates and normalizes the operator argument.
    fn check_argument(self, value: &Bson) -> MongoFakeResult<Bson> {
        match self {
            FieldOp::In | FieldOp::Nin | FieldOp::All => match value {
                Bson::Array(_) => Ok(value.clone()),
                _ => Err(MongoFakeError::InvalidQuery(format!("{} needs an array", self.as_str()))),
            },
            FieldOp::Exists => match value {
                Bson::Boolean(flag) => Ok(Bson::Boolean(*flag)),
                Bson::Int32(n) => Ok(Bson::Boolean(*n != 0)),
                Bson::Int64(n) => Ok(Bson::Boolean(*n != 0)),
                Bson::Double(n) => Ok(Bson::Boolean(*n != 0.0)),
                _ => Err(MongoFakeError::InvalidQuery("$exists needs a boolean".into())),
            },
            _ => Ok(value.clone()),
        }
    }
}

impl fmt::Display for FieldOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single top-level condition of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// The resolved field value must equal `value`.
    Literal {
        field: String,
        value: Bson,
    },
    /// Every operator must hold for the resolved field value.
    Operators {
        field: String,
        ops: Vec<(FieldOp, Bson)>,
    },
}

impl Criterion {
    pub fn field(&self) -> &str {
        match self {
            Criterion::Literal { field, .. } | Criterion::Operators { field, .. } => field,
        }
    }
}

/// A parsed filter specification; all criteria must hold (implicit AND).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    criteria: Vec<Criterion>,
}

impl Filter {
    /// A filter that matches every document.
    pub fn all() -> Self {
        Filter::default()
    }

    /// A filter matching the document with the given identifier.
    pub fn by_id(id: impl Into<Bson>) -> Self {
        Filter {
            criteria: vec![Criterion::Literal { field: ID_FIELD.to_string(), value: id.into() }],
        }
    }

    /// Parses a filter specification document.
    ///
    /// A sub-document whose keys all start with `$` is an operator mapping; one without
    /// any `$` key is a literal compared by equality.
    ///
    /// # Errors
    ///
    /// - [`MongoFakeError::UnsupportedOperator`] for top-level or field operators
    ///   outside the supported set
    /// - [`MongoFakeError::InvalidQuery`] for malformed operator arguments or a
    ///   sub-document mixing operators and plain keys
    pub fn parse(spec: &Document) -> MongoFakeResult<Self> {
        let mut criteria = Vec::with_capacity(spec.len());

        for (field, condition) in spec {
            if field.starts_with('$') {
                log::warn!("rejecting top-level query operator {field}");
                return Err(MongoFakeError::UnsupportedOperator(field.clone()));
            }

            let criterion = match condition {
                Bson::Document(sub) if is_operator_document(sub)? => Criterion::Operators {
                    field: field.clone(),
                    ops: sub
                        .iter()
                        .map(|(name, value)| {
                            let op = FieldOp::from_name(name)?;
                            Ok((op, op.check_argument(value)?))
                        })
                        .collect::<MongoFakeResult<Vec<_>>>()?,
                },
                value => Criterion::Literal { field: field.clone(), value: value.clone() },
            };
            criteria.push(criterion);
        }

        Ok(Filter { criteria })
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

fn is_operator_document(sub: &Document) -> MongoFakeResult<bool> {
    let operators = sub.keys().filter(|key| key.starts_with('$')).count();

    match operators {
        0 => Ok(false),
        n if n == sub.len() => Ok(true),
        _ => Err(MongoFakeError::InvalidQuery(
            "operator document cannot mix '$' keys and plain keys".into(),
        )),
    }
}

/// What a `find_one` or `remove` call selects: a filter, a bare identifier, or everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Selector {
    #[default]
    All,
    Filter(Document),
    Id(Bson),
}

impl Selector {
    /// Selects the document with the given identifier.
    pub fn id(id: impl Into<Bson>) -> Self {
        Selector::Id(id.into())
    }

    /// Normalizes the selector into a filter specification document.
    pub fn into_document(self) -> Document {
        match self {
            Selector::All => Document::new(),
            Selector::Filter(spec) => spec,
            Selector::Id(id) => {
                let mut spec = Document::new();
                spec.insert(ID_FIELD, id);
                spec
            }
        }
    }
}

impl From<Document> for Selector {
    fn from(spec: Document) -> Self {
        Selector::Filter(spec)
    }
}

impl From<ObjectId> for Selector {
    fn from(id: ObjectId) -> Self {
        Selector::Id(Bson::ObjectId(id))
    }
}

impl From<Option<Document>> for Selector {
    fn from(spec: Option<Document>) -> Self {
        spec.map(Selector::Filter).unwrap_or_default()
    }
}

/// Options accepted by `find`.
///
/// `limit == 0` means no limit and a negative limit behaves like its absolute value.
/// `skip` must not be negative. Use [`FindOptions::builder`] for ergonomic construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Fields to keep in each result; `_id` is always kept. An empty list keeps `_id` only.
    pub projection: Option<Vec<String>>,
    /// Number of leading results to drop.
    pub skip: i64,
    /// Maximum number of results.
    pub limit: i64,
    /// Sort keys applied left to right.
    pub sort: Option<Vec<Sort>>,
}

impl FindOptions {
    pub fn new() -> Self {
        FindOptions::default()
    }

    pub fn builder() -> FindOptionsBuilder {
        FindOptionsBuilder::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindOptionsBuilder {
    options: FindOptions,
}

impl FindOptionsBuilder {
    pub fn new() -> Self {
        FindOptionsBuilder { options: FindOptions::default() }
    }

    /// Restricts results to the given fields (plus `_id`).
    pub fn projection<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.options.skip = skip;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.options.limit = limit;
        self
    }

    /// Appends a sort key; keys are applied in the order they were added.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.options
            .sort
            .get_or_insert_with(Vec::new)
            .push(Sort::new(field, direction));
        self
    }

    pub fn build(self) -> FindOptions {
        self.options
    }
}

/// Walks the criteria of a parsed [`Filter`].
pub trait QueryVisitor {
    type Output;
    type Error: Into<MongoFakeError>;

    fn visit_literal(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error>;
    fn visit_operators(
        &mut self,
        field: &str,
        ops: &[(FieldOp, Bson)],
    ) -> Result<Self::Output, Self::Error>;

    fn visit_criterion(&mut self, criterion: &Criterion) -> Result<Self::Output, Self::Error> {
        match criterion {
            Criterion::Literal { field, value } => self.visit_literal(field, value),
            Criterion::Operators { field, ops } => self.visit_operators(field, ops),
        }
    }
}
