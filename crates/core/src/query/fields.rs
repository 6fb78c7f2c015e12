//! Field descriptors for queryable document collections.
//!
//! A [`Collection`] whitelists which document fields a listing query may
//! filter or sort on, and maps each API field name to its storage column.
//! Nothing outside this registry ever reaches a query.

use std::cmp::Ordering;

use crate::types::{DbId, Timestamp};

/// How a field's raw query-string value is parsed and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, exact-match on equality.
    Text,
    /// Enumerated text; a comma-separated value becomes set membership.
    Keyword,
    /// List of strings (e.g. tags); matches when any element is in the set.
    TextList,
    Integer,
    Timestamp,
    /// Reference to another document.
    Id,
    /// List of references (e.g. project members).
    IdList,
    Bool,
}

impl FieldKind {
    /// Comma-separated values on these kinds are treated as "one of".
    pub fn is_set_valued(self) -> bool {
        matches!(self, FieldKind::Keyword | FieldKind::TextList)
    }

    pub fn is_list(self) -> bool {
        matches!(self, FieldKind::TextList | FieldKind::IdList)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Document (API) field name, camelCase.
    pub name: &'static str,
    /// Storage column name.
    pub column: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self { name, column, kind }
    }
}

/// Static description of a queryable collection.
#[derive(Debug)]
pub struct Collection {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
    /// Fields the `search` parameter matches against (logical OR).
    pub search_fields: &'static [&'static str],
    /// Sort used when the caller supplies none, e.g. `-createdAt`.
    pub default_sort: &'static str,
}

impl Collection {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        let fields: &'static [FieldSpec] = self.fields;
        fields.iter().find(|f| f.name == name)
    }

    /// The identifier field every collection must declare as `id`.
    pub fn id_field(&self) -> &'static FieldSpec {
        self.field("id")
            .unwrap_or_else(|| panic!("collection {} declares no id field", self.name))
    }
}

/// A typed field value, either read from a document or parsed from a query.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Bool(bool),
    Timestamp(Timestamp),
    TextList(Vec<String>),
    IdList(Vec<DbId>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Compare two scalar values of the same type. Lists, nulls and mixed
    /// types are incomparable.
    pub fn compare_scalar(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Text)
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Integer)
    }
}

impl From<Option<i32>> for FieldValue {
    fn from(value: Option<i32>) -> Self {
        value.map_or(FieldValue::Null, |v| FieldValue::Integer(i64::from(v)))
    }
}

impl From<Option<Timestamp>> for FieldValue {
    fn from(value: Option<Timestamp>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Timestamp)
    }
}

/// A document that can be evaluated against a query plan in memory.
pub trait Queryable {
    /// Value of the named document field, [`FieldValue::Null`] when absent.
    fn field_value(&self, name: &str) -> FieldValue;
}
