//! Query shaping for listing endpoints.
//!
//! Turns an untrusted bag of query-string pairs into a [`QueryPlan`] with
//! four independent stages:
//!
//! 1. **Filter** -- every non-reserved key is an equality filter, a range
//!    filter (`field[gte]=5`), or, for set-valued fields such as `status`,
//!    `priority` and `tags`, a comma-separated "one of" list.
//! 2. **Search** -- `search=foo` matches the collection's search fields
//!    case-insensitively as a substring (OR across fields).
//! 3. **Sort** -- `sort=a,-b`; defaults to the collection's default sort.
//! 4. **Paginate** -- `page` (default 1) and `limit` (default 100).
//!
//! All stages narrow with logical AND. The plan is storage-agnostic: it is
//! evaluated in memory by [`QueryPlan::execute`] or compiled to SQL by the
//! persistence layer.

mod eval;
pub mod fields;

use chrono::{NaiveDate, Utc};

pub use fields::{Collection, FieldKind, FieldSpec, FieldValue, Queryable};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Default page number.
pub const DEFAULT_PAGE: u64 = 1;

/// Default page size.
pub const DEFAULT_LIMIT: u64 = 100;

/// Maximum page size.
pub const MAX_LIMIT: u64 = 1000;

/// Query-string keys that never become filters.
pub const RESERVED_KEYS: &[&str] = &["page", "sort", "limit", "fields", "search"];

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeOp {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    /// SQL comparison operator.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Scalar equality, or "contains" on list fields.
    Eq(FieldValue),
    /// Value is one of the set (any overlap on list fields).
    In(Vec<String>),
    Range(RangeOp, FieldValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: &'static FieldSpec,
    pub condition: Condition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: &'static FieldSpec,
    pub direction: SortDirection,
}

/// Base read scope a listing is confined to before any caller filters apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Documents whose `createdBy` is the user.
    CreatedBy(DbId),
    /// Documents whose `owner` is the user or whose `members` contain them.
    Member(DbId),
}

/// One page of a listing plus the total match count ignoring the window.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// A fully-specified, whitelisted read query over one collection.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub collection: &'static Collection,
    pub filters: Vec<Filter>,
    pub search: Option<String>,
    pub sort: Vec<SortKey>,
    pub page: u64,
    pub limit: u64,
    /// Document keys to project results onto (`fields=title,status`).
    pub fields: Option<Vec<String>>,
}

impl QueryPlan {
    /// A plan with no filters, default sort and default window.
    pub fn all(collection: &'static Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            search: None,
            sort: with_tiebreak(collection, parse_sort(collection, collection.default_sort)),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            fields: None,
        }
    }

    /// Build a plan from raw query-string pairs.
    ///
    /// Unknown keys are ignored. Malformed values for known fields and
    /// unsupported operators are validation failures.
    pub fn parse(
        collection: &'static Collection,
        params: &[(String, String)],
    ) -> Result<Self, CoreError> {
        let mut plan = Self::all(collection);
        let mut sort_param: Option<&str> = None;

        for (key, value) in params {
            match key.as_str() {
                "page" => plan.page = parse_positive(value).unwrap_or(DEFAULT_PAGE),
                "limit" => {
                    plan.limit = parse_positive(value).unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
                }
                "sort" => sort_param = Some(value.as_str()),
                "search" => {
                    plan.search = (!value.is_empty()).then(|| value.clone());
                }
                "fields" => {
                    let fields: Vec<String> = split_list(value).map(str::to_string).collect();
                    plan.fields = (!fields.is_empty()).then_some(fields);
                }
                _ => {
                    if let Some(filter) = parse_filter(collection, key, value)? {
                        plan.filters.push(filter);
                    }
                }
            }
        }

        if let Some(sort) = sort_param {
            let keys = parse_sort(collection, sort);
            if !keys.is_empty() {
                plan.sort = with_tiebreak(collection, keys);
            }
        }

        Ok(plan)
    }

    /// Number of records skipped before the window. Saturates for
    /// absurd page numbers, which then simply yield an empty window.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `ceil(total / limit)`.
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }

    /// Search fields of the collection resolved to their specs.
    pub fn search_fields(&self) -> impl Iterator<Item = &'static FieldSpec> + '_ {
        self.collection
            .search_fields
            .iter()
            .filter_map(|name| self.collection.field(name))
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn parse_positive(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|v| *v > 0)
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Split `field[op]` into `("field", Some("op"))`.
fn split_key(key: &str) -> (&str, Option<&str>) {
    if let Some(stripped) = key.strip_suffix(']') {
        if let Some((field, op)) = stripped.split_once('[') {
            return (field, Some(op));
        }
    }
    (key, None)
}

fn parse_filter(
    collection: &'static Collection,
    key: &str,
    value: &str,
) -> Result<Option<Filter>, CoreError> {
    let (name, op) = split_key(key);
    if RESERVED_KEYS.contains(&name) {
        return Ok(None);
    }
    let Some(field) = collection.field(name) else {
        tracing::debug!(collection = collection.name, key, "Ignoring unknown filter key");
        return Ok(None);
    };

    let condition = match op {
        Some(op) => {
            let op = RangeOp::parse(op).ok_or_else(|| {
                CoreError::Validation(format!("Unsupported filter operator '{op}' on '{name}'"))
            })?;
            if field.kind.is_list() {
                return Err(CoreError::Validation(format!(
                    "Range filters are not supported on list field '{name}'"
                )));
            }
            Condition::Range(op, parse_value(field, value)?)
        }
        None if field.kind.is_set_valued() => {
            Condition::In(split_list(value).map(str::to_string).collect())
        }
        None => Condition::Eq(parse_value(field, value)?),
    };

    Ok(Some(Filter { field, condition }))
}

/// Parse a raw query value according to the field's kind.
fn parse_value(field: &FieldSpec, raw: &str) -> Result<FieldValue, CoreError> {
    let invalid = || {
        CoreError::Validation(format!(
            "Invalid value '{raw}' for field '{}'",
            field.name
        ))
    };

    match field.kind {
        FieldKind::Text | FieldKind::Keyword | FieldKind::TextList => {
            Ok(FieldValue::Text(raw.to_string()))
        }
        FieldKind::Integer | FieldKind::Id | FieldKind::IdList => raw
            .trim()
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| invalid()),
        FieldKind::Bool => match raw.trim() {
            "true" => Ok(FieldValue::Bool(true)),
            "false" => Ok(FieldValue::Bool(false)),
            _ => Err(invalid()),
        },
        FieldKind::Timestamp => parse_timestamp(raw.trim())
            .map(FieldValue::Timestamp)
            .ok_or_else(invalid),
    }
}

/// Accept RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_sort(collection: &'static Collection, raw: &str) -> Vec<SortKey> {
    split_list(raw)
        .filter_map(|entry| {
            let (name, direction) = match entry.strip_prefix('-') {
                Some(name) => (name, SortDirection::Desc),
                None => (entry, SortDirection::Asc),
            };
            let field = collection.field(name);
            if field.is_none() {
                tracing::debug!(collection = collection.name, name, "Ignoring unknown sort key");
            }
            field.map(|field| SortKey { field, direction })
        })
        .collect()
}

/// Append an `id` key in the leading direction so ordering is total.
fn with_tiebreak(collection: &'static Collection, mut keys: Vec<SortKey>) -> Vec<SortKey> {
    let id = collection.id_field();
    if !keys.iter().any(|k| k.field == id) {
        let direction = keys
            .first()
            .map_or(SortDirection::Asc, |k| k.direction);
        keys.push(SortKey {
            field: id,
            direction,
        });
    }
    keys
}
