//! In-memory evaluation of a [`QueryPlan`].
//!
//! Semantics match the SQL compilation in the persistence layer: a null
//! field never satisfies an equality or range filter, nulls sort first in
//! ascending order, and search is a case-insensitive literal substring test.

use std::cmp::Ordering;

use super::{Condition, Filter, FieldValue, Page, QueryPlan, Queryable, RangeOp, Scope, SortDirection};

impl Scope {
    /// Whether a document falls inside this base read scope.
    pub fn admits(&self, doc: &impl Queryable) -> bool {
        match *self {
            Scope::CreatedBy(user_id) => doc.field_value("createdBy") == FieldValue::Integer(user_id),
            Scope::Member(user_id) => {
                doc.field_value("owner") == FieldValue::Integer(user_id)
                    || matches!(doc.field_value("members"), FieldValue::IdList(ids) if ids.contains(&user_id))
            }
        }
    }
}

impl Filter {
    pub fn matches(&self, doc: &impl Queryable) -> bool {
        let actual = doc.field_value(self.field.name);
        match &self.condition {
            Condition::Eq(expected) => match (&actual, expected) {
                (FieldValue::TextList(items), FieldValue::Text(s)) => items.contains(s),
                (FieldValue::IdList(ids), FieldValue::Integer(id)) => ids.contains(id),
                _ => actual.compare_scalar(expected) == Some(Ordering::Equal),
            },
            Condition::In(set) => match &actual {
                FieldValue::Text(s) => set.contains(s),
                FieldValue::TextList(items) => items.iter().any(|item| set.contains(item)),
                _ => false,
            },
            Condition::Range(op, bound) => match actual.compare_scalar(bound) {
                Some(ord) => match op {
                    RangeOp::Gt => ord == Ordering::Greater,
                    RangeOp::Gte => ord != Ordering::Less,
                    RangeOp::Lt => ord == Ordering::Less,
                    RangeOp::Lte => ord != Ordering::Greater,
                },
                None => false,
            },
        }
    }
}

impl QueryPlan {
    /// Filter and search stages.
    pub fn matches(&self, doc: &impl Queryable) -> bool {
        self.filters.iter().all(|f| f.matches(doc)) && self.matches_search(doc)
    }

    fn matches_search(&self, doc: &impl Queryable) -> bool {
        let Some(needle) = &self.search else {
            return true;
        };
        let needle = needle.to_lowercase();
        self.search_fields().any(|field| match doc.field_value(field.name) {
            FieldValue::Text(text) => text.to_lowercase().contains(&needle),
            _ => false,
        })
    }

    /// Sort stage comparator.
    pub fn compare(&self, a: &impl Queryable, b: &impl Queryable) -> Ordering {
        for key in &self.sort {
            let va = a.field_value(key.field.name);
            let vb = b.field_value(key.field.name);
            let ord = match (va.is_null(), vb.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => va.compare_scalar(&vb).unwrap_or(Ordering::Equal),
            };
            let ord = match key.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Run every stage over an already-scoped set of documents.
    pub fn execute<T: Queryable>(&self, docs: impl IntoIterator<Item = T>) -> Page<T> {
        let mut matched: Vec<T> = docs.into_iter().filter(|d| self.matches(d)).collect();
        matched.sort_by(|a, b| self.compare(a, b));

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
            .take(self.limit as usize)
            .collect();

        Page { items, total }
    }
}
