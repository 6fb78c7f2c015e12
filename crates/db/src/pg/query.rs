//! Compiles a [`QueryPlan`] into parameterized PostgreSQL.
//!
//! Column names are taken only from the collection's field registry; every
//! caller-supplied value is bound. The generated SQL mirrors the in-memory
//! evaluator: nulls never satisfy a comparison, ascending sorts put nulls
//! first, and search is an escaped case-insensitive `ILIKE`.

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use taskhub_core::query::{
    Condition, FieldKind, FieldValue, Filter, Page, QueryPlan, Scope, SortDirection,
};

/// Append the base scope predicate. Must be the first predicate after `WHERE`.
pub(crate) fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: Scope) {
    match scope {
        Scope::CreatedBy(user_id) => {
            qb.push("created_by = ").push_bind(user_id);
        }
        Scope::Member(user_id) => {
            qb.push("(owner_id = ")
                .push_bind(user_id)
                .push(" OR ")
                .push_bind(user_id)
                .push(" = ANY(member_ids))");
        }
    }
}

/// Append every filter and the search clause, each prefixed with `AND`.
pub(crate) fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, plan: &QueryPlan) {
    for filter in &plan.filters {
        qb.push(" AND ");
        push_filter(qb, filter);
    }

    if let Some(search) = &plan.search {
        let columns: Vec<&str> = plan.search_fields().map(|f| f.column).collect();
        if columns.is_empty() {
            return;
        }
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (");
        for (i, column) in columns.into_iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(column)
                .push(" ILIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\'");
        }
        qb.push(")");
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    let column = filter.field.column;
    match &filter.condition {
        Condition::Eq(value) if filter.field.kind.is_list() => {
            push_value(qb, value);
            qb.push(" = ANY(").push(column).push(")");
        }
        Condition::Eq(value) => {
            qb.push(column).push(" = ");
            push_value(qb, value);
        }
        Condition::In(set) if filter.field.kind == FieldKind::TextList => {
            qb.push(column).push(" && ").push_bind(set.clone());
        }
        Condition::In(set) => {
            qb.push(column).push(" = ANY(").push_bind(set.clone()).push(")");
        }
        Condition::Range(op, value) => {
            qb.push(column).push(" ").push(op.as_sql()).push(" ");
            push_value(qb, value);
        }
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Text(s) => {
            qb.push_bind(s.clone());
        }
        FieldValue::Integer(i) => {
            qb.push_bind(*i);
        }
        FieldValue::Bool(b) => {
            qb.push_bind(*b);
        }
        FieldValue::Timestamp(ts) => {
            qb.push_bind(*ts);
        }
        FieldValue::TextList(items) => {
            qb.push_bind(items.clone());
        }
        FieldValue::IdList(ids) => {
            qb.push_bind(ids.clone());
        }
        // `NULL` compares unknown, so the predicate admits nothing.
        FieldValue::Null => {
            qb.push("NULL");
        }
    }
}

fn push_order(qb: &mut QueryBuilder<'_, Postgres>, plan: &QueryPlan) {
    qb.push(" ORDER BY ");
    for (i, key) in plan.sort.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(key.field.column).push(match key.direction {
            SortDirection::Asc => " ASC NULLS FIRST",
            SortDirection::Desc => " DESC NULLS LAST",
        });
    }
}

/// Escape `LIKE` metacharacters so the search term matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Run the windowed select and the matching count concurrently.
pub(crate) async fn fetch_page<R>(
    pool: &PgPool,
    table: &str,
    columns: &str,
    scope: Scope,
    plan: &QueryPlan,
) -> Result<Page<R>, sqlx::Error>
where
    R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut count = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {table} WHERE "));
    push_scope(&mut count, scope);
    push_conditions(&mut count, plan);

    let mut select =
        QueryBuilder::<Postgres>::new(format!("SELECT {columns} FROM {table} WHERE "));
    push_scope(&mut select, scope);
    push_conditions(&mut select, plan);
    push_order(&mut select, plan);
    select
        .push(" LIMIT ")
        .push_bind(i64::try_from(plan.limit).unwrap_or(i64::MAX))
        .push(" OFFSET ")
        .push_bind(i64::try_from(plan.offset()).unwrap_or(i64::MAX));

    tracing::debug!(table, sql = select.sql(), "list query");

    let (total, items) = futures::try_join!(
        count.build_query_scalar::<i64>().fetch_one(pool),
        select.build_query_as::<R>().fetch_all(pool),
    )?;

    Ok(Page {
        items,
        total: total.max(0) as u64,
    })
}
