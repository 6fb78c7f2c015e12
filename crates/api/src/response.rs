//! Success envelope shared by every API handler.
//!
//! All responses use `{ "success": true, "data": ..., "timestamp": ... }`,
//! optionally carrying `message`, `token`, `count` and `pagination`.
//! Failures use the matching envelope rendered by [`AppError`](crate::error::AppError).

use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use taskhub_core::query::{Page, QueryPlan};

use crate::error::{AppError, AppResult};

/// ISO-8601 UTC timestamp with millisecond precision.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Standard success envelope.
///
/// ```ignore
/// Ok(ApiResponse::new(todo).with_message("Todo status updated"))
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    pub data: T,
    pub timestamp: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            message: None,
            token: None,
            count: None,
            pagination: None,
            data,
            timestamp: now_iso(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }
}

impl ApiResponse<Vec<Value>> {
    /// Envelope for one page of a listing: `count` is the page length and
    /// `pagination` reports the window against the full match count.
    pub fn page<T: Serialize>(
        page: Page<T>,
        plan: &QueryPlan,
        total_key: TotalKey,
    ) -> AppResult<Self> {
        let total = page.total;
        let items = project_fields(page.items, plan.fields.as_deref())?;
        let mut response = Self::new(items);
        response.count = Some(response.data.len());
        response.pagination = Some(Pagination::new(plan, total, total_key));
        Ok(response)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Which collection a [`Pagination`] total counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalKey {
    Todos,
    Projects,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_todos: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_projects: Option<u64>,
}

impl Pagination {
    pub fn new(plan: &QueryPlan, total: u64, key: TotalKey) -> Self {
        Self {
            current_page: plan.page,
            total_pages: plan.total_pages(total),
            total_todos: (key == TotalKey::Todos).then_some(total),
            total_projects: (key == TotalKey::Projects).then_some(total),
        }
    }
}

/// Serializable `{}` payload for delete responses.
#[derive(Debug, Serialize)]
pub struct Empty {}

/// Serialize documents and, when `fields` is given, keep only those keys
/// (plus `id`, which is always returned).
pub fn project_fields<T: Serialize>(
    items: Vec<T>,
    fields: Option<&[String]>,
) -> AppResult<Vec<Value>> {
    items
        .into_iter()
        .map(|item| {
            let value = serde_json::to_value(item)
                .map_err(|e| AppError::InternalError(format!("serialize document: {e}")))?;
            Ok(match (fields, value) {
                (Some(fields), Value::Object(map)) => Value::Object(
                    map.into_iter()
                        .filter(|(key, _)| key == "id" || fields.iter().any(|f| f == key))
                        .collect::<Map<String, Value>>(),
                ),
                (_, value) => value,
            })
        })
        .collect()
}
