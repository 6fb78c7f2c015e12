//! PostgreSQL-backed [`Store`](crate::Store).

mod project_repo;
mod query;
mod todo_repo;
mod user_repo;

use async_trait::async_trait;

use crate::repositories::Store;
use crate::{DbError, DbPool};

/// Repositories over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
