//! Document persistence for users, projects and todos.
//!
//! Two interchangeable [`Store`] implementations: [`PgStore`] for PostgreSQL
//! and [`MemoryStore`] for development and tests.

pub mod memory;
pub mod models;
pub mod pg;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;

pub use memory::MemoryStore;
pub use pg::PgStore;
pub use repositories::{ProjectRepository, Store, TodoRepository, UserRepository};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Apply the embedded migrations in `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A unique key (email, username) is already taken.
    #[error("Duplicate field value entered for '{field}'")]
    Duplicate { field: &'static str },

    /// A stored value could not be decoded into its domain type.
    #[error("Corrupt stored value: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        // PostgreSQL unique constraint violation: error code 23505
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                match db_err.constraint() {
                    Some("uq_users_email") => return DbError::Duplicate { field: "email" },
                    Some("uq_users_username") => return DbError::Duplicate { field: "username" },
                    other => tracing::warn!(constraint = ?other, "unmapped unique violation"),
                }
            }
        }
        DbError::Sqlx(err)
    }
}
