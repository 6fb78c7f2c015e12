/// All document identifiers are PostgreSQL BIGSERIAL (or their in-memory equivalent).
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
