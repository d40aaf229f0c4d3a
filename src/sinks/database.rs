use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{SinkError, SinkOutcome, SubmissionSink};
use crate::db;
use crate::models::NewSubmission;

/// Inserts one row per submission into the `users` table.
pub struct DatabaseSink {
    pool: SqlitePool,
}

impl DatabaseSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionSink for DatabaseSink {
    fn id(&self) -> &str {
        "database"
    }

    async fn store(&self, submission: &NewSubmission) -> Result<SinkOutcome, SinkError> {
        let row = db::submissions::create(&self.pool, submission).await?;
        tracing::debug!("Inserted users row {}", row.id);
        Ok(SinkOutcome::default())
    }
}
