use chrono::{DateTime, Utc};

/// A stored submission row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Submission {
    pub id: i64,
    pub name: String,
    pub contact: String,
    pub age: i64,
    pub submission_timestamp: DateTime<Utc>,
}

/// A validated submission that has not been written anywhere yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub name: String,
    pub contact: String,
    pub age: i64,
}
