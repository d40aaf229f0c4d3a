use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::{NewSubmission, Submission};

pub async fn create(pool: &SqlitePool, new: &NewSubmission) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "INSERT INTO users (name, contact, age, submission_timestamp)
         VALUES (?, ?, ?, ?) RETURNING *",
    )
    .bind(&new.name)
    .bind(&new.contact)
    .bind(new.age)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}
