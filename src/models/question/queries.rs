use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::choice;
use super::types::*;

/// Number of questions on the index page.
pub const RECENT_LIMIT: i64 = 5;

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        "SELECT id, question_text, pub_date, end_date FROM question WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Like [`find_by_id`], but a missing question is an error.
pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Question, AppError> {
    find_by_id(pool, id).await?.ok_or(AppError::NotFound)
}

/// Published questions, newest first. Equal `pub_date`s keep creation order.
pub async fn list_recent(
    pool: &PgPool,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        "SELECT id, question_text, pub_date, end_date \
         FROM question \
         WHERE pub_date <= $1 \
         ORDER BY pub_date DESC, id ASC \
         LIMIT $2",
    )
    .bind(now)
    .bind(limit.max(0))
    .fetch_all(pool)
    .await
}

/// Questions with their choice counts for the admin list, narrowed by `filter`.
pub async fn list_for_admin(
    pool: &PgPool,
    filter: &AdminQuestionFilter,
    now: DateTime<Utc>,
) -> Result<Vec<QuestionAdminRow>, sqlx::Error> {
    let pattern = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", escape_like(s)));
    let (from, until) = match filter.published.map(|f| f.bounds(now)) {
        Some((from, until)) => (Some(from), Some(until)),
        None => (None, None),
    };

    sqlx::query_as::<_, QuestionAdminRow>(
        "SELECT q.id, q.question_text, q.pub_date, q.end_date, COUNT(c.id) AS choice_count \
         FROM question q \
         LEFT JOIN choice c ON c.question_id = q.id \
         WHERE ($1::TEXT IS NULL OR q.question_text ILIKE $1) \
           AND ($2::TIMESTAMPTZ IS NULL OR q.pub_date >= $2) \
           AND ($3::TIMESTAMPTZ IS NULL OR q.pub_date < $3) \
         GROUP BY q.id \
         ORDER BY q.pub_date DESC, q.id ASC",
    )
    .bind(pattern)
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await
}

/// Make `%`, `_` and `\` match literally inside a LIKE pattern.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Insert a question and its choices in one transaction. Returns the question id.
pub async fn create(pool: &PgPool, new: &NewQuestion) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let question_id: i64 = sqlx::query_scalar(
        "INSERT INTO question (question_text, pub_date, end_date) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(new.question_text.trim())
    .bind(new.pub_date)
    .bind(new.end_date)
    .fetch_one(&mut *tx)
    .await?;

    for text in new.choices.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        choice::create(&mut *tx, question_id, text).await?;
    }

    tx.commit().await?;
    Ok(question_id)
}

/// Delete a question; choices and votes go with it. Returns false if nothing matched.
pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM question WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
