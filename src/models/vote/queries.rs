use sqlx::PgPool;

use crate::models::choice::Choice;
use super::types::*;

/// The user's vote on a question, found through the question's choice set.
pub async fn find_for_user_and_question(
    pool: &PgPool,
    user_id: i64,
    question_id: i64,
) -> Result<Option<VoteSelection>, sqlx::Error> {
    sqlx::query_as::<_, VoteSelection>(
        "SELECT v.id AS vote_id, c.id AS choice_id, c.choice_text \
         FROM vote v \
         JOIN choice c ON c.id = v.choice_id \
         WHERE v.user_id = $1 AND c.question_id = $2",
    )
    .bind(user_id)
    .bind(question_id)
    .fetch_optional(pool)
    .await
}

/// All vote rows cast on a question.
pub async fn find_for_question(pool: &PgPool, question_id: i64) -> Result<Vec<Vote>, sqlx::Error> {
    sqlx::query_as::<_, Vote>(
        "SELECT v.id, v.user_id, v.choice_id \
         FROM vote v \
         JOIN choice c ON c.id = v.choice_id \
         WHERE c.question_id = $1 \
         ORDER BY v.id",
    )
    .bind(question_id)
    .fetch_all(pool)
    .await
}

/// Point the user's vote on `choice.question_id` at `choice`, inserting it if absent.
///
/// Runs as a single transaction holding a row lock on the existing vote. The
/// `(user_id, question_id)` unique key catches two first votes racing each other;
/// the loser surfaces as a unique violation, which the caller may retry.
pub async fn upsert(pool: &PgPool, user_id: i64, choice: &Choice) -> Result<VoteOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let existing: Option<(i64, i64)> = sqlx::query_as(
        "SELECT v.id, v.choice_id \
         FROM vote v \
         JOIN choice c ON c.id = v.choice_id \
         WHERE v.user_id = $1 AND c.question_id = $2 \
         FOR UPDATE OF v",
    )
    .bind(user_id)
    .bind(choice.question_id)
    .fetch_optional(&mut *tx)
    .await?;

    let outcome = match existing {
        Some((vote_id, previous_choice_id)) => {
            sqlx::query("UPDATE vote SET choice_id = $1, question_id = $2 WHERE id = $3")
                .bind(choice.id)
                .bind(choice.question_id)
                .bind(vote_id)
                .execute(&mut *tx)
                .await?;
            VoteOutcome::Changed { vote_id, previous_choice_id }
        }
        None => {
            let vote_id: i64 = sqlx::query_scalar(
                "INSERT INTO vote (user_id, choice_id, question_id) VALUES ($1, $2, $3) RETURNING id",
            )
            .bind(user_id)
            .bind(choice.id)
            .bind(choice.question_id)
            .fetch_one(&mut *tx)
            .await?;
            VoteOutcome::Created { vote_id }
        }
    };

    tx.commit().await?;
    Ok(outcome)
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}
