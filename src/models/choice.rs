use serde::Serialize;
use sqlx::{PgExecutor, PgPool};

/// One selectable answer of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub choice_text: String,
}

/// A choice paired with its live vote count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ChoiceWithCount {
    pub id: i64,
    pub choice_text: String,
    pub votes: i64,
}

pub async fn find_for_question(pool: &PgPool, question_id: i64) -> Result<Vec<Choice>, sqlx::Error> {
    sqlx::query_as::<_, Choice>(
        "SELECT id, question_id, choice_text FROM choice WHERE question_id = $1 ORDER BY id",
    )
    .bind(question_id)
    .fetch_all(pool)
    .await
}

/// Look a choice up inside one question's choice set. A choice id that belongs to
/// another question is reported as absent.
pub async fn find_in_question<'e>(
    executor: impl PgExecutor<'e>,
    question_id: i64,
    choice_id: i64,
) -> Result<Option<Choice>, sqlx::Error> {
    sqlx::query_as::<_, Choice>(
        "SELECT id, question_id, choice_text FROM choice WHERE id = $1 AND question_id = $2",
    )
    .bind(choice_id)
    .bind(question_id)
    .fetch_optional(executor)
    .await
}

/// Choices of a question with vote counts computed from the vote table.
pub async fn with_vote_counts(pool: &PgPool, question_id: i64) -> Result<Vec<ChoiceWithCount>, sqlx::Error> {
    sqlx::query_as::<_, ChoiceWithCount>(
        "SELECT c.id, c.choice_text, COUNT(v.id) AS votes \
         FROM choice c \
         LEFT JOIN vote v ON v.choice_id = c.id \
         WHERE c.question_id = $1 \
         GROUP BY c.id, c.choice_text \
         ORDER BY c.id",
    )
    .bind(question_id)
    .fetch_all(pool)
    .await
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    question_id: i64,
    choice_text: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("INSERT INTO choice (question_id, choice_text) VALUES ($1, $2) RETURNING id")
        .bind(question_id)
        .bind(choice_text.trim())
        .fetch_one(executor)
        .await
}
