use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::fmt;

use crate::auth::session::CurrentUser;
use crate::models::{choice, question};
use crate::models::question::Question;
use super::queries;
use super::types::VoteOutcome;

/// Why a vote was refused. Each variant has its own response at the handler boundary.
#[derive(Debug)]
pub enum VoteError {
    /// No question with the requested id, or one that is not published yet.
    NotFound,
    /// Choice id missing or not one of this question's choices.
    InvalidChoice { question: Question },
    Unauthenticated,
    /// Outside the voting window.
    VotingClosed { question_id: i64, question_text: String },
    /// The write lost a race twice in a row.
    Conflict,
    Db(sqlx::Error),
}

impl fmt::Display for VoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteError::NotFound => write!(f, "Question does not exist"),
            VoteError::InvalidChoice { .. } => write!(f, "You didn't select a choice."),
            VoteError::Unauthenticated => write!(f, "You must be logged in to vote."),
            VoteError::VotingClosed { question_text, .. } => {
                write!(f, "{}", closed_message(question_text))
            }
            VoteError::Conflict => write!(f, "Your vote could not be saved. Please try again."),
            VoteError::Db(e) => write!(f, "Database error: {e}"),
        }
    }
}

impl std::error::Error for VoteError {}

impl From<sqlx::Error> for VoteError {
    fn from(e: sqlx::Error) -> Self {
        VoteError::Db(e)
    }
}

/// Message shown when a question is published but no longer (or not yet) votable.
pub fn closed_message(question_text: &str) -> String {
    format!("You are not allowed to vote on question \"{question_text}\"")
}

pub fn results_url(question_id: i64) -> String {
    format!("/polls/{question_id}/results/")
}

/// A recorded vote and where to send the voter next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastVote {
    pub outcome: VoteOutcome,
    pub redirect_to: String,
}

/// Record `user`'s vote for `choice_id` on `question_id` at instant `now`.
///
/// A repeat vote on the same question moves the existing row to the new choice;
/// there is never more than one vote per (user, question).
pub async fn cast_vote(
    pool: &PgPool,
    question_id: i64,
    choice_id: Option<i64>,
    user: Option<&CurrentUser>,
    now: DateTime<Utc>,
) -> Result<CastVote, VoteError> {
    let question = question::find_by_id(pool, question_id)
        .await?
        .filter(|q| q.is_published(now))
        .ok_or(VoteError::NotFound)?;

    let selected = match choice_id {
        Some(id) => choice::find_in_question(pool, question.id, id).await?,
        None => None,
    };
    let Some(selected) = selected else {
        return Err(VoteError::InvalidChoice { question });
    };

    let user = user.ok_or(VoteError::Unauthenticated)?;
    // A session can outlive its account.
    if crate::models::user::find_by_id(pool, user.id).await?.is_none() {
        return Err(VoteError::Unauthenticated);
    }

    if !question.can_vote(now) {
        return Err(VoteError::VotingClosed {
            question_id: question.id,
            question_text: question.question_text,
        });
    }

    let outcome = match queries::upsert(pool, user.id, &selected).await {
        Ok(outcome) => outcome,
        Err(e) if queries::is_unique_violation(&e) => {
            log::warn!(
                "Concurrent vote by user {} on question {}, retrying once",
                user.id,
                question.id
            );
            match queries::upsert(pool, user.id, &selected).await {
                Ok(outcome) => outcome,
                Err(e) if queries::is_unique_violation(&e) => return Err(VoteError::Conflict),
                Err(e) => return Err(e.into()),
            }
        }
        Err(e) => return Err(e.into()),
    };

    Ok(CastVote {
        outcome,
        redirect_to: results_url(question.id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_message_quotes_question_text() {
        assert_eq!(
            closed_message("Best editor?"),
            "You are not allowed to vote on question \"Best editor?\""
        );
    }

    #[test]
    fn voting_closed_displays_the_warning() {
        let err = VoteError::VotingClosed {
            question_id: 4,
            question_text: "Lunch?".to_string(),
        };
        assert_eq!(err.to_string(), "You are not allowed to vote on question \"Lunch?\"");
    }

    #[test]
    fn results_url_points_at_results_view() {
        assert_eq!(results_url(12), "/polls/12/results/");
    }
}
