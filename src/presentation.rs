//! View contexts for the poll screens.
//!
//! Each builder gathers what one screen shows and applies the visibility rules for it.
//! Rendering is left to the template structs in `templates_structs`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::auth::session::CurrentUser;
use crate::errors::AppError;
use crate::models::choice::{self, Choice, ChoiceWithCount};
use crate::models::question::{self, Question};
use crate::models::vote;

#[derive(Debug, Clone, Serialize)]
pub struct IndexContext {
    pub latest_question_list: Vec<Question>,
}

#[derive(Debug, Clone)]
pub struct DetailContext {
    pub question: Question,
    pub choices: Vec<Choice>,
    /// Text of the viewer's current vote, if they have one.
    pub selected_choice: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultsContext {
    pub question: Question,
    pub choices_with_counts: Vec<ChoiceWithCount>,
}

impl ResultsContext {
    pub fn total_votes(&self) -> i64 {
        self.choices_with_counts.iter().map(|c| c.votes).sum()
    }
}

/// Whether the detail (voting) page may be shown for a question at `now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailAccess {
    /// Not published yet; treated as nonexistent.
    NotFound,
    /// Published but outside the voting window.
    RedirectToResults { message: String },
    Render,
}

pub fn detail_access(question: &Question, now: DateTime<Utc>) -> DetailAccess {
    if !question.is_published(now) {
        DetailAccess::NotFound
    } else if !question.can_vote(now) {
        DetailAccess::RedirectToResults {
            message: vote::closed_message(&question.question_text),
        }
    } else {
        DetailAccess::Render
    }
}

/// Outcome of preparing the detail screen.
#[derive(Debug, Clone)]
pub enum DetailView {
    Render(DetailContext),
    RedirectToResults { question_id: i64, message: String },
}

pub async fn index_context(pool: &PgPool, now: DateTime<Utc>) -> Result<IndexContext, AppError> {
    let latest_question_list = question::list_recent(pool, now, question::RECENT_LIMIT).await?;
    Ok(IndexContext { latest_question_list })
}

pub async fn detail_context(
    pool: &PgPool,
    question_id: i64,
    user: Option<&CurrentUser>,
    now: DateTime<Utc>,
) -> Result<DetailView, AppError> {
    let question = question::get_by_id(pool, question_id).await?;

    match detail_access(&question, now) {
        DetailAccess::NotFound => return Err(AppError::NotFound),
        DetailAccess::RedirectToResults { message } => {
            return Ok(DetailView::RedirectToResults {
                question_id: question.id,
                message,
            });
        }
        DetailAccess::Render => {}
    }

    Ok(DetailView::Render(voting_form(pool, question, user).await?))
}

/// Detail context for an already-resolved question, without the visibility checks.
/// Used to redisplay the form after a rejected submission.
pub async fn voting_form(
    pool: &PgPool,
    question: Question,
    user: Option<&CurrentUser>,
) -> Result<DetailContext, AppError> {
    let choices = choice::find_for_question(pool, question.id).await?;
    let selected_choice = match user {
        Some(u) => vote::find_for_user_and_question(pool, u.id, question.id)
            .await?
            .map(|sel| sel.choice_text),
        None => None,
    };
    Ok(DetailContext { question, choices, selected_choice })
}

/// Results for a published question; unpublished and unknown ids are both `NotFound`.
pub async fn results_context(
    pool: &PgPool,
    question_id: i64,
    now: DateTime<Utc>,
) -> Result<ResultsContext, AppError> {
    let question = question::get_by_id(pool, question_id).await?;
    if !question.is_published(now) {
        return Err(AppError::NotFound);
    }
    let choices_with_counts = choice::with_vote_counts(pool, question.id).await?;
    Ok(ResultsContext { question, choices_with_counts })
}
