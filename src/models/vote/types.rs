/// A user's current selection on one question.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Vote {
    pub id: i64,
    pub user_id: i64,
    pub choice_id: i64,
}

/// The existing vote of a user on a question, with the chosen text for display.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct VoteSelection {
    pub vote_id: i64,
    pub choice_id: i64,
    pub choice_text: String,
}

/// What an upsert did to the (user, question) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Created { vote_id: i64 },
    Changed { vote_id: i64, previous_choice_id: i64 },
}

impl VoteOutcome {
    pub fn vote_id(&self) -> i64 {
        match *self {
            VoteOutcome::Created { vote_id } | VoteOutcome::Changed { vote_id, .. } => vote_id,
        }
    }
}
