use askama::Template;
use chrono::{DateTime, Utc};

use crate::models::question::{PubDateFilter, QuestionAdminRow};
use super::PageContext;

/// One line of the admin question list, with eligibility flags evaluated at request time.
pub struct QuestionAdminItem {
    pub id: i64,
    pub question_text: String,
    pub pub_date: String,
    pub end_date: String,
    pub choice_count: i64,
    pub was_published_recently: bool,
    pub is_published: bool,
    pub can_vote: bool,
}

impl QuestionAdminItem {
    pub fn from_row(row: &QuestionAdminRow, now: DateTime<Utc>) -> Self {
        let question = row.question();
        Self {
            id: row.id,
            question_text: row.question_text.clone(),
            pub_date: row.pub_date.format("%Y-%m-%d %H:%M").to_string(),
            end_date: row
                .end_date
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            choice_count: row.choice_count,
            was_published_recently: question.was_published_recently(now),
            is_published: question.is_published(now),
            can_vote: question.can_vote(now),
        }
    }
}

/// One entry of the publish-date dropdown. An empty `value` means any date.
pub struct PubDateFilterOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl PubDateFilterOption {
    pub fn all(current: Option<PubDateFilter>) -> Vec<Self> {
        let any = PubDateFilterOption { value: "", label: "Any date", selected: current.is_none() };
        std::iter::once(any)
            .chain(PubDateFilter::ALL.into_iter().map(|f| PubDateFilterOption {
                value: f.as_str(),
                label: f.label(),
                selected: current == Some(f),
            }))
            .collect()
    }
}

#[derive(Template)]
#[template(path = "admin/questions.html")]
pub struct QuestionListTemplate {
    pub ctx: PageContext,
    pub questions: Vec<QuestionAdminItem>,
    pub search: String,
    pub date_filters: Vec<PubDateFilterOption>,
}

/// Values echoed back into the form when validation fails.
#[derive(Default)]
pub struct QuestionFormValues {
    pub question_text: String,
    pub pub_date: String,
    pub end_date: String,
    pub choices: Vec<String>,
}

#[derive(Template)]
#[template(path = "admin/question_form.html")]
pub struct QuestionFormTemplate {
    pub ctx: PageContext,
    pub values: QuestionFormValues,
    pub errors: Vec<String>,
}
