use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, Utc};
use serde::Serialize;

/// A poll prompt. `end_date = None` means voting never closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Row for the admin question list.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuestionAdminRow {
    pub id: i64,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub choice_count: i64,
}

impl QuestionAdminRow {
    pub fn question(&self) -> Question {
        Question {
            id: self.id,
            question_text: self.question_text.clone(),
            pub_date: self.pub_date,
            end_date: self.end_date,
        }
    }
}

/// Input for creating a question together with its choices.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub choices: Vec<String>,
}

/// Publish-date buckets offered by the admin list filter. Days are UTC days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PubDateFilter {
    Today,
    PastWeek,
    ThisMonth,
    ThisYear,
}

impl PubDateFilter {
    pub const ALL: [PubDateFilter; 4] = [
        PubDateFilter::Today,
        PubDateFilter::PastWeek,
        PubDateFilter::ThisMonth,
        PubDateFilter::ThisYear,
    ];

    /// Query-string value; unknown values mean "any date".
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PubDateFilter::Today => "today",
            PubDateFilter::PastWeek => "week",
            PubDateFilter::ThisMonth => "month",
            PubDateFilter::ThisYear => "year",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PubDateFilter::Today => "Today",
            PubDateFilter::PastWeek => "Past 7 days",
            PubDateFilter::ThisMonth => "This month",
            PubDateFilter::ThisYear => "This year",
        }
    }

    /// Half-open `[from, until)` range of `pub_date` values in the bucket at `now`.
    pub fn bounds(self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let today = now.date_naive();
        let midnight = today.and_time(NaiveTime::default()).and_utc();
        let tomorrow = midnight + Duration::days(1);
        match self {
            PubDateFilter::Today => (midnight, tomorrow),
            PubDateFilter::PastWeek => (midnight - Duration::days(7), tomorrow),
            PubDateFilter::ThisMonth => {
                let first = midnight - Duration::days(i64::from(today.day0()));
                (first, first + Months::new(1))
            }
            PubDateFilter::ThisYear => {
                let first = midnight - Duration::days(i64::from(today.ordinal0()));
                (first, first + Months::new(12))
            }
        }
    }
}

/// Narrowing applied to the admin question list.
#[derive(Debug, Clone, Default)]
pub struct AdminQuestionFilter {
    /// Case-insensitive substring of the question text.
    pub search: Option<String>,
    pub published: Option<PubDateFilter>,
}
