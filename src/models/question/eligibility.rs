//! Time-window predicates over a [`Question`]. Every check takes the instant to
//! evaluate at; nothing here reads the clock.

use chrono::{DateTime, Duration, Utc};

use super::types::Question;

impl Question {
    /// Visible from `pub_date` onwards, inclusive.
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.pub_date <= now
    }

    /// Published within the last day. A future `pub_date` is never recent.
    pub fn was_published_recently(&self, now: DateTime<Utc>) -> bool {
        now - Duration::days(1) <= self.pub_date && self.pub_date <= now
    }

    /// Inside the voting window. Open-ended questions open strictly after `pub_date`;
    /// bounded ones accept `pub_date <= now <= end_date`.
    pub fn can_vote(&self, now: DateTime<Utc>) -> bool {
        match self.end_date {
            None => self.pub_date < now,
            Some(end) => self.pub_date <= now && now <= end,
        }
    }
}
