pub mod cast;
pub mod queries;
pub mod types;

pub use cast::{CastVote, VoteError, cast_vote, closed_message, results_url};
pub use queries::*;
pub use types::*;
