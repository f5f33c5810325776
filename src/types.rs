//! # Core Types for the Polling Core
//!
//! This module defines the records the poll store and vote ledger hold, the
//! identity values callers pass in, and the derived tally returned to observers.
//!
//! ## Type Categories
//!
//! ### Identity
//! - [`UserId`]: opaque, stable user identifier issued by the auth collaborator
//! - [`Identity`]: user identifier plus the display name at call time
//!
//! ### Core Entities
//! - [`Poll`]: question, ordered options, owner and lifecycle status
//! - [`Vote`]: one user's immutable choice on one poll
//!
//! ### Derived
//! - [`PollResults`] / [`OptionResult`]: per-option counts and percentages
//!
//! ## Usage Examples
//!
//! ```rust
//! use livepoll::types::*;
//! use chrono::Utc;
//! use uuid::Uuid;
//!
//! let poll = Poll {
//!     id: Uuid::new_v4(),
//!     question: "Lunch?".to_string(),
//!     options: vec![PollOption::new(0, "Pizza"), PollOption::new(1, "Sushi")],
//!     created_by: UserId::new("alice"),
//!     creator_display_name: "Alice".to_string(),
//!     status: PollStatus::Active,
//!     created_at: Utc::now(),
//! };
//!
//! assert!(poll.is_active());
//! assert!(poll.has_option("1"));
//! assert!(!poll.has_option("2"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Poll identifier (UUID v4, assigned at creation)
pub type PollId = Uuid;

/// Vote identifier (UUID v4, assigned at cast time)
pub type VoteId = Uuid;

/// Opaque user identifier supplied by the authentication collaborator
///
/// The core never interprets the contents. A blank identifier is treated as
/// "no authenticated caller" by every operation that takes one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the identifier carries no identity at all
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Caller identity as handed over by the auth collaborator
///
/// Passed explicitly to every operation that needs it; the core keeps no
/// ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub display_name: String,
}

impl Identity {
    pub fn new(user_id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Lifecycle state of a poll
///
/// Polls start `Active` and move to `Closed` exactly once. There is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    Active,
    Closed,
}

impl PollStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, PollStatus::Active)
    }
}

impl fmt::Display for PollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollStatus::Active => f.write_str("active"),
            PollStatus::Closed => f.write_str("closed"),
        }
    }
}

/// One selectable answer of a poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    /// Position-derived key (`"0"`, `"1"`, ...), used as the vote target
    pub id: String,

    /// Trimmed option text
    pub text: String,
}

impl PollOption {
    /// Build the option at `index`; its id is the index rendered as text
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            id: index.to_string(),
            text: text.into(),
        }
    }
}

/// A question with a fixed set of options, owned by its creator
///
/// Everything except `status` is fixed at creation. `status` is mutated only
/// through [`PollStore::close_poll`](crate::polling::PollStore::close_poll).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    /// Unique poll identifier
    pub id: PollId,

    /// Trimmed, non-empty question text
    pub question: String,

    /// Between 2 and 10 options in creation order
    pub options: Vec<PollOption>,

    /// Creator's user identifier
    pub created_by: UserId,

    /// Creator's display name as it was when the poll was created
    ///
    /// Not refreshed if the creator renames themselves later.
    pub creator_display_name: String,

    /// Current lifecycle state
    pub status: PollStatus,

    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,
}

impl Poll {
    /// Whether the poll is currently accepting votes
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Look up an option by id
    pub fn option(&self, option_id: &str) -> Option<&PollOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    pub fn has_option(&self, option_id: &str) -> bool {
        self.option(option_id).is_some()
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.created_by == user_id
    }
}

/// A single user's immutable choice on one poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Unique vote identifier
    pub id: VoteId,

    /// Poll the vote was cast on
    pub poll_id: PollId,

    /// Voter's user identifier
    pub user_id: UserId,

    /// Id of the chosen [`PollOption`]
    pub selected_option_id: String,

    /// Server-assigned cast time
    pub timestamp: DateTime<Utc>,
}

/// Tally line for one option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionResult {
    pub option_id: String,
    pub text: String,

    /// Votes recorded for this option
    pub votes: u64,

    /// Share of all votes on the poll, 0–100, rounded to one decimal place
    pub percentage: f64,
}

/// Derived results for a poll, in the poll's option order
///
/// Never stored; always recomputed from the vote ledger so it cannot drift.
///
/// ```rust
/// use livepoll::types::{OptionResult, PollResults, PollStatus};
/// use uuid::Uuid;
///
/// let results = PollResults {
///     poll_id: Uuid::new_v4(),
///     status: PollStatus::Closed,
///     total_votes: 3,
///     options: vec![
///         OptionResult { option_id: "0".into(), text: "Yes".into(), votes: 2, percentage: 66.7 },
///         OptionResult { option_id: "1".into(), text: "No".into(), votes: 1, percentage: 33.3 },
///     ],
/// };
///
/// assert_eq!(results.option("0").map(|o| o.votes), Some(2));
/// assert_eq!(results.leaders().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResults {
    pub poll_id: PollId,

    /// Poll status at the time the tally was computed
    pub status: PollStatus,

    /// All votes recorded on the poll
    pub total_votes: u64,

    /// One line per option, same order as [`Poll::options`]
    pub options: Vec<OptionResult>,
}

impl PollResults {
    pub fn option(&self, option_id: &str) -> Option<&OptionResult> {
        self.options.iter().find(|line| line.option_id == option_id)
    }

    /// Options sharing the highest vote count (empty when nobody voted)
    pub fn leaders(&self) -> Vec<&OptionResult> {
        let top = self.options.iter().map(|line| line.votes).max().unwrap_or(0);
        if top == 0 {
            return Vec::new();
        }

        self.options.iter().filter(|line| line.votes == top).collect()
    }
}
