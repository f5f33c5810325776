//! Append-only vote ledger
//!
//! The ledger owns the one-vote-per-user-per-poll constraint. The uniqueness
//! check and the insert run under a single write guard, so two concurrent
//! appends for the same `(poll, user)` pair can never both land.

use crate::polling::events::{ChangeEvent, ChangeSink, NullSink};
use crate::types::{PollId, UserId, Vote, VoteId};
use crate::{Error, Result, internal_error, validation_error};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Default)]
struct LedgerState {
    votes: HashMap<VoteId, Vote>,
    by_voter: HashMap<(PollId, UserId), VoteId>,
    by_poll: HashMap<PollId, Vec<VoteId>>,
}

impl LedgerState {
    fn insert(&mut self, vote: Vote) -> Result<()> {
        match self.by_voter.entry((vote.poll_id, vote.user_id.clone())) {
            Entry::Occupied(_) => Err(Error::DuplicateVote {
                poll_id: vote.poll_id,
            }),
            Entry::Vacant(slot) => {
                slot.insert(vote.id);
                self.by_poll.entry(vote.poll_id).or_default().push(vote.id);
                self.votes.insert(vote.id, vote);
                Ok(())
            }
        }
    }
}

/// Shared ledger of all admitted votes
pub struct VoteLedger {
    state: RwLock<LedgerState>,
    sink: Arc<dyn ChangeSink>,
}

impl VoteLedger {
    /// Create an empty ledger publishing changes into `sink`
    pub fn new(sink: Arc<dyn ChangeSink>) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            sink,
        }
    }

    /// Create for testing with no observers
    pub fn for_testing() -> Self {
        Self::new(Arc::new(NullSink))
    }

    /// Rebuild a ledger from previously persisted votes
    pub(crate) fn from_votes(sink: Arc<dyn ChangeSink>, votes: Vec<Vote>) -> Result<Self> {
        let mut state = LedgerState::default();
        for vote in votes {
            let (poll_id, user_id) = (vote.poll_id, vote.user_id.clone());
            state.insert(vote).map_err(|_| {
                validation_error!(
                    "votes",
                    "user {} has more than one vote on poll {}",
                    user_id,
                    poll_id
                )
            })?;
        }

        Ok(Self {
            state: RwLock::new(state),
            sink,
        })
    }

    /// Whether `user_id` already has a vote on `poll_id`
    pub fn has_voted(&self, poll_id: &PollId, user_id: &UserId) -> Result<bool> {
        let state = self
            .state
            .read()
            .map_err(|_| internal_error!("Vote ledger read error"))?;

        Ok(state.by_voter.contains_key(&(*poll_id, user_id.clone())))
    }

    /// The vote `user_id` cast on `poll_id`, if any
    pub fn vote_of(&self, poll_id: &PollId, user_id: &UserId) -> Result<Option<Vote>> {
        let state = self
            .state
            .read()
            .map_err(|_| internal_error!("Vote ledger read error"))?;

        Ok(state
            .by_voter
            .get(&(*poll_id, user_id.clone()))
            .and_then(|vote_id| state.votes.get(vote_id))
            .cloned())
    }

    /// Record a vote
    ///
    /// Eligibility (poll exists, is active, option is valid) is the caller's
    /// job. The ledger only guarantees uniqueness of the `(poll, user)` pair and
    /// returns `DuplicateVote` when it is already taken.
    pub fn append_vote(
        &self,
        poll_id: &PollId,
        user_id: &UserId,
        selected_option_id: &str,
    ) -> Result<Vote> {
        let vote = Vote {
            id: Uuid::new_v4(),
            poll_id: *poll_id,
            user_id: user_id.clone(),
            selected_option_id: selected_option_id.to_string(),
            timestamp: Utc::now(),
        };

        {
            let mut state = self
                .state
                .write()
                .map_err(|_| internal_error!("Vote ledger write error"))?;
            state.insert(vote.clone())?;
        }

        self.sink.publish(ChangeEvent::vote(*poll_id));

        Ok(vote)
    }

    /// All votes on a poll, in no particular order
    pub fn list_votes(&self, poll_id: &PollId) -> Result<Vec<Vote>> {
        let state = self
            .state
            .read()
            .map_err(|_| internal_error!("Vote ledger read error"))?;

        Ok(state
            .by_poll
            .get(poll_id)
            .map(|ids| ids.iter().filter_map(|id| state.votes.get(id)).cloned().collect())
            .unwrap_or_default())
    }

    pub fn vote_count(&self, poll_id: &PollId) -> Result<usize> {
        let state = self
            .state
            .read()
            .map_err(|_| internal_error!("Vote ledger read error"))?;

        Ok(state.by_poll.get(poll_id).map_or(0, Vec::len))
    }

    /// Every vote in the ledger (for snapshots)
    pub fn all_votes(&self) -> Result<Vec<Vote>> {
        let state = self
            .state
            .read()
            .map_err(|_| internal_error!("Vote ledger read error"))?;

        Ok(state.votes.values().cloned().collect())
    }

    pub fn stats(&self) -> Result<LedgerStats> {
        let state = self
            .state
            .read()
            .map_err(|_| internal_error!("Vote ledger read error"))?;

        Ok(LedgerStats {
            total_votes: state.votes.len(),
            polls_with_votes: state.by_poll.len(),
        })
    }
}

/// Vote ledger statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_votes: usize,
    pub polls_with_votes: usize,
}
