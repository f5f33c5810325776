//! Voting engine: the single entry point for casting votes
//!
//! Checks run in a fixed order (identity, poll, status, option, prior vote)
//! and the final word on duplicates belongs to the ledger:
//! 1. Caller must carry a user id
//! 2. Poll must exist and be active
//! 3. Option must belong to the poll
//! 4. Caller must not have voted yet
//! 5. Ledger append; a lost race is reported exactly like step 4

use crate::polling::poll_store::PollStore;
use crate::polling::vote_ledger::VoteLedger;
use crate::types::{PollId, UserId, Vote};
use crate::{Error, Result};
use std::sync::Arc;

#[derive(Clone)]
pub struct VotingEngine {
    polls: Arc<PollStore>,
    ledger: Arc<VoteLedger>,
}

impl VotingEngine {
    pub fn new(polls: Arc<PollStore>, ledger: Arc<VoteLedger>) -> Self {
        Self { polls, ledger }
    }

    /// Admit one vote or change nothing
    ///
    /// On success the ledger publishes a vote event, which is what drives tally
    /// republication for observers of the poll.
    pub fn cast_vote(
        &self,
        poll_id: &PollId,
        user_id: &UserId,
        selected_option_id: &str,
    ) -> Result<Vote> {
        if user_id.is_blank() {
            return Err(Error::auth("voting requires a signed-in user"));
        }

        let poll = self.polls.get_poll(poll_id)?;
        if !poll.is_active() {
            tracing::debug!(poll_id = %poll_id, user_id = %user_id, "vote rejected, poll closed");
            return Err(Error::PollInactive { poll_id: *poll_id });
        }

        if !poll.has_option(selected_option_id) {
            tracing::debug!(
                poll_id = %poll_id,
                option_id = selected_option_id,
                "vote rejected, unknown option"
            );
            return Err(Error::InvalidOption {
                poll_id: *poll_id,
                option_id: selected_option_id.to_string(),
            });
        }

        // Fast path only; the ledger append below is what actually guarantees uniqueness
        if self.ledger.has_voted(poll_id, user_id)? {
            tracing::debug!(poll_id = %poll_id, user_id = %user_id, "vote rejected, already voted");
            return Err(Error::AlreadyVoted { poll_id: *poll_id });
        }

        let vote = match self.ledger.append_vote(poll_id, user_id, selected_option_id) {
            Ok(vote) => vote,
            Err(Error::DuplicateVote { poll_id }) => {
                tracing::warn!(
                    poll_id = %poll_id,
                    user_id = %user_id,
                    "concurrent vote lost the race in the ledger"
                );
                return Err(Error::AlreadyVoted { poll_id });
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            poll_id = %poll_id,
            vote_id = %vote.id,
            option_id = selected_option_id,
            "🗳️ Vote recorded"
        );

        Ok(vote)
    }
}
