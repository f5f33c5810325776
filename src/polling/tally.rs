//! Tally projection
//!
//! Results are a pure function of the poll and its votes. They are recomputed
//! on every read and on every change event, never cached.

use crate::polling::events::{BroadcastFeed, ChangeEvent};
use crate::polling::poll_store::PollStore;
use crate::polling::vote_ledger::VoteLedger;
use crate::types::{OptionResult, Poll, PollId, PollResults, Vote};
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

/// Compute per-option counts for `poll` from `votes`
///
/// Lines follow the poll's option order. Percentages are relative to all votes
/// on the poll and rounded to one decimal place; with no votes every percentage
/// is 0.
pub fn tally(poll: &Poll, votes: &[Vote]) -> PollResults {
    let mut counts: HashMap<&str, u64> = HashMap::with_capacity(poll.options.len());
    for vote in votes.iter().filter(|vote| vote.poll_id == poll.id) {
        *counts.entry(vote.selected_option_id.as_str()).or_insert(0) += 1;
    }

    let total_votes: u64 = counts.values().sum();

    let options = poll
        .options
        .iter()
        .map(|option| {
            let votes = counts.get(option.id.as_str()).copied().unwrap_or(0);
            OptionResult {
                option_id: option.id.clone(),
                text: option.text.clone(),
                votes,
                percentage: percentage(votes, total_votes),
            }
        })
        .collect();

    PollResults {
        poll_id: poll.id,
        status: poll.status,
        total_votes,
        options,
    }
}

fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let exact = votes as f64 * 100.0 / total as f64;
    (exact * 10.0).round() / 10.0
}

/// Reads the poll store and ledger to produce results, and follows the change
/// feed to republish them
#[derive(Clone)]
pub struct TallyProjector {
    polls: Arc<PollStore>,
    ledger: Arc<VoteLedger>,
    feed: Arc<BroadcastFeed>,
}

impl TallyProjector {
    pub fn new(polls: Arc<PollStore>, ledger: Arc<VoteLedger>, feed: Arc<BroadcastFeed>) -> Self {
        Self {
            polls,
            ledger,
            feed,
        }
    }

    /// Current results for a poll, in option order
    pub fn compute_results(&self, poll_id: &PollId) -> Result<PollResults> {
        let poll = self.polls.get_poll(poll_id)?;
        let votes = self.ledger.list_votes(poll_id)?;
        Ok(tally(&poll, &votes))
    }

    /// Follow a poll's results as they change
    ///
    /// Subscribes before computing the first tally so no change between the two
    /// can be missed.
    pub fn watch(&self, poll_id: &PollId) -> Result<TallyWatch> {
        let receiver = self.feed.subscribe();
        let initial = self.compute_results(poll_id)?;

        tracing::debug!(poll_id = %poll_id, "👀 Tally watch started");

        Ok(TallyWatch {
            poll_id: *poll_id,
            receiver,
            projector: self.clone(),
            initial: Some(initial),
        })
    }
}

/// Stream of recomputed results for one poll
pub struct TallyWatch {
    poll_id: PollId,
    receiver: broadcast::Receiver<ChangeEvent>,
    projector: TallyProjector,
    initial: Option<PollResults>,
}

impl TallyWatch {
    pub fn poll_id(&self) -> PollId {
        self.poll_id
    }

    /// Next tally for the watched poll
    ///
    /// The first call returns the tally taken when the watch started. Later
    /// calls wait for a poll or vote change on this poll and recompute. If the
    /// subscriber fell behind, it recomputes once from current state instead of
    /// replaying. `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<Result<PollResults>> {
        if let Some(initial) = self.initial.take() {
            return Some(Ok(initial));
        }

        loop {
            match self.receiver.recv().await {
                Ok(event) if event.poll_id == self.poll_id => {
                    return Some(self.projector.compute_results(&self.poll_id));
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        poll_id = %self.poll_id,
                        skipped,
                        "tally watcher lagged, recomputing from current state"
                    );
                    return Some(self.projector.compute_results(&self.poll_id));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
