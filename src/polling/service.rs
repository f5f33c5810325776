//! Polling service: one poll store, one vote ledger and one change feed wired
//! together behind the operations the UI/API layer calls

use crate::config::PollConfig;
use crate::polling::engine::VotingEngine;
use crate::polling::events::{BroadcastFeed, ChangeEvent, ChangeSink};
use crate::polling::poll_store::{PollStore, PollStoreStats};
use crate::polling::snapshot::Snapshot;
use crate::polling::tally::{TallyProjector, TallyWatch};
use crate::polling::vote_ledger::{LedgerStats, VoteLedger};
use crate::types::{Identity, Poll, PollId, PollResults, PollStatus, UserId, Vote};
use crate::{Result, validation_error};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct PollingService {
    config: PollConfig,
    feed: Arc<BroadcastFeed>,
    polls: Arc<PollStore>,
    ledger: Arc<VoteLedger>,
    engine: VotingEngine,
    projector: TallyProjector,
}

impl PollingService {
    /// Create an empty service
    pub fn new(config: PollConfig) -> Result<Self> {
        config.validate()?;

        let feed = Arc::new(BroadcastFeed::new(config.event_capacity));
        let sink: Arc<dyn ChangeSink> = feed.clone();
        let polls = Arc::new(PollStore::new(sink.clone()));
        let ledger = Arc::new(VoteLedger::new(sink));

        Ok(Self::assemble(config, feed, polls, ledger))
    }

    /// Create for testing with a small change feed
    pub fn for_testing() -> Self {
        let config = PollConfig::for_testing();
        let feed = Arc::new(BroadcastFeed::new(config.event_capacity));
        let polls = Arc::new(PollStore::new(feed.clone()));
        let ledger = Arc::new(VoteLedger::new(feed.clone()));

        Self::assemble(config, feed, polls, ledger)
    }

    /// Restore from the configured snapshot file when one exists, else start empty
    pub fn open(config: PollConfig) -> Result<Self> {
        match config.snapshot_path.clone() {
            Some(path) if path.exists() => {
                let snapshot = Snapshot::load(&path)?;
                Self::restore(snapshot, config)
            }
            _ => Self::new(config),
        }
    }

    /// Rebuild a service from a snapshot
    ///
    /// Every poll must pass the checks applied at creation, every vote must
    /// reference a known poll and one of its options, and no user may hold two
    /// votes on the same poll. No change events are
    /// published while restoring.
    pub fn restore(snapshot: Snapshot, config: PollConfig) -> Result<Self> {
        config.validate()?;

        let by_id: HashMap<PollId, &Poll> =
            snapshot.polls.iter().map(|poll| (poll.id, poll)).collect();
        for vote in &snapshot.votes {
            let poll = by_id.get(&vote.poll_id).ok_or_else(|| {
                validation_error!("votes", "vote {} references unknown poll {}", vote.id, vote.poll_id)
            })?;

            if !poll.has_option(&vote.selected_option_id) {
                return Err(validation_error!(
                    "votes",
                    "vote {} selects unknown option '{}'",
                    vote.id,
                    vote.selected_option_id
                ));
            }
        }

        let (poll_count, vote_count) = (snapshot.polls.len(), snapshot.votes.len());

        let feed = Arc::new(BroadcastFeed::new(config.event_capacity));
        let sink: Arc<dyn ChangeSink> = feed.clone();
        let polls = Arc::new(PollStore::from_polls(sink.clone(), snapshot.polls)?);
        let ledger = Arc::new(VoteLedger::from_votes(sink, snapshot.votes)?);

        tracing::info!(polls = poll_count, votes = vote_count, "♻️ Polling state restored");

        Ok(Self::assemble(config, feed, polls, ledger))
    }

    fn assemble(
        config: PollConfig,
        feed: Arc<BroadcastFeed>,
        polls: Arc<PollStore>,
        ledger: Arc<VoteLedger>,
    ) -> Self {
        let engine = VotingEngine::new(polls.clone(), ledger.clone());
        let projector = TallyProjector::new(polls.clone(), ledger.clone(), feed.clone());

        Self {
            config,
            feed,
            polls,
            ledger,
            engine,
            projector,
        }
    }

    pub fn create_poll<S: AsRef<str>>(
        &self,
        question: &str,
        options: &[S],
        creator: &Identity,
    ) -> Result<Poll> {
        self.polls.create_poll(question, options, creator)
    }

    pub fn get_poll(&self, poll_id: &PollId) -> Result<Poll> {
        self.polls.get_poll(poll_id)
    }

    pub fn list_polls(&self, status: Option<PollStatus>) -> Result<Vec<Poll>> {
        self.polls.list_polls(status)
    }

    pub fn close_poll(&self, poll_id: &PollId, requester: &UserId) -> Result<()> {
        self.polls.close_poll(poll_id, requester)
    }

    pub fn cast_vote(
        &self,
        poll_id: &PollId,
        user_id: &UserId,
        selected_option_id: &str,
    ) -> Result<Vote> {
        self.engine.cast_vote(poll_id, user_id, selected_option_id)
    }

    pub fn has_voted(&self, poll_id: &PollId, user_id: &UserId) -> Result<bool> {
        self.ledger.has_voted(poll_id, user_id)
    }

    /// The caller's own vote on a poll, if any
    pub fn vote_of(&self, poll_id: &PollId, user_id: &UserId) -> Result<Option<Vote>> {
        self.ledger.vote_of(poll_id, user_id)
    }

    pub fn list_votes(&self, poll_id: &PollId) -> Result<Vec<Vote>> {
        self.ledger.list_votes(poll_id)
    }

    pub fn compute_results(&self, poll_id: &PollId) -> Result<PollResults> {
        self.projector.compute_results(poll_id)
    }

    pub fn watch(&self, poll_id: &PollId) -> Result<TallyWatch> {
        self.projector.watch(poll_id)
    }

    /// Raw change feed for a realtime relay
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot::new(
            self.polls.list_polls(None)?,
            self.ledger.all_votes()?,
        ))
    }

    /// Save a snapshot to the configured path; `false` when none is configured
    pub fn persist(&self) -> Result<bool> {
        match &self.config.snapshot_path {
            Some(path) => {
                self.persist_to(path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn persist_to(&self, path: &Path) -> Result<()> {
        self.snapshot()?.save(path)
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn stats(&self) -> Result<ServiceStats> {
        Ok(ServiceStats {
            polls: self.polls.stats()?,
            ledger: self.ledger.stats()?,
            subscribers: self.feed.subscriber_count(),
            events_published: self.feed.published_count(),
        })
    }
}

/// Combined statistics across the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    pub polls: PollStoreStats,
    pub ledger: LedgerStats,
    pub subscribers: usize,
    pub events_published: u64,
}
