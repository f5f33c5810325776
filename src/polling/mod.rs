//! Poll voting and tally core

pub mod engine;
pub mod events;
pub mod poll_store;
pub mod service;
pub mod snapshot;
pub mod tally;
pub mod vote_ledger;

pub use engine::VotingEngine;
pub use events::{BroadcastFeed, ChangeEntity, ChangeEvent, ChangeSink, NullSink};
pub use poll_store::{PollStore, PollStoreStats};
pub use service::{PollingService, ServiceStats};
pub use snapshot::{SNAPSHOT_VERSION, Snapshot};
pub use tally::{TallyProjector, TallyWatch, tally};
pub use vote_ledger::{LedgerStats, VoteLedger};
