//! Poll store: creation, lookup and the single active → closed transition
//!
//! The store is the only authority for a poll's `status`. Question and options
//! are validated once on creation and never touched again.

use crate::config::{MAX_OPTIONS, MIN_OPTIONS};
use crate::polling::events::{ChangeEvent, ChangeSink, NullSink};
use crate::types::{Identity, Poll, PollId, PollOption, PollStatus, UserId};
use crate::{Error, Result, internal_error, validation_error};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Shared store of all polls
pub struct PollStore {
    polls: RwLock<HashMap<PollId, Poll>>,
    sink: Arc<dyn ChangeSink>,
}

impl PollStore {
    /// Create an empty store publishing changes into `sink`
    pub fn new(sink: Arc<dyn ChangeSink>) -> Self {
        Self {
            polls: RwLock::new(HashMap::new()),
            sink,
        }
    }

    /// Create for testing with no observers
    pub fn for_testing() -> Self {
        Self::new(Arc::new(NullSink))
    }

    /// Rebuild a store from previously persisted polls
    ///
    /// Each poll must still satisfy the rules `create_poll` enforces, with
    /// option ids numbered from "0" in order.
    pub(crate) fn from_polls(sink: Arc<dyn ChangeSink>, polls: Vec<Poll>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(polls.len());
        for poll in polls {
            check_restored(&poll)?;
            let poll_id = poll.id;
            if by_id.insert(poll_id, poll).is_some() {
                return Err(validation_error!("polls", "duplicate poll id {}", poll_id));
            }
        }

        Ok(Self {
            polls: RwLock::new(by_id),
            sink,
        })
    }

    /// Validate and persist a new active poll
    ///
    /// Fails with `Auth` when the creator carries no user id and with
    /// `Validation` when the question is blank, the option count is outside
    /// 2..=10, an option is blank, or two options match after
    /// trimming and lowercasing.
    pub fn create_poll<S: AsRef<str>>(
        &self,
        question: &str,
        options: &[S],
        creator: &Identity,
    ) -> Result<Poll> {
        if creator.user_id.is_blank() {
            return Err(Error::auth("creating a poll requires a signed-in user"));
        }

        let question = question.trim();
        if question.is_empty() {
            return Err(validation_error!("question", "must not be empty"));
        }

        let options = self.validate_options(options)?;

        let poll = Poll {
            id: Uuid::new_v4(),
            question: question.to_string(),
            options,
            created_by: creator.user_id.clone(),
            creator_display_name: creator.display_name.clone(),
            status: PollStatus::Active,
            created_at: Utc::now(),
        };

        {
            let mut polls = self
                .polls
                .write()
                .map_err(|_| internal_error!("Poll store write error"))?;
            polls.insert(poll.id, poll.clone());
        }

        self.sink.publish(ChangeEvent::poll(poll.id));

        tracing::info!(
            poll_id = %poll.id,
            created_by = %poll.created_by,
            options = poll.options.len(),
            "📊 Poll created"
        );

        Ok(poll)
    }

    fn validate_options<S: AsRef<str>>(&self, options: &[S]) -> Result<Vec<PollOption>> {
        check_option_count(options.len())?;

        let mut seen = HashSet::with_capacity(options.len());
        let mut validated = Vec::with_capacity(options.len());

        for (index, raw) in options.iter().enumerate() {
            let text = raw.as_ref().trim();
            check_option_text(index, text, &mut seen)?;
            validated.push(PollOption::new(index, text));
        }

        Ok(validated)
    }

    /// Fetch a poll by id
    pub fn get_poll(&self, poll_id: &PollId) -> Result<Poll> {
        let polls = self
            .polls
            .read()
            .map_err(|_| internal_error!("Poll store read error"))?;

        polls
            .get(poll_id)
            .cloned()
            .ok_or(Error::NotFound { poll_id: *poll_id })
    }

    /// Close an active poll; only its creator may do so
    ///
    /// Closing twice is reported as `AlreadyClosed` rather than silently
    /// accepted. The status check and the write share one write guard.
    pub fn close_poll(&self, poll_id: &PollId, requester: &UserId) -> Result<()> {
        if requester.is_blank() {
            return Err(Error::auth("closing a poll requires a signed-in user"));
        }

        {
            let mut polls = self
                .polls
                .write()
                .map_err(|_| internal_error!("Poll store write error"))?;

            let poll = polls
                .get_mut(poll_id)
                .ok_or(Error::NotFound { poll_id: *poll_id })?;

            if !poll.is_owned_by(requester) {
                tracing::warn!(
                    poll_id = %poll_id,
                    requester = %requester,
                    "close rejected, requester is not the creator"
                );
                return Err(Error::Forbidden { poll_id: *poll_id });
            }

            if poll.status == PollStatus::Closed {
                return Err(Error::AlreadyClosed { poll_id: *poll_id });
            }

            poll.status = PollStatus::Closed;
        }

        self.sink.publish(ChangeEvent::poll(*poll_id));

        tracing::info!(poll_id = %poll_id, "🔒 Poll closed");

        Ok(())
    }

    /// All polls, newest first, optionally restricted to one status
    pub fn list_polls(&self, status: Option<PollStatus>) -> Result<Vec<Poll>> {
        let polls = self
            .polls
            .read()
            .map_err(|_| internal_error!("Poll store read error"))?;

        let mut listed: Vec<Poll> = polls
            .values()
            .filter(|poll| status.is_none_or(|wanted| poll.status == wanted))
            .cloned()
            .collect();

        listed.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(listed)
    }

    /// Counts by status
    pub fn stats(&self) -> Result<PollStoreStats> {
        let polls = self
            .polls
            .read()
            .map_err(|_| internal_error!("Poll store read error"))?;

        let total_polls = polls.len();
        let active_polls = polls.values().filter(|poll| poll.is_active()).count();

        Ok(PollStoreStats {
            total_polls,
            active_polls,
            closed_polls: total_polls - active_polls,
        })
    }
}

fn check_option_count(count: usize) -> Result<()> {
    if count < MIN_OPTIONS {
        return Err(validation_error!(
            "options",
            "at least {} options are required, got {}",
            MIN_OPTIONS,
            count
        ));
    }

    if count > MAX_OPTIONS {
        return Err(validation_error!(
            "options",
            "at most {} options are allowed, got {}",
            MAX_OPTIONS,
            count
        ));
    }

    Ok(())
}

/// `text` must already be trimmed; `seen` holds the lowercased texts so far
fn check_option_text(index: usize, text: &str, seen: &mut HashSet<String>) -> Result<()> {
    if text.is_empty() {
        return Err(validation_error!("options", "option {} must not be empty", index));
    }

    if !seen.insert(text.to_lowercase()) {
        return Err(validation_error!("options", "option '{}' is listed twice", text));
    }

    Ok(())
}

fn check_restored(poll: &Poll) -> Result<()> {
    if poll.question.trim().is_empty() || poll.question.trim() != poll.question {
        return Err(validation_error!(
            "polls",
            "poll {} has a blank or untrimmed question",
            poll.id
        ));
    }

    check_option_count(poll.options.len())?;

    let mut seen = HashSet::with_capacity(poll.options.len());
    for (index, option) in poll.options.iter().enumerate() {
        if option.id != index.to_string() {
            return Err(validation_error!(
                "options",
                "poll {} has option id '{}' at position {}",
                poll.id,
                option.id,
                index
            ));
        }

        if option.text.trim() != option.text {
            return Err(validation_error!(
                "options",
                "poll {} has untrimmed option text '{}'",
                poll.id,
                option.text
            ));
        }

        check_option_text(index, &option.text, &mut seen)?;
    }

    Ok(())
}

/// Poll store statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollStoreStats {
    pub total_polls: usize,
    pub active_polls: usize,
    pub closed_polls: usize,
}
