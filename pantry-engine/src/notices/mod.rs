//! Notice board and poll tally
//!
//! Announcements and polls share one document type. Vote mutations run
//! inside store transactions so per-option tallies, the per-voter choice
//! map and the legacy `voters` projection always commit together.
//!
//! # Vote semantics
//!
//! - Multi-select: each vote toggles the chosen option in the caller's set
//!   (add = increment, remove = decrement, floored at 0).
//! - Single-select: a new choice replaces the previous one (decrement old,
//!   increment new); repeating the held choice deselects it; a `None` index
//!   is an explicit removal. 重复点击同一选项即取消，属产品既定行为。

mod error;
mod model;

pub use error::{NoticeError, NoticeResult};
pub use model::{Author, Notice, NoticeInput, NoticeUpdate, PollOption, VoteChoice, VoteOutcome};


use std::sync::Arc;

use crate::store::LedgerStore;
use crate::utils::time;

/// Notice documents
const NOTICES: &str = "notices";

/// Minimum options for a notice to become a poll
const MIN_POLL_OPTIONS: usize = 2;

/// Notice board service
#[derive(Clone)]
pub struct NoticeService {
    store: Arc<LedgerStore>,
}

impl NoticeService {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Create a notice; two or more poll options make it a poll
    pub fn create(&self, input: NoticeInput, author: &Author) -> NoticeResult<Notice> {
        let now_ms = time::now_millis();
        let mut notice = Notice {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title,
            message: input.message,
            author: author.email.clone(),
            author_name: author
                .display_name
                .clone()
                .unwrap_or_else(|| author.email.clone()),
            kind: input.kind.unwrap_or_else(|| "general".to_string()),
            timestamp: now_ms,
            updated_at: now_ms,
            is_pinned: false,
            is_poll: false,
            allow_multiple: false,
            poll_options: Vec::new(),
            votes: Default::default(),
            voters: Vec::new(),
        };

        if let Some(options) = input.poll_options
            && options.len() >= MIN_POLL_OPTIONS
        {
            notice.is_poll = true;
            notice.allow_multiple = input.allow_multiple;
            notice.poll_options = options
                .into_iter()
                .map(|text| PollOption { text, votes: 0 })
                .collect();
        }

        self.store.run_transaction(|txn| {
            txn.set(NOTICES, &notice.id, &notice)?;
            Ok::<_, NoticeError>(())
        })?;
        tracing::info!(notice_id = %notice.id, is_poll = notice.is_poll, "Notice created");
        Ok(notice)
    }

    /// Cast, change or withdraw a vote on a poll
    ///
    /// `option_index = None` is an explicit removal (single-select only).
    pub fn vote(
        &self,
        notice_id: &str,
        user_id: &str,
        option_index: Option<usize>,
    ) -> NoticeResult<VoteOutcome> {
        self.store.run_transaction(|txn| {
            let mut notice: Notice = txn
                .get(NOTICES, notice_id)?
                .ok_or_else(|| NoticeError::NotFound(notice_id.to_string()))?;

            if !notice.is_poll || notice.poll_options.is_empty() {
                return Err(NoticeError::NotAPoll(notice_id.to_string()));
            }

            // Range check before touching any tally
            let option_count = notice.poll_options.len();
            if let Some(index) = option_index
                && index >= option_count
            {
                return Err(NoticeError::InvalidOption(format!(
                    "index {index} out of range for {option_count} options"
                )));
            }

            let previous = notice.votes.get(user_id).cloned();

            if notice.allow_multiple {
                let Some(index) = option_index else {
                    return Err(NoticeError::InvalidOption(
                        "multi-select vote requires an option index".to_string(),
                    ));
                };

                let mut selected = previous.map(|choice| choice.indices()).unwrap_or_default();
                if let Some(pos) = selected.iter().position(|&i| i == index) {
                    // Toggle off
                    selected.remove(pos);
                    let option = &mut notice.poll_options[index];
                    option.votes = option.votes.saturating_sub(1);
                } else {
                    // Toggle on
                    selected.push(index);
                    notice.poll_options[index].votes += 1;
                }
                // An emptied set stays recorded; readers treat it as "no vote"
                notice
                    .votes
                    .insert(user_id.to_string(), VoteChoice::Multi(selected));
            } else {
                // Drop the previous choice first, stray multi values included
                if let Some(prev) = &previous {
                    for index in prev.indices() {
                        if let Some(option) = notice.poll_options.get_mut(index) {
                            option.votes = option.votes.saturating_sub(1);
                        }
                    }
                }

                match option_index {
                    None => {
                        notice.votes.remove(user_id);
                    }
                    Some(index) => {
                        if matches!(previous, Some(VoteChoice::Single(prev)) if prev == index) {
                            // Repeating the held choice deselects it
                            notice.votes.remove(user_id);
                        } else {
                            notice.poll_options[index].votes += 1;
                            notice
                                .votes
                                .insert(user_id.to_string(), VoteChoice::Single(index));
                        }
                    }
                }
            }

            let mut voters: Vec<String> = notice.votes.keys().cloned().collect();
            voters.sort();
            notice.voters = voters;

            txn.set(NOTICES, notice_id, &notice)?;
            Ok(VoteOutcome {
                selected: notice
                    .votes
                    .get(user_id)
                    .map(|choice| choice.indices())
                    .unwrap_or_default(),
                options: notice.poll_options,
            })
        })
    }

    /// Admin text edit; vote fields are never touched
    pub fn update(&self, notice_id: &str, update: &NoticeUpdate) -> NoticeResult<Notice> {
        self.store.run_transaction(|txn| {
            let mut notice: Notice = txn
                .get(NOTICES, notice_id)?
                .ok_or_else(|| NoticeError::NotFound(notice_id.to_string()))?;

            if let Some(title) = &update.title {
                notice.title = title.clone();
            }
            if let Some(message) = &update.message {
                notice.message = message.clone();
            }
            if let Some(pinned) = update.is_pinned {
                notice.is_pinned = pinned;
            }
            notice.updated_at = time::now_millis();

            txn.set(NOTICES, notice_id, &notice)?;
            Ok(notice)
        })
    }

    /// Delete a notice
    pub fn delete(&self, notice_id: &str) -> NoticeResult<()> {
        self.store.run_transaction(|txn| {
            let existing: Option<Notice> = txn.get(NOTICES, notice_id)?;
            if existing.is_none() {
                return Err(NoticeError::NotFound(notice_id.to_string()));
            }
            txn.delete(NOTICES, notice_id);
            Ok(())
        })?;
        tracing::info!(notice_id = %notice_id, "Notice deleted");
        Ok(())
    }

    /// Look up one notice
    pub fn find_by_id(&self, notice_id: &str) -> NoticeResult<Option<Notice>> {
        Ok(self.store.read_one(NOTICES, notice_id)?)
    }

    /// Page of notices, newest first
    pub fn list(&self, limit: usize, offset: usize) -> NoticeResult<Vec<Notice>> {
        let mut notices: Vec<Notice> = self
            .store
            .scan(NOTICES)?
            .into_iter()
            .map(|(_, notice)| notice)
            .collect();
        notices.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(notices.into_iter().skip(offset).take(limit).collect())
    }
}
