//! Notice board models
//!
//! Poll vote storage predates multi-select support: a voter's recorded
//! choice is a bare index in old documents and an index array in new ones.
//! [`VoteChoice`] models both shapes as one tagged variant; everything that
//! reads or writes a choice goes through [`VoteChoice::indices`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One poll option with its running tally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub text: String,

    #[serde(default)]
    pub votes: u32,
}

/// A voter's recorded choice — legacy single index or multi-select set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VoteChoice {
    Single(usize),
    Multi(Vec<usize>),
}

impl VoteChoice {
    /// Normalize either shape to the list of selected option indices
    pub fn indices(&self) -> Vec<usize> {
        match self {
            VoteChoice::Single(index) => vec![*index],
            VoteChoice::Multi(indices) => indices.clone(),
        }
    }
}

fn default_kind() -> String {
    "general".to_string()
}

/// Notice document (key = generated id)
///
/// Poll fields are populated only when `is_poll`; `voters` is a legacy
/// projection kept equal to the key set of `votes` for old readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: String,
    pub title: String,
    pub message: String,

    /// Author email
    pub author: String,
    pub author_name: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    /// Unix millis
    pub timestamp: i64,

    /// Unix millis of the last admin edit
    pub updated_at: i64,

    #[serde(default)]
    pub is_pinned: bool,

    // === Poll fields ===
    #[serde(default)]
    pub is_poll: bool,

    #[serde(default)]
    pub allow_multiple: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub poll_options: Vec<PollOption>,

    /// Recorded choice per voter
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub votes: HashMap<String, VoteChoice>,

    /// Legacy projection: sorted key set of `votes`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub voters: Vec<String>,
}

/// Create-notice request
#[derive(Debug, Clone)]
pub struct NoticeInput {
    pub title: String,
    pub message: String,
    pub kind: Option<String>,

    /// Two or more options turn the notice into a poll
    pub poll_options: Option<Vec<String>>,
    pub allow_multiple: bool,
}

/// Verified author identity stamped onto created notices
#[derive(Debug, Clone)]
pub struct Author {
    pub email: String,
    pub display_name: Option<String>,
}

/// Admin text edit — never touches poll vote fields
#[derive(Debug, Clone, Default)]
pub struct NoticeUpdate {
    pub title: Option<String>,
    pub message: Option<String>,
    pub is_pinned: Option<bool>,
}

/// Result of a committed vote
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    /// Tallies after the vote
    pub options: Vec<PollOption>,

    /// The caller's selection after the vote (empty = no vote recorded)
    pub selected: Vec<usize>,
}
