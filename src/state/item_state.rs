/// Lifecycle of one queue item
///
/// Items move `Pending -> Active -> {Done | Error}`. Items left `Pending` when
/// a batch is cancelled are simply absent from the results.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current state of a queue item in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Waiting to be claimed by a worker
    Pending,

    /// Claimed by a worker and going through the pipeline
    Active,

    /// Resolved with a record
    Done,

    /// Resolved with a classified error
    Error,
}

impl ItemStatus {
    /// Returns true if the item has resolved
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Returns true if a state change from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: ItemStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active) | (Self::Active, Self::Done) | (Self::Active, Self::Error)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
