use thiserror::Error;

use crate::message::CardFormat;

/// Local validation failures raised while building or preparing a [`crate::Message`].
///
/// None of these involve network I/O. A call that returns one of them leaves the model exactly as
/// it was before the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CardError {
    #[error("invalid {kind}: {reason}")]
    InvalidElementKind { kind: &'static str, reason: String },
    #[error("invalid {kind} action: {reason}")]
    InvalidAction { kind: &'static str, reason: String },
    #[error("action limit exceeded: {count} actions requested, at most {limit} supported")]
    ActionLimitExceeded { count: usize, limit: usize },
    #[error("invalid table shape: {0}")]
    InvalidTableShape(String),
    #[error("mention of {display_name:?} has an empty identity")]
    EmptyIdentity { display_name: String },
    #[error("mention display name is empty")]
    EmptyDisplayName,
    #[error("toggle target {target:?} does not resolve to an element of the card")]
    UnresolvedTargetId { target: String },
    #[error("toggle target id {target:?} is shared by {count} elements")]
    DuplicateTargetId { target: String, count: usize },
    #[error("cannot attach a {card:?} card to a {message:?} message")]
    CardFormatMismatch {
        message: CardFormat,
        card: CardFormat,
    },
    #[error("message has no card attached")]
    MissingCard,
    #[error("failed to serialize payload: {0}")]
    Serialize(String),
}

impl CardError {
    pub(crate) fn element(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidElementKind {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn action(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidAction {
            kind,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for CardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}
