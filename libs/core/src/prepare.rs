//! Validation and serialization of a [`Message`](crate::Message) into its wire payload.
use std::collections::HashMap;

use bytes::Bytes;
use serde::Serialize;

use crate::adaptivecard::{Attachment, Element, ElementHandle, MentionResolver};
use crate::error::CardError;
use crate::message::{Card, CardFormat};

/// Every addressable node of one card, built fresh for each prepare call.
#[derive(Debug, Default)]
pub struct TargetIndex {
    ids: HashMap<String, usize>,
    handles: HashMap<ElementHandle, Option<String>>,
}

impl TargetIndex {
    pub fn build(body: &[Element]) -> Self {
        let mut index = Self::default();
        for element in body {
            element.index_into(&mut index);
        }
        index
    }

    pub(crate) fn record(&mut self, handle: ElementHandle, id: Option<&str>) {
        // A cloned element shares its handle; the first one reached wins.
        self.handles
            .entry(handle)
            .or_insert_with(|| id.map(str::to_string));
        if let Some(id) = id {
            *self.ids.entry(id.to_string()).or_default() += 1;
        }
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// A toggle target must name exactly one element of the card.
    pub(crate) fn resolve_id(&self, id: &str) -> Result<String, CardError> {
        match self.ids.get(id).copied().unwrap_or(0) {
            0 => Err(CardError::UnresolvedTargetId {
                target: id.to_string(),
            }),
            1 => Ok(id.to_string()),
            count => Err(CardError::DuplicateTargetId {
                target: id.to_string(),
                count,
            }),
        }
    }

    pub(crate) fn resolve_handle(&self, handle: ElementHandle) -> Result<String, CardError> {
        match self.handles.get(&handle) {
            Some(Some(id)) => self.resolve_id(id),
            Some(None) => Err(CardError::UnresolvedTargetId {
                target: format!("{handle} (element has no id)"),
            }),
            None => Err(CardError::UnresolvedTargetId {
                target: handle.to_string(),
            }),
        }
    }
}

#[derive(Serialize)]
struct AdaptiveEnvelope {
    #[serde(rename = "type")]
    kind: &'static str,
    attachments: Vec<Attachment>,
}

/// Turns the cards of a message into the bytes posted to the webhook.
///
/// Works on copies: mentions and toggle targets are resolved into the output only, so running it
/// twice over the same cards yields identical bytes.
#[derive(Debug, Clone, Copy)]
pub struct Preparer {
    format: CardFormat,
}

impl Preparer {
    pub fn new(format: CardFormat) -> Self {
        Self { format }
    }

    pub fn prepare(&self, cards: &[Card]) -> Result<Bytes, CardError> {
        if cards.is_empty() {
            return Err(CardError::MissingCard);
        }
        for card in cards {
            if card.format() != self.format {
                return Err(CardError::CardFormatMismatch {
                    message: self.format,
                    card: card.format(),
                });
            }
        }

        let payload = match self.format {
            CardFormat::Adaptive => {
                let mut resolver = MentionResolver::new();
                let attachments = cards
                    .iter()
                    .filter_map(Card::as_adaptive)
                    .map(|card| card.to_attachment(&mut resolver))
                    .collect::<Result<Vec<_>, _>>()?;
                serde_json::to_vec(&AdaptiveEnvelope {
                    kind: "message",
                    attachments,
                })?
            }
            CardFormat::Legacy => {
                let [Card::Legacy(card)] = cards else {
                    return Err(CardError::element(
                        "MessageCard",
                        "a legacy message carries exactly one card",
                    ));
                };
                card.validate()?;
                serde_json::to_vec(card)?
            }
        };

        tracing::debug!(
            format = ?self.format,
            cards = cards.len(),
            bytes = payload.len(),
            "message prepared"
        );
        Ok(Bytes::from(payload))
    }
}
