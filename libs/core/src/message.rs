use bytes::Bytes;
use serde::Serialize;

use crate::adaptivecard::{Action, AdaptiveCard, Element, Mention, TextBlock};
use crate::error::CardError;
use crate::messagecard::LegacyCard;
use crate::prepare::Preparer;

/// Wire schema a message is serialized with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardFormat {
    /// Adaptive Cards wrapped in a `message` envelope.
    Adaptive,
    /// The flat Office 365 connector `MessageCard`.
    Legacy,
}

#[derive(Debug, Clone)]
pub enum Card {
    Adaptive(AdaptiveCard),
    Legacy(LegacyCard),
}

impl Card {
    pub fn format(&self) -> CardFormat {
        match self {
            Card::Adaptive(_) => CardFormat::Adaptive,
            Card::Legacy(_) => CardFormat::Legacy,
        }
    }

    pub fn as_adaptive(&self) -> Option<&AdaptiveCard> {
        match self {
            Card::Adaptive(card) => Some(card),
            Card::Legacy(_) => None,
        }
    }
}

impl From<AdaptiveCard> for Card {
    fn from(card: AdaptiveCard) -> Self {
        Card::Adaptive(card)
    }
}

impl From<LegacyCard> for Card {
    fn from(card: LegacyCard) -> Self {
        Card::Legacy(card)
    }
}

#[derive(Debug, Clone, Default)]
enum PrepareState {
    #[default]
    Unprepared,
    Prepared(Bytes),
}

/// Root of a notification: one or more cards of a single format plus the cached wire payload.
///
/// Every mutating method goes through [`Message::mutate`] (or hands out `&mut` access after
/// dropping the cache), so a prepared payload always matches the cards it was built from.
#[derive(Debug, Clone)]
pub struct Message {
    format: CardFormat,
    cards: Vec<Card>,
    state: PrepareState,
}

impl Message {
    pub fn new(format: CardFormat) -> Self {
        Self {
            format,
            cards: Vec::new(),
            state: PrepareState::Unprepared,
        }
    }

    pub fn from_card(card: impl Into<Card>) -> Self {
        let card = card.into();
        Self {
            format: card.format(),
            cards: vec![card],
            state: PrepareState::Unprepared,
        }
    }

    /// A single adaptive card holding an optional title and a text block.
    pub fn simple(text: &str, title: &str, wrap: bool) -> Result<Self, CardError> {
        if text.trim().is_empty() && title.trim().is_empty() {
            return Err(CardError::element(
                "TextBlock",
                "message text and title are both empty",
            ));
        }
        let mut card = AdaptiveCard::new();
        if !title.is_empty() {
            card.add_element(false, [TextBlock::title(title, wrap)])?;
        }
        if !text.is_empty() {
            card.add_element(false, [TextBlock::new(text, wrap)])?;
        }
        Ok(Self::from_card(card))
    }

    /// A single adaptive card mentioning one user followed by `text`.
    pub fn mention(display_name: &str, id: &str, text: &str) -> Result<Self, CardError> {
        let mut card = AdaptiveCard::new();
        card.mention(false, display_name, id, text)?;
        Ok(Self::from_card(card))
    }

    pub fn format(&self) -> CardFormat {
        self.format
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Mutable access to the cards. Drops any prepared payload.
    pub fn cards_mut(&mut self) -> &mut Vec<Card> {
        self.invalidate();
        &mut self.cards
    }

    /// Mutable access to one adaptive card. Drops any prepared payload.
    pub fn adaptive_card_mut(&mut self, index: usize) -> Option<&mut AdaptiveCard> {
        self.invalidate();
        match self.cards.get_mut(index) {
            Some(Card::Adaptive(card)) => Some(card),
            _ => None,
        }
    }

    /// Mutable access to the legacy card. Drops any prepared payload.
    pub fn legacy_card_mut(&mut self) -> Option<&mut LegacyCard> {
        self.invalidate();
        match self.cards.first_mut() {
            Some(Card::Legacy(card)) => Some(card),
            _ => None,
        }
    }

    pub fn attach(&mut self, card: impl Into<Card>) -> Result<(), CardError> {
        let card = card.into();
        let format = self.format;
        self.mutate(move |cards| {
            if card.format() != format {
                return Err(CardError::CardFormatMismatch {
                    message: format,
                    card: card.format(),
                });
            }
            if format == CardFormat::Legacy && !cards.is_empty() {
                return Err(CardError::element(
                    "MessageCard",
                    "a legacy message carries exactly one card",
                ));
            }
            cards.push(card);
            Ok(())
        })
    }

    /// Adds elements to the first adaptive card, creating it when the message has none.
    pub fn add_element(
        &mut self,
        top: bool,
        elements: impl IntoIterator<Item = impl Into<Element>>,
    ) -> Result<(), CardError> {
        let elements: Vec<Element> = elements.into_iter().map(Into::into).collect();
        self.with_first_adaptive(|card| card.add_element(top, elements))
    }

    pub fn add_action(&mut self, top: bool, action: impl Into<Action>) -> Result<(), CardError> {
        let action = action.into();
        self.with_first_adaptive(|card| card.add_action(top, action))
    }

    pub fn add_mention(
        &mut self,
        top: bool,
        mentions: impl IntoIterator<Item = Mention>,
    ) -> Result<(), CardError> {
        let mentions: Vec<Mention> = mentions.into_iter().collect();
        self.with_first_adaptive(|card| card.add_mention(top, mentions))
    }

    /// Queues a mention of one user followed by `text` on the first adaptive card.
    pub fn mention_user(
        &mut self,
        top: bool,
        display_name: &str,
        id: &str,
        text: &str,
    ) -> Result<(), CardError> {
        self.with_first_adaptive(|card| card.mention(top, display_name, id, text))
    }

    pub fn is_prepared(&self) -> bool {
        matches!(self.state, PrepareState::Prepared(_))
    }

    /// Validates and serializes the message, caching the result until the next mutation.
    ///
    /// On failure the message stays unprepared and its cards are untouched.
    pub fn prepare(&mut self) -> Result<Bytes, CardError> {
        if let PrepareState::Prepared(payload) = &self.state {
            return Ok(payload.clone());
        }
        let payload = Preparer::new(self.format).prepare(&self.cards)?;
        self.state = PrepareState::Prepared(payload.clone());
        Ok(payload)
    }

    /// The cached payload, if the message is prepared.
    pub fn payload(&self) -> Option<&Bytes> {
        match &self.state {
            PrepareState::Prepared(payload) => Some(payload),
            PrepareState::Unprepared => None,
        }
    }

    /// Indented JSON of the prepared payload, preparing first when needed.
    pub fn pretty_print(&mut self) -> Result<String, CardError> {
        let payload = self.prepare()?;
        let value: serde_json::Value = serde_json::from_slice(&payload)?;
        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn invalidate(&mut self) {
        if self.is_prepared() {
            tracing::trace!("message mutated; dropping prepared payload");
        }
        self.state = PrepareState::Unprepared;
    }

    /// Applies `change` to the cards and drops the cached payload only if it succeeded.
    fn mutate<T>(
        &mut self,
        change: impl FnOnce(&mut Vec<Card>) -> Result<T, CardError>,
    ) -> Result<T, CardError> {
        let out = change(&mut self.cards)?;
        self.invalidate();
        Ok(out)
    }

    fn with_first_adaptive<T>(
        &mut self,
        change: impl FnOnce(&mut AdaptiveCard) -> Result<T, CardError>,
    ) -> Result<T, CardError> {
        if self.format != CardFormat::Adaptive {
            return Err(CardError::CardFormatMismatch {
                message: self.format,
                card: CardFormat::Adaptive,
            });
        }
        self.mutate(|cards| {
            let created = cards.is_empty();
            if created {
                cards.push(Card::Adaptive(AdaptiveCard::new()));
            }
            let result = match cards.first_mut() {
                Some(Card::Adaptive(card)) => change(card),
                _ => Err(CardError::MissingCard),
            };
            if result.is_err() && created {
                cards.clear();
            }
            result
        })
    }
}
