use serde::Serialize;

use super::element::{add_elements, validate_all};
use super::{
    ADAPTIVE_CARD_SCHEMA, ADAPTIVE_CARD_VERSION, ATTACHMENT_CONTENT_TYPE, Action, Element,
    Mention, MentionBlock, MentionEntity, MentionResolver, TEAMS_ACTIONS_DISPLAY_LIMIT,
    insert_items,
};
use crate::error::CardError;
use crate::prepare::TargetIndex;

/// An Adaptive Card under construction.
///
/// The body and action list are only reachable through methods that validate what goes in, so a
/// card never holds more top-level actions than Teams displays.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveCard {
    body: Vec<Element>,
    actions: Vec<Action>,
    mentions: Vec<MentionBlock>,
    full_width: bool,
}

impl AdaptiveCard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(&self) -> &[Element] {
        &self.body
    }

    /// Direct access to the body; whatever ends up here is re-validated at prepare time.
    pub fn body_mut(&mut self) -> &mut Vec<Element> {
        &mut self.body
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn full_width(&self) -> bool {
        self.full_width
    }

    pub fn set_full_width(&mut self, full_width: bool) {
        self.full_width = full_width;
    }

    pub fn add_element(
        &mut self,
        top: bool,
        elements: impl IntoIterator<Item = impl Into<Element>>,
    ) -> Result<(), CardError> {
        add_elements(&mut self.body, top, elements)
    }

    pub fn add_action(&mut self, top: bool, action: impl Into<Action>) -> Result<(), CardError> {
        let action = action.into();
        action.validate()?;
        let count = self.actions.len() + 1;
        if count > TEAMS_ACTIONS_DISPLAY_LIMIT {
            return Err(CardError::ActionLimitExceeded {
                count,
                limit: TEAMS_ACTIONS_DISPLAY_LIMIT,
            });
        }
        insert_items(&mut self.actions, top, vec![action]);
        Ok(())
    }

    /// Queues mentions rendered together in one text block at the head or tail of the body.
    ///
    /// Text is only rewritten when the message is prepared.
    pub fn add_mention(
        &mut self,
        top: bool,
        mentions: impl IntoIterator<Item = Mention>,
    ) -> Result<(), CardError> {
        self.queue_mentions(top, mentions.into_iter().collect(), None)
    }

    /// Queues a single mention followed by `text`.
    pub fn mention(
        &mut self,
        top: bool,
        display_name: impl Into<String>,
        id: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), CardError> {
        let text = text.into();
        let text = if text.is_empty() { None } else { Some(text) };
        self.queue_mentions(top, vec![Mention::new(display_name, id)], text)
    }

    pub fn mention_count(&self) -> usize {
        self.mentions.iter().map(|block| block.mentions.len()).sum()
    }

    fn queue_mentions(
        &mut self,
        top: bool,
        mentions: Vec<Mention>,
        text: Option<String>,
    ) -> Result<(), CardError> {
        if mentions.is_empty() {
            return Ok(());
        }
        mentions.iter().try_for_each(Mention::validate)?;
        self.mentions.push(MentionBlock {
            mentions,
            text,
            top,
        });
        Ok(())
    }

    /// Checks required fields of every element and action plus the action cap.
    pub fn validate(&self) -> Result<(), CardError> {
        if self.actions.len() > TEAMS_ACTIONS_DISPLAY_LIMIT {
            return Err(CardError::ActionLimitExceeded {
                count: self.actions.len(),
                limit: TEAMS_ACTIONS_DISPLAY_LIMIT,
            });
        }
        validate_all(&self.body)?;
        self.actions.iter().try_for_each(Action::validate)
    }

    /// Produces the attachment for this card without touching `self`.
    pub(crate) fn to_attachment(
        &self,
        resolver: &mut MentionResolver,
    ) -> Result<Attachment, CardError> {
        let index = TargetIndex::build(&self.body);

        let mut body = self.body.clone();
        let mut actions = self.actions.clone();
        for action in &mut actions {
            action.resolve_targets(&index)?;
        }
        for element in &mut body {
            element.visit_actions_mut(&mut |action: &mut Action| action.resolve_targets(&index))?;
        }

        let entities = resolver.resolve_blocks(&self.mentions, &mut body)?;

        let resolved = Self {
            body,
            actions,
            mentions: Vec::new(),
            full_width: self.full_width,
        };
        resolved.validate()?;

        let msteams = (resolved.full_width || !entities.is_empty()).then(|| MsTeams {
            width: resolved.full_width.then_some("Full"),
            entities,
        });

        Ok(Attachment {
            content_type: ATTACHMENT_CONTENT_TYPE,
            content_url: None,
            content: CardContent {
                kind: "AdaptiveCard",
                schema: ADAPTIVE_CARD_SCHEMA,
                version: ADAPTIVE_CARD_VERSION,
                body: resolved.body,
                actions: resolved.actions,
                msteams,
            },
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: &'static str,
    pub content_url: Option<String>,
    pub content: CardContent,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub version: &'static str,
    pub body: Vec<Element>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msteams: Option<MsTeams>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MsTeams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<MentionEntity>,
}
