use serde::Serialize;

use super::{Element, TextBlock, insert_items};
use crate::error::CardError;

const MENTION_ENTITY_TYPE: &str = "mention";

/// A person to notify: the name shown in the card and the Teams identity (UPN, AAD object id or
/// email) the mention resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    display_name: String,
    id: String,
}

impl Mention {
    pub fn new(display_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            id: id.into(),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn validate(&self) -> Result<(), CardError> {
        if self.display_name.trim().is_empty() {
            return Err(CardError::EmptyDisplayName);
        }
        if self.id.trim().is_empty() {
            return Err(CardError::EmptyIdentity {
                display_name: self.display_name.clone(),
            });
        }
        Ok(())
    }
}

/// Entry of the `msteams.entities` table binding a placeholder to an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionEntity {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
    pub mentioned: Mentioned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mentioned {
    pub id: String,
    pub name: String,
}

/// Mentions queued by one `add_mention` call; they become one text block at prepare time.
#[derive(Debug, Clone)]
pub(crate) struct MentionBlock {
    pub(crate) mentions: Vec<Mention>,
    pub(crate) text: Option<String>,
    pub(crate) top: bool,
}

/// Hands out placeholder tokens in call order across every card of a message.
#[derive(Debug, Default)]
pub struct MentionResolver {
    next: usize,
}

impl MentionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placeholder(index: usize, display_name: &str) -> String {
        format!("<at id=\"{index}\">{display_name}</at>")
    }

    /// Claims the next token for `mention`.
    pub fn resolve(&mut self, mention: &Mention) -> Result<MentionEntity, CardError> {
        mention.validate()?;
        let text = Self::placeholder(self.next, &mention.display_name);
        self.next += 1;
        Ok(MentionEntity {
            kind: MENTION_ENTITY_TYPE,
            text,
            mentioned: Mentioned {
                id: mention.id.clone(),
                name: mention.display_name.clone(),
            },
        })
    }

    /// Turns each queued block into a text block placed at the requested end of `body` and
    /// returns the entity records in token order.
    pub(crate) fn resolve_blocks(
        &mut self,
        blocks: &[MentionBlock],
        body: &mut Vec<Element>,
    ) -> Result<Vec<MentionEntity>, CardError> {
        let mut entities = Vec::new();
        for block in blocks {
            let resolved = block
                .mentions
                .iter()
                .map(|mention| self.resolve(mention))
                .collect::<Result<Vec<_>, _>>()?;
            let mut text = resolved
                .iter()
                .map(|entity| entity.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            if let Some(extra) = block.text.as_deref().filter(|t| !t.is_empty()) {
                text.push(' ');
                text.push_str(extra);
            }
            insert_items(body, block.top, vec![TextBlock::new(text, true).into()]);
            entities.extend(resolved);
        }
        Ok(entities)
    }
}
