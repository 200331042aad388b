//! Rich notification format: Adaptive Cards delivered as message attachments.
//!
//! Cards own a tree of [`Element`]s plus a list of top-level [`Action`]s. Elements, columns,
//! table rows and cells each carry an [`ElementHandle`] that toggle actions can target before the
//! element has been given an `id`; the id is looked up when the message is prepared.
use serde::Serialize;
use uuid::Uuid;

mod action;
mod card;
mod element;
mod mention;
mod table;

pub use action::{Action, OpenUrl, Submit, TargetRef, ToggleTarget, ToggleVisibility};
pub use card::{AdaptiveCard, Attachment, CardContent, MsTeams};
pub use element::{
    ActionSet, Column, ColumnSet, ColumnWidth, Container, Element, Fact, FactSet, Image, TextBlock,
};
pub use mention::{Mention, MentionEntity, MentionResolver, Mentioned};
pub use table::{
    Table, TableCell, TableColumnDefinition, TableRow, table_cells_with_text_block,
};

pub(crate) use mention::MentionBlock;

pub const ATTACHMENT_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";
pub const ADAPTIVE_CARD_SCHEMA: &str = "http://adaptivecards.io/schemas/adaptive-card.json";
/// Highest schema version Teams renders for incoming webhooks.
pub const ADAPTIVE_CARD_VERSION: &str = "1.5";
/// Teams drops top-level actions beyond this count.
pub const TEAMS_ACTIONS_DISPLAY_LIMIT: usize = 6;

/// Stable identity of a node in a card tree, independent of its user-assigned `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(Uuid);

impl ElementHandle {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handle {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextSize {
    Small,
    Default,
    Medium,
    Large,
    ExtraLarge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextWeight {
    Lighter,
    Default,
    Bolder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextColor {
    Default,
    Dark,
    Light,
    Accent,
    Good,
    Warning,
    Attention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TextBlockStyle {
    Default,
    Heading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContainerStyle {
    Default,
    Emphasis,
    Good,
    Attention,
    Warning,
    Accent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageSize {
    Auto,
    Stretch,
    Small,
    Medium,
    Large,
}

/// Inserts `items` at the head (keeping their order) or at the tail of `target`.
pub(crate) fn insert_items<T>(target: &mut Vec<T>, top: bool, items: Vec<T>) {
    if top {
        target.splice(0..0, items);
    } else {
        target.extend(items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_items_keeps_order_at_head() {
        let mut items = vec![3, 4];
        insert_items(&mut items, true, vec![1, 2]);
        insert_items(&mut items, false, vec![5]);
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn handles_are_unique() {
        assert_ne!(ElementHandle::new(), ElementHandle::new());
    }
}
