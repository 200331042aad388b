use serde::{Serialize, Serializer};

use super::table::Table;
use super::{
    Action, ContainerStyle, ElementHandle, HorizontalAlignment, ImageSize, TextBlockStyle,
    TextColor, TextSize, TextWeight, VerticalAlignment, insert_items,
};
use crate::error::CardError;
use crate::prepare::TargetIndex;

/// One node of a card body.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Element {
    TextBlock(TextBlock),
    Image(Image),
    Container(Container),
    ColumnSet(ColumnSet),
    FactSet(FactSet),
    ActionSet(ActionSet),
    Table(Table),
}

impl Element {
    pub fn kind(&self) -> &'static str {
        match self {
            Element::TextBlock(_) => "TextBlock",
            Element::Image(_) => "Image",
            Element::Container(_) => "Container",
            Element::ColumnSet(_) => "ColumnSet",
            Element::FactSet(_) => "FactSet",
            Element::ActionSet(_) => "ActionSet",
            Element::Table(_) => "Table",
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Element::TextBlock(e) => e.id.as_deref(),
            Element::Image(e) => e.id.as_deref(),
            Element::Container(e) => e.id.as_deref(),
            Element::ColumnSet(e) => e.id.as_deref(),
            Element::FactSet(e) => e.id.as_deref(),
            Element::ActionSet(e) => e.id.as_deref(),
            Element::Table(e) => e.id.as_deref(),
        }
    }

    pub fn handle(&self) -> ElementHandle {
        match self {
            Element::TextBlock(e) => e.handle,
            Element::Image(e) => e.handle,
            Element::Container(e) => e.handle,
            Element::ColumnSet(e) => e.handle,
            Element::FactSet(e) => e.handle,
            Element::ActionSet(e) => e.handle,
            Element::Table(e) => e.handle(),
        }
    }

    /// Checks the fields each element kind cannot do without, recursing into children.
    pub fn validate(&self) -> Result<(), CardError> {
        match self {
            Element::TextBlock(_) => Ok(()),
            Element::Image(image) => {
                if image.url.trim().is_empty() {
                    return Err(CardError::element("Image", "url is required"));
                }
                Ok(())
            }
            Element::Container(container) => {
                validate_all(&container.items)?;
                validate_select_action(container.select_action.as_ref())
            }
            Element::ColumnSet(set) => {
                for column in &set.columns {
                    column.validate()?;
                }
                validate_select_action(set.select_action.as_ref())
            }
            Element::FactSet(set) => {
                if set.facts.is_empty() {
                    return Err(CardError::element("FactSet", "at least one fact is required"));
                }
                if set.facts.iter().any(|fact| fact.title.trim().is_empty()) {
                    return Err(CardError::element("FactSet", "fact title is empty"));
                }
                Ok(())
            }
            Element::ActionSet(set) => {
                if set.actions.is_empty() {
                    return Err(CardError::element(
                        "ActionSet",
                        "at least one action is required",
                    ));
                }
                set.actions.iter().try_for_each(Action::validate)
            }
            Element::Table(table) => table.validate(),
        }
    }

    /// Records every node of this subtree, children before their parent.
    pub(crate) fn index_into(&self, index: &mut TargetIndex) {
        match self {
            Element::Container(container) => {
                for item in &container.items {
                    item.index_into(index);
                }
            }
            Element::ColumnSet(set) => {
                for column in &set.columns {
                    for item in &column.items {
                        item.index_into(index);
                    }
                    index.record(column.handle, column.id.as_deref());
                }
            }
            Element::Table(table) => table.index_into(index),
            _ => {}
        }
        index.record(self.handle(), self.id());
    }

    /// Visits every action reachable from this subtree.
    pub(crate) fn visit_actions_mut(
        &mut self,
        visit: &mut dyn FnMut(&mut Action) -> Result<(), CardError>,
    ) -> Result<(), CardError> {
        match self {
            Element::Container(container) => {
                if let Some(action) = container.select_action.as_mut() {
                    visit(action)?;
                }
                for item in &mut container.items {
                    item.visit_actions_mut(visit)?;
                }
            }
            Element::ColumnSet(set) => {
                if let Some(action) = set.select_action.as_mut() {
                    visit(action)?;
                }
                for column in &mut set.columns {
                    if let Some(action) = column.select_action.as_mut() {
                        visit(action)?;
                    }
                    for item in &mut column.items {
                        item.visit_actions_mut(visit)?;
                    }
                }
            }
            Element::ActionSet(set) => {
                for action in &mut set.actions {
                    visit(action)?;
                }
            }
            Element::Table(table) => {
                for cell in table.rows.iter_mut().flat_map(|row| row.cells.iter_mut()) {
                    for item in &mut cell.items {
                        item.visit_actions_mut(visit)?;
                    }
                }
            }
            Element::TextBlock(_) | Element::Image(_) | Element::FactSet(_) => {}
        }
        Ok(())
    }
}

pub(crate) fn validate_all(elements: &[Element]) -> Result<(), CardError> {
    elements.iter().try_for_each(Element::validate)
}

fn validate_select_action(action: Option<&Action>) -> Result<(), CardError> {
    action.map_or(Ok(()), Action::validate)
}

/// Validates `elements` as a whole before inserting any of them.
pub(crate) fn add_elements(
    target: &mut Vec<Element>,
    top: bool,
    elements: impl IntoIterator<Item = impl Into<Element>>,
) -> Result<(), CardError> {
    let elements: Vec<Element> = elements.into_iter().map(Into::into).collect();
    validate_all(&elements)?;
    insert_items(target, top, elements);
    Ok(())
}

macro_rules! element_from {
    ($($ty:ident),+) => {
        $(impl From<$ty> for Element {
            fn from(value: $ty) -> Self {
                Element::$ty(value)
            }
        })+
    };
}

element_from!(TextBlock, Image, Container, ColumnSet, FactSet, ActionSet, Table);

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    #[serde(skip)]
    handle: ElementHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<TextSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<TextWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<TextColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<TextBlockStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_alignment: Option<HorizontalAlignment>,
    pub wrap: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_subtle: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub separator: bool,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, wrap: bool) -> Self {
        Self {
            text: text.into(),
            wrap,
            ..Self::default()
        }
    }

    /// Large bold text intended as the first element of a card.
    pub fn title(text: impl Into<String>, wrap: bool) -> Self {
        Self {
            size: Some(TextSize::Large),
            weight: Some(TextWeight::Bolder),
            style: Some(TextBlockStyle::Heading),
            ..Self::new(text, wrap)
        }
    }

    /// Text that stays invisible until a toggle action reveals it.
    pub fn hidden(text: impl Into<String>, wrap: bool) -> Self {
        Self {
            is_visible: Some(false),
            ..Self::new(text, wrap)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn handle(&self) -> ElementHandle {
        self.handle
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(skip)]
    handle: ElementHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<ImageSize>,
}

impl Image {
    pub fn new(url: impl Into<String>, alt_text: Option<String>) -> Self {
        Self {
            url: url.into(),
            alt_text,
            ..Self::default()
        }
    }

    pub fn handle(&self) -> ElementHandle {
        self.handle
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(skip)]
    handle: ElementHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub items: Vec<Element>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ContainerStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub separator: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select_action: Option<Action>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hidden() -> Self {
        Self {
            is_visible: Some(false),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn handle(&self) -> ElementHandle {
        self.handle
    }

    pub fn add_element(
        &mut self,
        top: bool,
        elements: impl IntoIterator<Item = impl Into<Element>>,
    ) -> Result<(), CardError> {
        add_elements(&mut self.items, top, elements)
    }

    pub fn set_select_action(&mut self, action: impl Into<Action>) -> Result<(), CardError> {
        let action = action.into();
        action.validate()?;
        self.select_action = Some(action);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSet {
    #[serde(skip)]
    handle: ElementHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub columns: Vec<Column>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub separator: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select_action: Option<Action>,
}

impl ColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> ElementHandle {
        self.handle
    }

    pub fn add_column(&mut self, top: bool, column: Column) -> Result<(), CardError> {
        column.validate()?;
        insert_items(&mut self.columns, top, vec![column]);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnWidth {
    Auto,
    Stretch,
    Weight(u32),
}

impl Serialize for ColumnWidth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ColumnWidth::Auto => serializer.serialize_str("auto"),
            ColumnWidth::Stretch => serializer.serialize_str("stretch"),
            ColumnWidth::Weight(weight) => serializer.serialize_u32(*weight),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "type", rename = "Column", rename_all = "camelCase")]
pub struct Column {
    #[serde(skip)]
    handle: ElementHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<ColumnWidth>,
    pub items: Vec<Element>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_content_alignment: Option<VerticalAlignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select_action: Option<Action>,
}

impl Column {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn handle(&self) -> ElementHandle {
        self.handle
    }

    pub fn add_element(
        &mut self,
        top: bool,
        elements: impl IntoIterator<Item = impl Into<Element>>,
    ) -> Result<(), CardError> {
        add_elements(&mut self.items, top, elements)
    }

    pub fn set_select_action(&mut self, action: impl Into<Action>) -> Result<(), CardError> {
        let action = action.into();
        action.validate()?;
        self.select_action = Some(action);
        Ok(())
    }

    fn validate(&self) -> Result<(), CardError> {
        validate_all(&self.items)?;
        validate_select_action(self.select_action.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fact {
    pub title: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FactSet {
    #[serde(skip)]
    handle: ElementHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub facts: Vec<Fact>,
}

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> ElementHandle {
        self.handle
    }

    pub fn add_fact(&mut self, title: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.facts.push(Fact {
            title: title.into(),
            value: value.into(),
        });
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionSet {
    #[serde(skip)]
    handle: ElementHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub actions: Vec<Action>,
}

impl ActionSet {
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            actions,
            ..Self::default()
        }
    }

    pub fn handle(&self) -> ElementHandle {
        self.handle
    }
}
