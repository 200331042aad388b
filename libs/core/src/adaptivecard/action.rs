use serde::ser::{Error as _, SerializeStruct};
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::ElementHandle;
use crate::error::CardError;
use crate::prepare::TargetIndex;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Action {
    #[serde(rename = "Action.OpenUrl")]
    OpenUrl(OpenUrl),
    #[serde(rename = "Action.Submit")]
    Submit(Submit),
    #[serde(rename = "Action.ToggleVisibility")]
    ToggleVisibility(ToggleVisibility),
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::OpenUrl(_) => "Action.OpenUrl",
            Action::Submit(_) => "Action.Submit",
            Action::ToggleVisibility(_) => "Action.ToggleVisibility",
        }
    }

    pub fn validate(&self) -> Result<(), CardError> {
        match self {
            Action::OpenUrl(open) => {
                if open.url.trim().is_empty() {
                    return Err(CardError::action(self.kind(), "url is required"));
                }
            }
            Action::Submit(_) => {}
            Action::ToggleVisibility(toggle) => {
                if toggle.targets.is_empty() {
                    return Err(CardError::action(
                        self.kind(),
                        "at least one target element is required",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Rewrites handle targets into the ids they point at, failing on anything the card lacks.
    pub(crate) fn resolve_targets(&mut self, index: &TargetIndex) -> Result<(), CardError> {
        let Action::ToggleVisibility(toggle) = self else {
            return Ok(());
        };
        for target in &mut toggle.targets {
            let id = match &target.element {
                TargetRef::Id(id) => index.resolve_id(id)?,
                TargetRef::Handle(handle) => index.resolve_handle(*handle)?,
            };
            target.element = TargetRef::Id(id);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenUrl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub url: String,
}

impl OpenUrl {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: non_empty(title.into()),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Submit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Submit {
    pub fn new(title: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            title: non_empty(title.into()),
            data,
        }
    }
}

/// Shows, hides or flips the visibility of other elements of the same card.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToggleVisibility {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "targetElements")]
    pub targets: Vec<ToggleTarget>,
}

impl ToggleVisibility {
    /// An empty title is allowed for select actions on columns and containers.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: non_empty(title.into()),
            targets: Vec::new(),
        }
    }

    /// Adds targets by element id. `visible` of `None` flips the current state.
    pub fn add_target_ids<I, S>(&mut self, visible: Option<bool>, ids: I) -> Result<(), CardError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.iter().any(|id| id.trim().is_empty()) {
            return Err(CardError::action(
                "Action.ToggleVisibility",
                "target element id is empty",
            ));
        }
        self.targets.extend(ids.into_iter().map(|id| ToggleTarget {
            element: TargetRef::Id(id),
            is_visible: visible,
        }));
        Ok(())
    }

    /// Adds targets by handle; their ids are read when the message is prepared.
    pub fn add_targets(
        &mut self,
        visible: Option<bool>,
        handles: impl IntoIterator<Item = ElementHandle>,
    ) -> &mut Self {
        self.targets
            .extend(handles.into_iter().map(|handle| ToggleTarget {
                element: TargetRef::Handle(handle),
                is_visible: visible,
            }));
        self
    }

    pub fn add_visible_targets(
        &mut self,
        handles: impl IntoIterator<Item = ElementHandle>,
    ) -> &mut Self {
        self.add_targets(Some(true), handles)
    }

    pub fn add_hidden_targets(
        &mut self,
        handles: impl IntoIterator<Item = ElementHandle>,
    ) -> &mut Self {
        self.add_targets(Some(false), handles)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRef {
    Id(String),
    Handle(ElementHandle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleTarget {
    pub element: TargetRef,
    pub is_visible: Option<bool>,
}

impl Serialize for ToggleTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let TargetRef::Id(id) = &self.element else {
            return Err(S::Error::custom(
                "toggle target handle must be resolved before serialization",
            ));
        };
        match self.is_visible {
            None => serializer.serialize_str(id),
            Some(visible) => {
                let mut target = serializer.serialize_struct("TargetElement", 2)?;
                target.serialize_field("elementId", id)?;
                target.serialize_field("isVisible", &visible)?;
                target.end()
            }
        }
    }
}

impl From<OpenUrl> for Action {
    fn from(value: OpenUrl) -> Self {
        Action::OpenUrl(value)
    }
}

impl From<Submit> for Action {
    fn from(value: Submit) -> Self {
        Action::Submit(value)
    }
}

impl From<ToggleVisibility> for Action {
    fn from(value: ToggleVisibility) -> Self {
        Action::ToggleVisibility(value)
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
