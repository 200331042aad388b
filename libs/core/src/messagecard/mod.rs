//! Legacy Office 365 connector card (`MessageCard`). The card object itself is the wire payload.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::CardError;

/// Connector cards ignore potential actions beyond this count, per card and per section.
pub const POTENTIAL_ACTION_MAX: usize = 4;

const MESSAGE_CARD_TYPE: &str = "MessageCard";
const MESSAGE_CARD_CONTEXT: &str = "https://schema.org/extensions";

static THEME_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("theme color pattern must compile"));

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCard {
    #[serde(rename = "@type")]
    kind: &'static str,
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sections: Vec<Section>,
    #[serde(rename = "potentialAction", skip_serializing_if = "Vec::is_empty")]
    potential_actions: Vec<PotentialAction>,
}

impl Default for LegacyCard {
    fn default() -> Self {
        Self {
            kind: MESSAGE_CARD_TYPE,
            context: MESSAGE_CARD_CONTEXT,
            summary: None,
            title: None,
            text: None,
            theme_color: None,
            sections: Vec::new(),
            potential_actions: Vec::new(),
        }
    }
}

impl LegacyCard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_theme_color(mut self, color: impl Into<String>) -> Self {
        self.theme_color = Some(color.into());
        self
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn potential_actions(&self) -> &[PotentialAction] {
        &self.potential_actions
    }

    pub fn add_section(&mut self, section: Section) -> Result<(), CardError> {
        section.validate()?;
        self.sections.push(section);
        Ok(())
    }

    pub fn add_potential_action(&mut self, action: PotentialAction) -> Result<(), CardError> {
        action.validate()?;
        push_capped(&mut self.potential_actions, action)
    }

    pub fn validate(&self) -> Result<(), CardError> {
        let blank = |value: &Option<String>| value.as_deref().is_none_or(|v| v.trim().is_empty());
        if blank(&self.text) && blank(&self.summary) {
            return Err(CardError::element(
                "MessageCard",
                "text or summary is required",
            ));
        }
        if let Some(color) = &self.theme_color {
            if !THEME_COLOR.is_match(color) {
                return Err(CardError::element(
                    "MessageCard",
                    format!("theme color {color:?} is not #RRGGBB"),
                ));
            }
        }
        check_cap(self.potential_actions.len())?;
        self.potential_actions
            .iter()
            .try_for_each(PotentialAction::validate)?;
        self.sections.iter().try_for_each(Section::validate)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<SectionFact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<SectionImage>,
    pub markdown: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub start_group: bool,
    #[serde(rename = "potentialAction", skip_serializing_if = "Vec::is_empty")]
    potential_actions: Vec<PotentialAction>,
}

impl Section {
    pub fn new() -> Self {
        Self {
            markdown: true,
            ..Self::default()
        }
    }

    pub fn add_fact(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.facts.push(SectionFact {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn add_image(&mut self, image: impl Into<String>, title: Option<String>) -> &mut Self {
        self.images.push(SectionImage {
            image: image.into(),
            title,
        });
        self
    }

    pub fn add_potential_action(&mut self, action: PotentialAction) -> Result<(), CardError> {
        action.validate()?;
        push_capped(&mut self.potential_actions, action)
    }

    fn validate(&self) -> Result<(), CardError> {
        if self.images.iter().any(|image| image.image.trim().is_empty()) {
            return Err(CardError::element("Section", "image url is empty"));
        }
        if self.facts.iter().any(|fact| fact.name.trim().is_empty()) {
            return Err(CardError::element("Section", "fact name is empty"));
        }
        check_cap(self.potential_actions.len())?;
        self.potential_actions
            .iter()
            .try_for_each(PotentialAction::validate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionFact {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionImage {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "@type")]
pub enum PotentialAction {
    OpenUri {
        name: String,
        targets: Vec<OpenUriTarget>,
    },
    #[serde(rename = "HttpPOST", rename_all = "camelCase")]
    HttpPost {
        name: String,
        target: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        body: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        body_content_type: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenUriTarget {
    pub os: String,
    pub uri: String,
}

impl PotentialAction {
    /// An `OpenUri` action targeting `uri` on every client OS.
    pub fn open_uri(name: impl Into<String>, uri: impl Into<String>) -> Self {
        PotentialAction::OpenUri {
            name: name.into(),
            targets: vec![OpenUriTarget {
                os: "default".into(),
                uri: uri.into(),
            }],
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PotentialAction::OpenUri { name, .. } | PotentialAction::HttpPost { name, .. } => name,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            PotentialAction::OpenUri { .. } => "OpenUri",
            PotentialAction::HttpPost { .. } => "HttpPOST",
        }
    }

    pub fn validate(&self) -> Result<(), CardError> {
        if self.name().trim().is_empty() {
            return Err(CardError::action(self.kind(), "name is required"));
        }
        match self {
            PotentialAction::OpenUri { targets, .. } => {
                if targets.is_empty() || targets.iter().any(|t| t.uri.trim().is_empty()) {
                    return Err(CardError::action(
                        self.kind(),
                        "at least one non-empty target uri is required",
                    ));
                }
            }
            PotentialAction::HttpPost { target, .. } => {
                if target.trim().is_empty() {
                    return Err(CardError::action(self.kind(), "target url is required"));
                }
            }
        }
        Ok(())
    }
}

fn check_cap(count: usize) -> Result<(), CardError> {
    if count > POTENTIAL_ACTION_MAX {
        return Err(CardError::ActionLimitExceeded {
            count,
            limit: POTENTIAL_ACTION_MAX,
        });
    }
    Ok(())
}

fn push_capped(
    actions: &mut Vec<PotentialAction>,
    action: PotentialAction,
) -> Result<(), CardError> {
    check_cap(actions.len() + 1)?;
    actions.push(action);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_connector_envelope() {
        let mut card = LegacyCard::new()
            .with_title("Hello world")
            .with_text("formatted **text**")
            .with_theme_color("#DF813D");
        card.add_potential_action(PotentialAction::open_uri(
            "Project Homepage",
            "https://example.com/project",
        ))
        .unwrap();

        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(
            value,
            json!({
                "@type": "MessageCard",
                "@context": "https://schema.org/extensions",
                "title": "Hello world",
                "text": "formatted **text**",
                "themeColor": "#DF813D",
                "potentialAction": [{
                    "@type": "OpenUri",
                    "name": "Project Homepage",
                    "targets": [{"os": "default", "uri": "https://example.com/project"}]
                }]
            })
        );
    }

    #[test]
    fn potential_action_cap() {
        let mut card = LegacyCard::new().with_text("x");
        for n in 0..POTENTIAL_ACTION_MAX {
            card.add_potential_action(PotentialAction::open_uri(
                format!("a{n}"),
                "https://example.com",
            ))
            .unwrap();
        }
        let err = card
            .add_potential_action(PotentialAction::open_uri("extra", "https://example.com"))
            .unwrap_err();
        assert!(matches!(err, CardError::ActionLimitExceeded { limit: 4, .. }));
    }

    #[test]
    fn requires_text_or_summary() {
        let card = LegacyCard::new().with_title("only a title");
        assert!(matches!(
            card.validate(),
            Err(CardError::InvalidElementKind {
                kind: "MessageCard",
                ..
            })
        ));
    }

    #[test]
    fn rejects_bad_theme_color() {
        let card = LegacyCard::new().with_text("x").with_theme_color("orange");
        assert!(card.validate().is_err());
    }

    #[test]
    fn http_post_serializes_body_content_type() {
        let action = PotentialAction::HttpPost {
            name: "Ack".into(),
            target: "https://example.com/ack".into(),
            body: Some("{}".into()),
            body_content_type: Some("application/json".into()),
        };
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["@type"], "HttpPOST");
        assert_eq!(value["bodyContentType"], "application/json");
    }
}
