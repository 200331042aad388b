//! Microsoft Teams incoming-webhook notifications.
//!
//! Build a [`Message`] from Adaptive Cards or a legacy connector card, then hand it to a
//! [`TeamsClient`] which checks the webhook URL, prepares the payload once and posts it.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use teams_notify::{Message, TeamsClient};
//!
//! let client = TeamsClient::new()?;
//! let mut message = Message::simple("Deploy finished", "CI", true)?;
//! client
//!     .send("https://outlook.office.com/webhook/xxx", &mut message)
//!     .await?;
//! # Ok(())
//! # }
//! ```
pub mod adaptivecard;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod message;
pub mod messagecard;
pub mod prepare;
pub mod telemetry;
pub mod validate;

pub use adaptivecard::{
    Action, AdaptiveCard, Column, ColumnSet, Container, Element, ElementHandle, FactSet, Image,
    Mention, OpenUrl, Submit, Table, TableCell, TextBlock, ToggleVisibility,
};
pub use client::{SendError, TeamsClient};
pub use config::ClientConfig;
pub use error::CardError;
pub use self::http::{HttpClient, RawResponse, ReqwestHttpClient};
pub use message::{Card, CardFormat, Message};
pub use messagecard::{LegacyCard, PotentialAction, Section};
pub use validate::{PatternError, WebhookUrlValidator};
