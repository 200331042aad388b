//! Process-wide tracing setup for binaries built on this crate.
//!
//! The library only emits `tracing` events; installing a subscriber is left to the caller.
use std::sync::OnceLock;

use tracing_subscriber::layer::Layer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

static INIT: OnceLock<()> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    /// JSON unless `LOG_FORMAT` asks for text.
    pub fn from_env() -> Self {
        Self::parse(std::env::var(ENV_LOG_FORMAT).ok().as_deref())
    }

    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "text" | "pretty" | "plain") => LogFormat::Text,
            _ => LogFormat::Json,
        }
    }
}

/// Installs the global subscriber once; later calls are no-ops.
///
/// Filtering follows `RUST_LOG`, defaulting to `info`.
pub fn install(service_name: &str) {
    if INIT.get().is_some() {
        return;
    }

    let format = LogFormat::from_env();
    let fmt_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer().boxed(),
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .ok();

    INIT.set(()).ok();
    tracing::debug!(service = service_name, ?format, "tracing initialised");
}
