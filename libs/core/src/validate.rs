//! Webhook URL policy: an ordered set of regular expressions a destination must fully match.
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use url::Url;

/// Production incoming-webhook hosts.
pub const DEFAULT_WEBHOOK_URL_PATTERN: &str = r"^https://outlook\.office(?:365)?\.com/.*$";

static DEFAULT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    anchored(DEFAULT_WEBHOOK_URL_PATTERN).expect("default webhook pattern must compile")
});

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid webhook url pattern {pattern:?}: {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Wraps `pattern` so it has to cover the whole URL; a match on a prefix is not enough.
fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})$"))
}

#[derive(Debug, Clone)]
pub struct WebhookUrlValidator {
    patterns: Vec<(String, Regex)>,
}

impl Default for WebhookUrlValidator {
    fn default() -> Self {
        Self {
            patterns: vec![(
                DEFAULT_WEBHOOK_URL_PATTERN.to_string(),
                DEFAULT_PATTERN.clone(),
            )],
        }
    }
}

impl WebhookUrlValidator {
    /// A validator with no patterns; it accepts nothing until patterns are added.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Appends patterns, skipping exact repeats. Nothing is added if any pattern fails to compile.
    pub fn add_patterns<I, S>(&mut self, patterns: I) -> Result<(), PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled: Vec<(String, Regex)> = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let known = self.patterns.iter().chain(compiled.iter()).any(|(p, _)| p == pattern);
            if known {
                continue;
            }
            let regex = anchored(pattern).map_err(|source| PatternError::Invalid {
                pattern: pattern.to_string(),
                source,
            })?;
            compiled.push((pattern.to_string(), regex));
        }
        self.patterns.extend(compiled);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|(pattern, _)| pattern.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True when `url` parses as an absolute URL and some pattern matches all of it.
    pub fn validate(&self, url: &str) -> bool {
        if Url::parse(url).is_err() {
            return false;
        }
        self.patterns.iter().any(|(_, regex)| regex.is_match(url))
    }
}
