use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declared source type of a channel.
///
/// Unknown type strings are kept as [`ChannelKind::Other`] instead of failing
/// deserialization, so a single bad record does not make the whole directory
/// unreadable. Resolution rejects them later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChannelKind {
    Youtube,
    Iptv,
    Other(String),
}

impl ChannelKind {
    pub fn as_str(&self) -> &str {
        match self {
            ChannelKind::Youtube => "youtube",
            ChannelKind::Iptv => "iptv",
            ChannelKind::Other(kind) => kind,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ChannelKind::Other(_))
    }
}

impl Default for ChannelKind {
    fn default() -> Self {
        ChannelKind::Other(String::new())
    }
}

impl From<String> for ChannelKind {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "youtube" => ChannelKind::Youtube,
            "iptv" => ChannelKind::Iptv,
            _ => ChannelKind::Other(value),
        }
    }
}

impl From<&str> for ChannelKind {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ChannelKind> for String {
    fn from(value: ChannelKind) -> Self {
        match value {
            ChannelKind::Other(kind) => kind,
            kind => kind.as_str().to_string(),
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single channel as listed in the directory.
///
/// Descriptors are read-only snapshots: resolution borrows them and produces a
/// separate [`super::ResolvedStream`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ChannelKind,
    // missing urls are reported by the resolver, not the parser
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChannelDescriptor {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<ChannelKind>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            url: url.into(),
            language: None,
            logo: None,
            extra: Map::new(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_logo(mut self, logo: impl Into<String>) -> Self {
        self.logo = Some(logo.into());
        self
    }
}
