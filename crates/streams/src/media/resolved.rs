use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::formats::StreamFormat;

/// What the caller intends to do with the resolved URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// An embeddable player page (e.g. a YouTube iframe) is acceptable.
    #[default]
    Embed,
    /// A raw media URL for a native playback element is required.
    Direct,
}

impl FromStr for PlaybackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "embed" => Ok(PlaybackMode::Embed),
            "direct" => Ok(PlaybackMode::Direct),
            other => Err(format!("unknown playback mode: {other}")),
        }
    }
}

/// How a [`ResolvedStream`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMethod {
    /// The source URL was already a direct media URL.
    Passthrough,
    /// The source URL was (or was rewritten to) an embeddable player URL.
    Embed,
    /// The external extraction tool produced the URL.
    Extracted,
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionMethod::Passthrough => "passthrough",
            ResolutionMethod::Embed => "embed",
            ResolutionMethod::Extracted => "extracted",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStream {
    // The descriptor url this resolution was requested for
    pub source_url: String,
    // Url usable by a playback element or embed frame
    pub playable_url: String,
    pub resolved_at: DateTime<Utc>,
    pub method: ResolutionMethod,
    pub format: Option<StreamFormat>,
}

impl ResolvedStream {
    pub fn new(
        source_url: impl Into<String>,
        playable_url: impl Into<String>,
        method: ResolutionMethod,
    ) -> Self {
        let playable_url = playable_url.into();
        let format = StreamFormat::from_url(&playable_url);
        Self {
            source_url: source_url.into(),
            playable_url,
            resolved_at: Utc::now(),
            method,
            format,
        }
    }

    /// True when the playable url is exactly the source url.
    pub fn is_unchanged(&self) -> bool {
        self.source_url == self.playable_url
    }
}

impl fmt::Display for ResolvedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            Some(format) => write!(f, "{} ({}, {})", self.playable_url, self.method, format),
            None => write!(f, "{} ({})", self.playable_url, self.method),
        }
    }
}
