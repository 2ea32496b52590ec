use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::DirectoryError;
use super::matching;
use crate::media::{ChannelDescriptor, ChannelKind};

/// Number of suggestions returned when the caller does not ask for a limit.
pub const DEFAULT_SUGGESTIONS: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryEntry {
    pub channels: Vec<ChannelDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// IANA timezone name, e.g. `Europe/Paris`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CountryEntry {
    /// Wall clock time (`HH:MM`) in this country's timezone.
    pub fn local_time(&self, now: DateTime<Utc>) -> Option<String> {
        let tz: Tz = self.timezone.as_deref()?.parse().ok()?;
        Some(now.with_timezone(&tz).format("%H:%M").to_string())
    }
}

/// Read-only snapshot of the channel directory, keyed by country.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directory {
    countries: BTreeMap<String, CountryEntry>,
}

impl Directory {
    pub fn new(countries: BTreeMap<String, CountryEntry>) -> Self {
        Self { countries }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, DirectoryError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn countries(&self) -> impl Iterator<Item = (&str, &CountryEntry)> {
        self.countries
            .iter()
            .map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.countries.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&CountryEntry> {
        self.countries.get(key)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn channel_count(&self) -> usize {
        self.countries.values().map(|entry| entry.channels.len()).sum()
    }

    /// Looks up a country by a display name, see [`matching::match_key`].
    pub fn match_country(&self, display_name: &str) -> Option<(&str, &CountryEntry)> {
        let key = matching::match_key(display_name, self.keys())?;
        self.countries.get_key_value(key).map(|(k, v)| (k.as_str(), v))
    }

    pub fn suggest(&self, query: &str, limit: usize) -> Vec<&str> {
        matching::suggest(query, self.keys(), limit)
    }

    /// Reports records a player would not be able to use. Nothing is removed.
    pub fn validate(&self) -> Vec<DirectoryIssue> {
        let mut issues = vec![];

        for (country, entry) in &self.countries {
            if entry.channels.is_empty() {
                issues.push(DirectoryIssue::EmptyCountry {
                    country: country.clone(),
                });
            }

            for (index, channel) in entry.channels.iter().enumerate() {
                if channel.name.trim().is_empty() {
                    issues.push(DirectoryIssue::MissingName {
                        country: country.clone(),
                        index,
                    });
                }
                if channel.url.trim().is_empty() {
                    issues.push(DirectoryIssue::MissingUrl {
                        country: country.clone(),
                        channel: channel.name.clone(),
                    });
                }
                if let ChannelKind::Other(kind) = &channel.kind {
                    issues.push(DirectoryIssue::UnsupportedType {
                        country: country.clone(),
                        channel: channel.name.clone(),
                        kind: kind.clone(),
                    });
                }
            }
        }

        issues
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryIssue {
    EmptyCountry {
        country: String,
    },
    MissingName {
        country: String,
        index: usize,
    },
    MissingUrl {
        country: String,
        channel: String,
    },
    UnsupportedType {
        country: String,
        channel: String,
        kind: String,
    },
}

impl fmt::Display for DirectoryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryIssue::EmptyCountry { country } => write!(f, "{country}: no channels"),
            DirectoryIssue::MissingName { country, index } => {
                write!(f, "{country}: channel #{index} has no name")
            }
            DirectoryIssue::MissingUrl { country, channel } => {
                write!(f, "{country}: channel {channel:?} has no url")
            }
            DirectoryIssue::UnsupportedType {
                country,
                channel,
                kind,
            } => write!(f, "{country}: channel {channel:?} has unsupported type {kind:?}"),
        }
    }
}
