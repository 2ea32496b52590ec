use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// Container or manifest type of a playable URL, guessed from its path extension.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StreamFormat {
    Hls,
    Dash,
    Mp4,
    Webm,
    Flv,
    Ts,
    Mkv,
    Mp3,
    Aac,
}

impl StreamFormat {
    pub fn as_str(&self) -> &str {
        match self {
            StreamFormat::Hls => "hls",
            StreamFormat::Dash => "dash",
            StreamFormat::Mp4 => "mp4",
            StreamFormat::Webm => "webm",
            StreamFormat::Flv => "flv",
            StreamFormat::Ts => "ts",
            StreamFormat::Mkv => "mkv",
            StreamFormat::Mp3 => "mp3",
            StreamFormat::Aac => "aac",
        }
    }

    pub fn from_extension(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "m3u8" => Some(StreamFormat::Hls),
            "mpd" => Some(StreamFormat::Dash),
            "mp4" | "m4v" => Some(StreamFormat::Mp4),
            "webm" => Some(StreamFormat::Webm),
            "flv" => Some(StreamFormat::Flv),
            "ts" => Some(StreamFormat::Ts),
            "mkv" => Some(StreamFormat::Mkv),
            "mp3" => Some(StreamFormat::Mp3),
            "aac" => Some(StreamFormat::Aac),
            _ => None,
        }
    }

    /// Detects the format from the last path segment of `url`.
    ///
    /// Query strings and fragments are ignored, so
    /// `https://cdn.example.com/live/index.m3u8?token=abc` is HLS. Strings
    /// that do not parse as absolute URLs are split by hand.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = match Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => url
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string(),
        };

        let file_name = path.rsplit('/').next()?;
        let (_, extension) = file_name.rsplit_once('.')?;
        Self::from_extension(extension)
    }
}

/// Whether `url` already points at a media resource a player can open directly.
pub fn is_direct_media_url(url: &str) -> bool {
    StreamFormat::from_url(url).is_some()
}

impl Display for StreamFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StreamFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hls" => Ok(StreamFormat::Hls),
            "dash" => Ok(StreamFormat::Dash),
            "mp4" => Ok(StreamFormat::Mp4),
            "webm" => Ok(StreamFormat::Webm),
            "flv" => Ok(StreamFormat::Flv),
            "ts" => Ok(StreamFormat::Ts),
            "mkv" => Ok(StreamFormat::Mkv),
            "mp3" => Ok(StreamFormat::Mp3),
            "aac" => Ok(StreamFormat::Aac),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_format_from_path_extension() {
        assert_eq!(
            StreamFormat::from_url("https://example.com/stream.m3u8"),
            Some(StreamFormat::Hls)
        );
        assert_eq!(
            StreamFormat::from_url("https://cdn.example.com/live/INDEX.M3U8?token=abc#t=1"),
            Some(StreamFormat::Hls)
        );
        assert_eq!(
            StreamFormat::from_url("http://example.com/vod/manifest.mpd"),
            Some(StreamFormat::Dash)
        );
        assert_eq!(
            StreamFormat::from_url("http://example.com/clip.m4v"),
            Some(StreamFormat::Mp4)
        );
    }

    #[test]
    fn page_urls_are_not_direct_media() {
        assert!(!is_direct_media_url("https://example.com/live/channel-page"));
        assert!(!is_direct_media_url("https://example.com/watch?file=stream.m3u8"));
        assert!(!is_direct_media_url("https://example.com/"));
        assert!(!is_direct_media_url("not-a-valid-url"));
    }

    #[test]
    fn unparsable_urls_fall_back_to_manual_split() {
        assert_eq!(
            StreamFormat::from_url("stream.ts?x=1"),
            Some(StreamFormat::Ts)
        );
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("HLS".parse::<StreamFormat>(), Ok(StreamFormat::Hls));
        assert!("m3u".parse::<StreamFormat>().is_err());
    }
}
