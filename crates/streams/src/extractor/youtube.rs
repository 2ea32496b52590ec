use std::sync::LazyLock;

use regex::Regex;

pub static EMBED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?(?:youtube\.com|youtube-nocookie\.com)/embed/[^/?#]+").unwrap()
});

pub static WATCH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(?:(?:www\.|m\.)?youtube\.com/(?:watch\?(?:[^#]*&)?v=|shorts/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .unwrap()
});

const EMBED_BASE_URL: &str = "https://www.youtube.com/embed/";

pub fn is_embed_url(url: &str) -> bool {
    EMBED_REGEX.is_match(url)
}

/// Extracts the 11 character video id from a watch, short, live or youtu.be url.
pub fn video_id(url: &str) -> Option<&str> {
    WATCH_REGEX
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str())
}

/// Returns an embeddable player url for `url`, if one can be derived without
/// asking the extraction tool.
pub fn embed_url(url: &str) -> Option<String> {
    if is_embed_url(url) {
        return Some(url.to_string());
    }
    video_id(url).map(|id| format!("{EMBED_BASE_URL}{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_embed_urls() {
        assert!(is_embed_url("https://www.youtube.com/embed/dQw4w9WgXcQ"));
        assert!(is_embed_url(
            "https://www.youtube.com/embed/live_stream?channel=UC123"
        ));
        assert!(is_embed_url("https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ"));
        assert!(!is_embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!is_embed_url("not-a-valid-url"));
        // only youtube player pages count as embeddable
        assert!(!is_embed_url("https://player.vimeo.com/video/76979871"));
        assert!(!is_embed_url("https://player.twitch.tv/?channel=nasa"));
    }

    #[test]
    fn extracts_video_ids() {
        let id = Some("dQw4w9WgXcQ");
        assert_eq!(video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), id);
        assert_eq!(
            video_id("https://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=3"),
            id
        );
        assert_eq!(video_id("https://youtu.be/dQw4w9WgXcQ?si=x"), id);
        assert_eq!(video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"), id);
        assert_eq!(video_id("https://www.youtube.com/live/dQw4w9WgXcQ"), id);
        assert_eq!(video_id("https://www.youtube.com/@channel/live"), None);
    }

    #[test]
    fn embed_urls_are_kept_and_watch_urls_rewritten() {
        let embed = "https://www.youtube.com/embed/live_stream?channel=UC123";
        assert_eq!(embed_url(embed).as_deref(), Some(embed));
        assert_eq!(
            embed_url("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
        assert_eq!(embed_url("not-a-valid-url"), None);
    }
}
