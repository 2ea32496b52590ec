use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use super::error::{ExtractionError, ResolveError};
use super::tool::{FormatPreference, StreamExtractor};
use super::youtube;
use crate::media::{
    ChannelDescriptor, ChannelKind, PlaybackMode, ResolutionMethod, ResolvedStream,
    is_direct_media_url,
};

/// Bounded retry for transient extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    /// Delay before the first retry, doubled for each subsequent one.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            backoff: Duration::ZERO,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1 << attempt.min(16))
    }
}

/// Turns channel descriptors into playable urls.
///
/// Cheap cases (direct media urls, embeddable YouTube urls) are answered
/// locally; everything else goes through the [`StreamExtractor`].
#[derive(Clone)]
pub struct StreamResolver {
    extractor: Arc<dyn StreamExtractor>,
    preference: FormatPreference,
    retry: RetryPolicy,
}

impl StreamResolver {
    pub fn new(extractor: Arc<dyn StreamExtractor>) -> Self {
        Self {
            extractor,
            preference: FormatPreference::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_preference(mut self, preference: FormatPreference) -> Self {
        self.preference = preference;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn extractor(&self) -> &Arc<dyn StreamExtractor> {
        &self.extractor
    }

    pub async fn resolve(
        &self,
        descriptor: &ChannelDescriptor,
        mode: PlaybackMode,
    ) -> Result<ResolvedStream, ResolveError> {
        let url = validate(descriptor)?;

        match (&descriptor.kind, mode) {
            (ChannelKind::Youtube, PlaybackMode::Embed) => {
                if let Some(embed) = youtube::embed_url(url) {
                    debug!(channel = %descriptor.name, embed = %embed, "Using embeddable url");
                    return Ok(ResolvedStream::new(
                        &descriptor.url,
                        embed,
                        ResolutionMethod::Embed,
                    ));
                }
            }
            (ChannelKind::Iptv, _) if is_direct_media_url(url) => {
                debug!(channel = %descriptor.name, "Passing direct media url through");
                return Ok(ResolvedStream::new(
                    &descriptor.url,
                    url,
                    ResolutionMethod::Passthrough,
                ));
            }
            _ => {}
        }

        self.extract(descriptor, url).await
    }

    /// Resolves again after the caller failed to play a previous result.
    ///
    /// Suffix and embed shortcuts are skipped: the extraction tool decides.
    pub async fn resolve_after_playback_failure(
        &self,
        descriptor: &ChannelDescriptor,
    ) -> Result<ResolvedStream, ResolveError> {
        let url = validate(descriptor)?;
        self.extract(descriptor, url).await
    }

    async fn extract(
        &self,
        descriptor: &ChannelDescriptor,
        url: &str,
    ) -> Result<ResolvedStream, ResolveError> {
        let playable = self.extract_with_retry(url).await?;

        info!(
            channel = %descriptor.name,
            source = url,
            playable = %playable,
            "Resolved stream via {}",
            self.extractor.name()
        );
        Ok(ResolvedStream::new(
            &descriptor.url,
            playable,
            ResolutionMethod::Extracted,
        ))
    }

    async fn extract_with_retry(&self, url: &str) -> Result<String, ExtractionError> {
        let mut attempt = 0;
        loop {
            match self.extractor.extract(url, &self.preference).await {
                Ok(playable) => return Ok(playable),
                Err(e) if e.is_transient() && attempt < self.retry.retries => {
                    let delay = self.retry.delay(attempt);
                    warn!(
                        source = url,
                        attempt = attempt + 1,
                        ?delay,
                        "Extraction failed, retrying: {e}"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(source = url, "Extraction failed: {e}");
                    return Err(e);
                }
            }
        }
    }
}

/// Returns the trimmed source url. Url problems are reported before the type.
fn validate(descriptor: &ChannelDescriptor) -> Result<&str, ResolveError> {
    let url = descriptor.url.trim();
    if url.is_empty() {
        return Err(ResolveError::InvalidInput(format!(
            "channel {:?} has no url",
            descriptor.name
        )));
    }
    // the url ends up on the extraction tool's command line
    let is_web_url = Url::parse(url)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !is_web_url {
        return Err(ResolveError::InvalidInput(format!(
            "channel {:?} has no absolute http(s) url: {url:?}",
            descriptor.name
        )));
    }
    if let ChannelKind::Other(kind) = &descriptor.kind {
        return Err(ResolveError::Unsupported(kind.clone()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::extractor::tool::MediaMetadata;

    /// Replays scripted outcomes and counts calls.
    #[derive(Default)]
    struct ScriptedExtractor {
        outcomes: Mutex<VecDeque<Result<String, ExtractionError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedExtractor {
        fn new(outcomes: Vec<Result<String, ExtractionError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StreamExtractor for ScriptedExtractor {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn extract(
            &self,
            _url: &str,
            _preference: &FormatPreference,
        ) -> Result<String, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ExtractionError::NoUrl))
        }

        async fn metadata(&self, _url: &str) -> Result<MediaMetadata, ExtractionError> {
            Err(ExtractionError::NoUrl)
        }
    }

    fn resolver(extractor: &Arc<ScriptedExtractor>) -> StreamResolver {
        StreamResolver::new(extractor.clone()).with_retry(RetryPolicy {
            retries: 1,
            backoff: Duration::from_millis(1),
        })
    }

    fn failed_exit() -> ExtractionError {
        ExtractionError::NonZeroExit {
            code: Some(1),
            stderr: "ERROR".to_string(),
        }
    }

    #[tokio::test]
    async fn iptv_direct_urls_pass_through_without_extraction() {
        let extractor = ScriptedExtractor::new(vec![]);
        let resolver = resolver(&extractor);

        for url in [
            "https://example.com/stream.m3u8",
            "http://example.com/live/index.M3U8?token=1",
            "https://example.com/tv.ts",
            "https://example.com/vod.mp4",
        ] {
            let channel = ChannelDescriptor::new("Channel", "iptv", url);
            let stream = resolver.resolve(&channel, PlaybackMode::Direct).await.unwrap();

            assert_eq!(stream.playable_url, url);
            assert_eq!(stream.source_url, url);
            assert_eq!(stream.method, ResolutionMethod::Passthrough);
        }
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn iptv_page_urls_are_extracted() {
        let extractor =
            ScriptedExtractor::new(vec![Ok("https://cdn.example.com/out.m3u8".to_string())]);
        let channel = ChannelDescriptor::new("Page", "iptv", "https://example.com/live/channel-page");

        let stream = resolver(&extractor)
            .resolve(&channel, PlaybackMode::Embed)
            .await
            .unwrap();

        assert_eq!(stream.playable_url, "https://cdn.example.com/out.m3u8");
        assert_eq!(stream.source_url, "https://example.com/live/channel-page");
        assert_eq!(stream.method, ResolutionMethod::Extracted);
        assert_eq!(extractor.calls(), 1);
        // descriptor left untouched
        assert_eq!(channel.url, "https://example.com/live/channel-page");
    }

    #[tokio::test]
    async fn youtube_embed_urls_are_returned_unchanged() {
        let extractor = ScriptedExtractor::new(vec![]);
        let url = "https://www.youtube.com/embed/live_stream?channel=UC4R8DWoMoI7CAwX8_LjQHig";
        let channel = ChannelDescriptor::new("News", "youtube", url);

        let stream = resolver(&extractor)
            .resolve(&channel, PlaybackMode::Embed)
            .await
            .unwrap();

        assert_eq!(stream.playable_url, url);
        assert!(stream.is_unchanged());
        assert_eq!(stream.method, ResolutionMethod::Embed);
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn youtube_watch_urls_become_embed_urls() {
        let extractor = ScriptedExtractor::new(vec![]);
        let channel =
            ChannelDescriptor::new("News", "youtube", "https://www.youtube.com/watch?v=dQw4w9WgXcQ");

        let stream = resolver(&extractor)
            .resolve(&channel, PlaybackMode::Embed)
            .await
            .unwrap();

        assert_eq!(stream.playable_url, "https://www.youtube.com/embed/dQw4w9WgXcQ");
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn youtube_direct_mode_uses_extraction() {
        let extractor =
            ScriptedExtractor::new(vec![Ok("https://rr1.googlevideo.com/videoplayback".to_string())]);
        let channel = ChannelDescriptor::new(
            "News",
            "youtube",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
        );

        let stream = resolver(&extractor)
            .resolve(&channel, PlaybackMode::Direct)
            .await
            .unwrap();

        assert_eq!(stream.playable_url, "https://rr1.googlevideo.com/videoplayback");
        assert_eq!(stream.method, ResolutionMethod::Extracted);
        assert_eq!(extractor.calls(), 1);
    }

    #[tokio::test]
    async fn empty_url_is_invalid_for_every_type() {
        let extractor = ScriptedExtractor::new(vec![]);
        let resolver = resolver(&extractor);

        for kind in ["youtube", "iptv", "radio"] {
            for url in ["", "   "] {
                let channel = ChannelDescriptor::new("Empty", kind, url);
                let err = resolver
                    .resolve(&channel, PlaybackMode::Embed)
                    .await
                    .unwrap_err();
                assert!(matches!(err, ResolveError::InvalidInput(_)), "{kind}: {err}");
            }
        }
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn non_web_urls_are_invalid() {
        let extractor = ScriptedExtractor::new(vec![]);
        let resolver = resolver(&extractor);

        for url in [
            "--batch-file=/etc/hostname",
            "-o /tmp/out",
            "file:///etc/passwd",
            "not-a-valid-url",
            "/relative/stream.m3u8",
        ] {
            for kind in ["youtube", "iptv"] {
                let channel = ChannelDescriptor::new("Bad", kind, url);
                let err = resolver
                    .resolve(&channel, PlaybackMode::Direct)
                    .await
                    .unwrap_err();
                assert!(matches!(err, ResolveError::InvalidInput(_)), "{url}: {err}");

                let err = resolver
                    .resolve_after_playback_failure(&channel)
                    .await
                    .unwrap_err();
                assert!(matches!(err, ResolveError::InvalidInput(_)), "{url}: {err}");
            }
        }
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn source_url_is_the_descriptor_url() {
        let extractor =
            ScriptedExtractor::new(vec![Ok("https://cdn.example.com/out.m3u8".to_string())]);
        let resolver = resolver(&extractor);
        let padded = " https://example.com/a.m3u8\n";

        let channel = ChannelDescriptor::new("Padded", "iptv", padded);
        let stream = resolver.resolve(&channel, PlaybackMode::Direct).await.unwrap();
        assert_eq!(stream.source_url, padded);
        assert_eq!(stream.playable_url, "https://example.com/a.m3u8");

        let stream = resolver.resolve_after_playback_failure(&channel).await.unwrap();
        assert_eq!(stream.source_url, padded);
        assert_eq!(stream.playable_url, "https://cdn.example.com/out.m3u8");
    }

    #[tokio::test]
    async fn unknown_type_is_unsupported() {
        let extractor = ScriptedExtractor::new(vec![]);
        let channel = ChannelDescriptor::new("Radio", "radio", "https://example.com/a.m3u8");

        let err = resolver(&extractor)
            .resolve(&channel, PlaybackMode::Direct)
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::Unsupported(kind) if kind == "radio"));
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn extraction_failure_is_surfaced() {
        let extractor = ScriptedExtractor::new(vec![Err(ExtractionError::NoUrl)]);
        let channel =
            ChannelDescriptor::new("Broken", "youtube", "https://www.youtube.com/@broken/live");

        let err = resolver(&extractor)
            .resolve(&channel, PlaybackMode::Embed)
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::ExtractionFailed(ExtractionError::NoUrl)));
        // NoUrl is not transient
        assert_eq!(extractor.calls(), 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried_once() {
        let extractor = ScriptedExtractor::new(vec![
            Err(ExtractionError::Timeout(Duration::from_secs(10))),
            Ok("https://cdn.example.com/out.m3u8".to_string()),
        ]);
        let channel = ChannelDescriptor::new("Flaky", "iptv", "https://example.com/page");

        let stream = resolver(&extractor)
            .resolve(&channel, PlaybackMode::Direct)
            .await
            .unwrap();

        assert_eq!(stream.playable_url, "https://cdn.example.com/out.m3u8");
        assert_eq!(extractor.calls(), 2);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let extractor = ScriptedExtractor::new(vec![
            Err(failed_exit()),
            Err(failed_exit()),
            Err(failed_exit()),
        ]);
        let channel = ChannelDescriptor::new("Down", "iptv", "https://example.com/page");

        let err = resolver(&extractor)
            .resolve(&channel, PlaybackMode::Direct)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ResolveError::ExtractionFailed(ExtractionError::NonZeroExit { .. })
        ));
        assert_eq!(extractor.calls(), 2);
    }

    #[tokio::test]
    async fn missing_tool_is_not_retried() {
        let extractor =
            ScriptedExtractor::new(vec![Err(ExtractionError::ToolNotFound("yt-dlp".to_string()))]);
        let channel = ChannelDescriptor::new("Page", "iptv", "https://example.com/page");

        let err = resolver(&extractor)
            .resolve(&channel, PlaybackMode::Direct)
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::ExtractionFailed(ExtractionError::ToolNotFound(_))));
        assert_eq!(extractor.calls(), 1);
    }

    #[tokio::test]
    async fn playback_failure_forces_extraction_of_direct_urls() {
        let extractor =
            ScriptedExtractor::new(vec![Ok("https://cdn2.example.com/real.m3u8".to_string())]);
        let channel = ChannelDescriptor::new("Stale", "iptv", "https://example.com/stream.m3u8");

        let stream = resolver(&extractor)
            .resolve_after_playback_failure(&channel)
            .await
            .unwrap();

        assert_eq!(stream.playable_url, "https://cdn2.example.com/real.m3u8");
        assert_eq!(stream.method, ResolutionMethod::Extracted);
        assert_eq!(extractor.calls(), 1);
    }
}
