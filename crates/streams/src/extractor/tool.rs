use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use super::error::ExtractionError;

/// Prefer progressive https formats carrying both audio and video, then HLS,
/// then whatever the tool considers best.
pub const DEFAULT_FORMAT_SELECTOR: &str = "best[acodec!=none][vcodec!=none][protocol=https]/best[acodec!=none][vcodec!=none][protocol*=m3u8]/best";

pub const DEFAULT_PROGRAM: &str = "yt-dlp";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const STDERR_LIMIT: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPreference {
    pub selector: String,
    pub prefer_free_formats: bool,
}

impl Default for FormatPreference {
    fn default() -> Self {
        Self {
            selector: DEFAULT_FORMAT_SELECTOR.to_string(),
            prefer_free_formats: true,
        }
    }
}

/// Metadata document returned by the extraction tool in full-json mode.
#[derive(Debug, Clone, Serialize)]
pub struct MediaMetadata {
    pub url: String,
    pub title: Option<String>,
    pub extractor: Option<String>,
    pub is_live: Option<bool>,
    // The untouched document, for callers that want everything
    pub raw: Value,
}

impl MediaMetadata {
    pub fn from_json(raw: Value) -> Result<Self, ExtractionError> {
        let url = raw
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| first_format_url(&raw, "requested_formats", false))
            .or_else(|| first_format_url(&raw, "formats", true))
            .ok_or(ExtractionError::NoUrl)?;

        let text = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            url,
            title: text("title"),
            extractor: text("extractor_key").or_else(|| text("extractor")),
            is_live: raw.get("is_live").and_then(Value::as_bool),
            raw,
        })
    }
}

// yt-dlp lists `formats` from worst to best
fn first_format_url(raw: &Value, key: &str, from_end: bool) -> Option<String> {
    let formats = raw.get(key)?.as_array()?;
    let url_of = |format: &Value| format.get("url").and_then(Value::as_str).map(str::to_string);

    if from_end {
        formats.iter().rev().find_map(url_of)
    } else {
        formats.iter().find_map(url_of)
    }
}

/// Picks the first absolute http(s) url printed by the tool.
///
/// Split audio/video selections print one url per line; the first one is the
/// video (or combined) stream.
pub fn parse_direct_url(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| {
            Url::parse(line)
                .map(|url| matches!(url.scheme(), "http" | "https"))
                .unwrap_or(false)
        })
        .map(str::to_string)
}

/// Boundary to the external media-url extraction capability.
#[async_trait]
pub trait StreamExtractor: Send + Sync {
    fn name(&self) -> &str;

    /// Resolves `url` to a single direct media url.
    async fn extract(
        &self,
        url: &str,
        preference: &FormatPreference,
    ) -> Result<String, ExtractionError>;

    /// Fetches the full metadata document for `url`.
    async fn metadata(&self, url: &str) -> Result<MediaMetadata, ExtractionError>;
}

#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    /// Executable to run, e.g. `yt-dlp` or `python3`.
    pub program: String,
    /// Arguments placed before everything else, e.g. `["-m", "yt_dlp"]`.
    pub leading_args: Vec<String>,
    /// Extra request headers in `name:value` form.
    pub headers: Vec<String>,
    pub timeout: Duration,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            leading_args: vec![],
            headers: vec![],
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// [`StreamExtractor`] backed by a yt-dlp compatible command line tool.
#[derive(Debug, Clone, Default)]
pub struct YtDlp {
    config: YtDlpConfig,
}

impl YtDlp {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &YtDlpConfig {
        &self.config
    }

    /// Returns the tool's version string, failing if it cannot be run.
    pub async fn version(&self) -> Result<String, ExtractionError> {
        let stdout = self.run(vec!["--version".to_string()]).await?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    pub fn extract_args(&self, url: &str, preference: &FormatPreference) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            preference.selector.clone(),
            "--get-url".to_string(),
        ];
        args.extend(self.common_args(preference.prefer_free_formats));
        // anything after `--` is a url, never an option
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    pub fn metadata_args(&self, url: &str) -> Vec<String> {
        let mut args = vec!["--dump-single-json".to_string()];
        args.extend(self.common_args(true));
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    fn common_args(&self, prefer_free_formats: bool) -> Vec<String> {
        let mut args = vec!["--no-playlist".to_string(), "--no-warnings".to_string()];
        if prefer_free_formats {
            args.push("--prefer-free-formats".to_string());
        }
        for header in &self.config.headers {
            args.push("--add-header".to_string());
            args.push(header.clone());
        }
        args
    }

    async fn run(&self, args: Vec<String>) -> Result<Vec<u8>, ExtractionError> {
        let program = &self.config.program;
        debug!(program = %program, ?args, "Running extraction tool");

        let child = Command::new(program)
            .args(&self.config.leading_args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ExtractionError::ToolNotFound(program.clone()),
                _ => ExtractionError::Spawn(e),
            })?;

        // Dropping the timed out future drops the child, which kills it.
        let output = timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| ExtractionError::Timeout(self.config.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::NonZeroExit {
                code: output.status.code(),
                stderr: stderr.trim().chars().take(STDERR_LIMIT).collect(),
            });
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl StreamExtractor for YtDlp {
    fn name(&self) -> &str {
        &self.config.program
    }

    async fn extract(
        &self,
        url: &str,
        preference: &FormatPreference,
    ) -> Result<String, ExtractionError> {
        let stdout = self.run(self.extract_args(url, preference)).await?;
        let direct_url =
            parse_direct_url(&String::from_utf8_lossy(&stdout)).ok_or(ExtractionError::NoUrl)?;

        debug!(source = url, direct = %direct_url, "Extraction tool produced url");
        Ok(direct_url)
    }

    async fn metadata(&self, url: &str) -> Result<MediaMetadata, ExtractionError> {
        let stdout = self.run(self.metadata_args(url)).await?;
        let raw: Value = serde_json::from_slice(&stdout)?;
        MediaMetadata::from_json(raw)
    }
}
