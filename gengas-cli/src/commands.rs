use crate::{
    cli::OutputFormat,
    config::AppConfig,
    error::{CliError, Result},
    output::{OutputManager, write_output},
    server::{self, AppState},
};
use chrono::Utc;
use clap::ValueEnum;
#[cfg(feature = "colored-output")]
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::{path::Path, sync::Arc, time::Duration};
use streams_resolver::{
    directory::{
        DEFAULT_SUGGESTIONS, Directory, DirectoryLoader, LocalSource, RemoteSource, create_client,
    },
    extractor::{StreamExtractor, StreamResolver, YtDlp},
    media::{ChannelDescriptor, PlaybackMode},
};
use tracing::{debug, info};
use url::Url;

pub struct CommandExecutor {
    config: AppConfig,
}

impl CommandExecutor {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn new_with_proxy(
        mut config: AppConfig,
        proxy_url: Option<String>,
        proxy_username: Option<String>,
        proxy_password: Option<String>,
    ) -> Self {
        if let Some(url) = proxy_url {
            config.default_proxy = Some(url);
            config.default_proxy_username = proxy_username;
            config.default_proxy_password = proxy_password;
        }

        Self { config }
    }

    pub fn extractor(&self) -> Arc<dyn StreamExtractor> {
        Arc::new(YtDlp::new(self.config.extractor_config()))
    }

    pub fn resolver(&self) -> StreamResolver {
        StreamResolver::new(self.extractor())
            .with_preference(self.config.format_preference())
            .with_retry(self.config.retry_policy())
    }

    /// Remote source when a directory url is configured, local file when a path is.
    pub fn loader(&self) -> Result<DirectoryLoader> {
        let mut loader = DirectoryLoader::new();

        if let Some(url) = &self.config.directory_url {
            let client = create_client(&self.config.http_config())?;
            loader = loader.with_remote(RemoteSource::new(client, url.clone()));
        }
        if let Some(path) = &self.config.directory_path {
            loader = loader.with_local(LocalSource::new(path.clone()));
        }

        Ok(loader)
    }

    pub async fn resolve(
        &self,
        url: &str,
        kind: &str,
        direct: bool,
        force_extract: bool,
        output_format: Option<OutputFormat>,
        output_file: Option<&Path>,
    ) -> Result<()> {
        let output_format = self.output_format(output_format)?;
        let descriptor = ChannelDescriptor::new(url, kind, url);
        let mode = if direct {
            PlaybackMode::Direct
        } else {
            PlaybackMode::Embed
        };
        debug!(url, kind, ?mode, force_extract, "Resolving");

        let resolver = self.resolver();
        let pb = self.create_progress_bar("Resolving...");
        let result = if force_extract {
            resolver.resolve_after_playback_failure(&descriptor).await
        } else {
            resolver.resolve(&descriptor, mode).await
        };
        pb.finish_and_clear();

        let stream = result?;
        let output = OutputManager::new(self.config.colored_output)
            .format_resolved(&stream, &output_format)?;
        write_output(&output, output_file)
    }

    pub async fn channels(
        &self,
        country: Option<&str>,
        search: Option<&str>,
        output_format: Option<OutputFormat>,
    ) -> Result<()> {
        let output_format = self.output_format(output_format)?;
        let directory = self.load_directory().await?;
        let output_manager = OutputManager::new(self.config.colored_output);
        let now = Utc::now();

        let output = if let Some(query) = search {
            let keys = directory.suggest(query, DEFAULT_SUGGESTIONS);
            output_manager.format_suggestions(&keys, &output_format)?
        } else if let Some(name) = country {
            let (key, entry) = directory
                .get(name)
                .map(|entry| (name, entry))
                .or_else(|| directory.match_country(name))
                .ok_or_else(|| CliError::unknown_country(name))?;
            output_manager.format_country(key, entry, now, &output_format)?
        } else {
            output_manager.format_countries(&directory, now, &output_format)?
        };

        write_output(&output, None)
    }

    pub async fn match_country(&self, name: &str) -> Result<()> {
        let directory = self.load_directory().await?;
        let (key, _) = directory
            .match_country(name)
            .ok_or_else(|| CliError::unknown_country(name))?;

        write_output(&format!("{key}\n"), None)
    }

    pub async fn metadata(&self, url: &str, output_file: Option<&Path>) -> Result<()> {
        let url = Url::parse(url)?;

        let pb = self.create_progress_bar("Fetching metadata...");
        let result = self.extractor().metadata(url.as_str()).await;
        pb.finish_and_clear();

        let metadata = result?;
        info!(
            "Fetched metadata for {} ({})",
            url,
            metadata.title.as_deref().unwrap_or("untitled")
        );

        let mut output = serde_json::to_string_pretty(&metadata.raw)?;
        output.push('\n');
        write_output(&output, output_file)
    }

    pub async fn serve(&self, host: Option<&str>, port: Option<u16>) -> Result<()> {
        let host = host.unwrap_or(self.config.host.as_str());
        let port = port.unwrap_or(self.config.port);

        let loader = self.loader()?;
        if !loader.has_sources() {
            let message = "No channel directory configured; /api/channels will answer 503";
            #[cfg(feature = "colored-output")]
            {
                eprintln!("{}", message.yellow());
            }
            #[cfg(not(feature = "colored-output"))]
            {
                eprintln!("{message}");
            }
        }

        let state = AppState::new(self.resolver(), loader, self.config.cache_ttl());
        server::serve(state, host, port).await?;
        Ok(())
    }

    /// The `--output` flag, else the configured default.
    fn output_format(&self, requested: Option<OutputFormat>) -> Result<OutputFormat> {
        match requested {
            Some(format) => Ok(format),
            None => {
                let configured = &self.config.default_output_format;
                <OutputFormat as ValueEnum>::from_str(configured, true).map_err(|_| {
                    CliError::invalid_input(format!(
                        "unknown default_output_format {configured:?} in config \
                         (expected pretty, json, json-compact or table)"
                    ))
                })
            }
        }
    }

    async fn load_directory(&self) -> Result<Directory> {
        let loader = self.loader()?;
        let pb = self.create_progress_bar("Loading channels...");
        let result = loader.load().await;
        pb.finish_and_clear();
        Ok(result?)
    }

    fn create_progress_bar(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(500));
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
        }
        pb.set_message(message.to_string());
        pb
    }
}
