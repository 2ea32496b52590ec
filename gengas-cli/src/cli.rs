use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gengas",
    about = "Gengas - resolve TV channel sources (YouTube, IPTV) into playable stream urls",
    version,
    author
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Extraction timeout in seconds (overrides the configuration)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Number of retries for transient extraction failures
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Proxy URL used to fetch the remote directory (supports http, https, socks5)
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Proxy username (if proxy requires authentication)
    #[arg(long, global = true)]
    pub proxy_username: Option<String>,

    /// Proxy password (if proxy requires authentication)
    #[arg(long, global = true)]
    pub proxy_password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a channel url into a playable url
    Resolve {
        /// Source url of the channel
        #[arg(short, long)]
        url: String,

        /// Channel type (youtube, iptv)
        #[arg(short = 't', long = "type", default_value = "youtube")]
        kind: String,

        /// Require a raw media url instead of an embeddable player url
        #[arg(long)]
        direct: bool,

        /// Skip the passthrough/embed shortcuts, e.g. after playback failed
        #[arg(long)]
        force_extract: bool,

        /// Output format [default: from config]
        #[arg(short, long)]
        output: Option<OutputFormat>,

        /// Save output to file
        #[arg(short = 'O', long)]
        output_file: Option<PathBuf>,
    },

    /// List countries and channels from the channel directory
    Channels {
        /// Show the channels of one country
        #[arg(long)]
        country: Option<String>,

        /// Suggest countries whose name contains this text
        #[arg(short, long, conflicts_with = "country")]
        search: Option<String>,

        /// Output format [default: from config]
        #[arg(short, long)]
        output: Option<OutputFormat>,
    },

    /// Match a display name (e.g. from a map) against directory countries
    Match {
        /// The display name to match
        name: String,
    },

    /// Dump the extraction tool's metadata for a url
    Metadata {
        /// The url to inspect
        #[arg(short, long)]
        url: String,

        /// Save output to file
        #[arg(short = 'O', long)]
        output_file: Option<PathBuf>,
    },

    /// Serve the resolution endpoint over HTTP
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,
    },

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Show configuration information
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Reset configuration to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Pretty-printed human-readable output
    #[default]
    Pretty,
    /// JSON output
    Json,
    /// Compact JSON output
    JsonCompact,
    /// Table format
    Table,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Pretty => write!(f, "pretty"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::JsonCompact => write!(f, "json-compact"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}
