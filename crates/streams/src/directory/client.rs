use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use rustls::{ClientConfig, crypto::aws_lc_rs};
use rustls_platform_verifier::BuilderVerifierExt;
use tracing::warn;

use super::error::DirectoryError;

pub(crate) const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub proxy: Option<ProxyConfig>,
    /// Honour proxy environment variables when no explicit proxy is set
    pub use_system_proxy: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_UA.to_string(),
            proxy: None,
            use_system_proxy: true,
        }
    }
}

/// Builds the client used to fetch remote directories.
///
/// An unusable proxy url is logged and ignored rather than failing the client.
pub fn create_client(config: &HttpConfig) -> Result<Client, DirectoryError> {
    let provider = Arc::new(aws_lc_rs::default_provider());
    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| DirectoryError::Tls(e.to_string()))?
        .with_platform_verifier()
        .map_err(|e| DirectoryError::Tls(e.to_string()))?
        .with_no_client_auth();

    let mut builder = Client::builder()
        .use_preconfigured_tls(tls_config)
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout);

    if let Some(proxy_config) = &config.proxy {
        match reqwest::Proxy::all(&proxy_config.url) {
            Ok(mut proxy) => {
                if let (Some(username), Some(password)) =
                    (&proxy_config.username, &proxy_config.password)
                {
                    proxy = proxy.basic_auth(username, password);
                }
                builder = builder.proxy(proxy);
            }
            Err(e) => {
                warn!("Failed to configure proxy '{}': {}", proxy_config.url, e);
            }
        }
    } else if !config.use_system_proxy {
        builder = builder.no_proxy();
    }

    Ok(builder.build()?)
}
