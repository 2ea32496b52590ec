use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::error::DirectoryError;
use super::model::Directory;

/// A place the channel directory can be read from.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Human readable location, used in logs and errors.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<Directory, DirectoryError>;
}

/// Directory served as a JSON document over HTTP(S), e.g. from a CDN.
pub struct RemoteSource {
    client: Client,
    url: String,
}

impl RemoteSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DirectorySource for RemoteSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Directory, DirectoryError> {
        debug!(url = %self.url, "Fetching remote directory");
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status(status));
        }

        let body = response.bytes().await?;
        Directory::from_slice(&body)
    }
}

/// Directory bundled as a local JSON file.
pub struct LocalSource {
    path: PathBuf,
}

impl LocalSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DirectorySource for LocalSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Directory, DirectoryError> {
        debug!(path = %self.path.display(), "Reading local directory");
        let body = tokio::fs::read(&self.path).await?;
        Directory::from_slice(&body)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::directory::client::{HttpConfig, create_client};

    const BODY: &str = r#"{"Kenya": {"channels": [{"name": "KTN", "type": "youtube", "url": "https://www.youtube.com/embed/abc"}]}}"#;

    fn client() -> Client {
        create_client(&HttpConfig {
            use_system_proxy: false,
            ..HttpConfig::default()
        })
        .unwrap()
    }

    /// Serves a single canned HTTP response on a random local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{addr}/channels.json")
    }

    #[tokio::test]
    async fn remote_source_parses_json() {
        let url = serve_once("HTTP/1.1 200 OK", BODY).await;
        let source = RemoteSource::new(client(), url);

        let directory = source.fetch().await.unwrap();
        assert_eq!(directory.keys().collect::<Vec<_>>(), vec!["Kenya"]);
    }

    #[tokio::test]
    async fn remote_source_rejects_error_status() {
        let url = serve_once("HTTP/1.1 404 Not Found", "{}").await;
        let source = RemoteSource::new(client(), url);

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, DirectoryError::Status(status) if status.as_u16() == 404));
    }

    #[tokio::test]
    async fn local_source_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BODY.as_bytes()).unwrap();

        let directory = LocalSource::new(file.path()).fetch().await.unwrap();
        assert_eq!(directory.channel_count(), 1);
    }

    #[tokio::test]
    async fn local_source_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalSource::new(dir.path().join("channels.json"))
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Io(_)));
    }
}
