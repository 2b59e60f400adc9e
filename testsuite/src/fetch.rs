//! Retrieval of manifests and fixtures.

use async_trait::async_trait;
use std::error::Error;
use std::fmt;
use std::io;
use std::time::Duration;
use tokio::fs;
use tracing::trace;

/// Fetches the raw content of a resource.
#[async_trait]
pub trait FetchText: Send + Sync {
    /// Returns the resource body.
    ///
    /// Failures are errors, never an empty body.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Reads `file:` URLs from the file system and `http:`/`https:` URLs with `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetchText for Fetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        trace!(url, "fetching");
        if let Some(path) = url.strip_prefix("file://") {
            return fs::read(path).await.map_err(|error| FetchError::Io {
                url: url.to_owned(),
                error,
            });
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(FetchError::UnsupportedScheme(url.to_owned()));
        }
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Fetches `url` with `fetcher`, failing after `timeout`.
pub async fn fetch_with_timeout<F: FetchText + ?Sized>(
    fetcher: &F,
    url: &str,
    timeout: Duration,
) -> Result<Vec<u8>, FetchError> {
    match tokio::time::timeout(timeout, fetcher.fetch(url)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout {
            url: url.to_owned(),
            timeout,
        }),
    }
}

#[derive(Debug)]
pub enum FetchError {
    Http(reqwest::Error),
    Status { url: String, status: u16 },
    Io { url: String, error: io::Error },
    Timeout { url: String, timeout: Duration },
    UnsupportedScheme(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Http(error) => write!(f, "{}", error),
            FetchError::Status { url, status } => {
                write!(f, "{} returned the HTTP status {}", url, status)
            }
            FetchError::Io { url, error } => write!(f, "Error while reading {}: {}", url, error),
            FetchError::Timeout { url, timeout } => {
                write!(f, "{} was not retrieved after {:?}", url, timeout)
            }
            FetchError::UnsupportedScheme(url) => write!(f, "{} has an unsupported scheme", url),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FetchError::Http(error) => Some(error),
            FetchError::Io { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        FetchError::Http(error)
    }
}
