use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::channels::{Channel, M3uParser};
use crate::identifier::{Identifier, IdentifierKind};

pub const DEFAULT_API_URL: &str = "https://api.acestream.me/all?api_version=1&api_key=test_api_key";

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("unexpected payload from {url}: {reason}")]
    MalformedPayload { url: String, reason: String },
}

#[derive(Debug, Deserialize)]
struct ApiItem {
    name: Option<String>,
    infohash: Option<String>,
    #[serde(default)]
    categories: Option<Vec<String>>,
}

impl From<ApiItem> for Channel {
    fn from(item: ApiItem) -> Self {
        let identifier = item
            .infohash
            .map(|h| Identifier::new(IdentifierKind::Infohash, &h))
            .unwrap_or_default();
        Channel {
            name: item.name.unwrap_or_else(|| "Unknown".to_string()),
            category: item
                .categories
                .and_then(|c| c.into_iter().next())
                .unwrap_or_default(),
            identifier,
            ..Default::default()
        }
    }
}

/// Turns an API response body into channels. The root must be a JSON array;
/// items that do not look like channels are skipped.
pub fn parse_api_payload(url: &str, body: &str) -> Result<Vec<Channel>, SourceError> {
    let malformed = |reason: String| SourceError::MalformedPayload {
        url: url.to_string(),
        reason,
    };

    let root: serde_json::Value = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    let serde_json::Value::Array(items) = root else {
        return Err(malformed("expected a JSON array at the root".to_string()));
    };

    let channels = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ApiItem>(item) {
            Ok(item) => Some(Channel::from(item)),
            Err(e) => {
                warn!("Skipping API item from {}: {}", url, e);
                None
            }
        })
        .collect();
    Ok(channels)
}

/// HTTP access to the channel sources. Every request has the same fixed timeout
/// and is never retried.
pub struct SourceClient {
    client: reqwest::Client,
}

impl SourceClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        let request_error = |source| SourceError::Request {
            url: url.to_string(),
            source,
        };

        let resp = self.client.get(url).send().await.map_err(request_error)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status,
            });
        }
        resp.text().await.map_err(request_error)
    }

    pub async fn fetch_playlist(&self, url: &str, parser: &M3uParser) -> Result<Vec<Channel>, SourceError> {
        info!("Scraping M3U from {}", url);
        let text = self.get_text(url).await?;
        let channels = parser.parse_m3u(&text);
        info!("Found {} channels in M3U file", channels.len());
        Ok(channels)
    }

    pub async fn fetch_api(&self, url: &str) -> Result<Vec<Channel>, SourceError> {
        info!("Scraping API from {}", url);
        let body = self.get_text(url).await?;
        let channels = parse_api_payload(url, &body)?;
        info!("Found {} channels in API response", channels.len());
        Ok(channels)
    }
}
