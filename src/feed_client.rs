use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::WINDOWS_1251;
use log::{error, info, warn};
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::error::FetchError;

pub const DEFAULT_FEED_URL: &str = "https://www.cbr.ru/scripts/XML_daily.asp";

/// Source of the raw daily rates document.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<String, FetchError>;
}

/// Central bank daily feed over HTTP.
///
/// The feed is windows-1251 and its Content-Type is not trusted, so the body is
/// always decoded explicitly.
pub struct CbrClient {
    client: Client,
    url: String,
}

impl CbrClient {
    pub fn new(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/xml"));

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl FeedSource for CbrClient {
    async fn fetch(&self) -> Result<String, FetchError> {
        info!("Requesting daily rates from {}", self.url);

        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| transport_error(&err))?;

        let status = resp.status();
        if !status.is_success() {
            error!("Can't download the feed: {}", status);
            return Err(FetchError::Transport {
                status: Some(status.as_u16()),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            });
        }

        let bytes = resp.bytes().await.map_err(|err| transport_error(&err))?;
        if bytes.is_empty() {
            error!("The feed returned an empty response");
            return Err(FetchError::EmptyResponse);
        }

        let (text, _, had_errors) = WINDOWS_1251.decode(&bytes);
        if had_errors {
            warn!("The feed body contains bytes outside windows-1251");
        }
        if text.trim().is_empty() {
            error!("The feed returned an empty response");
            return Err(FetchError::EmptyResponse);
        }

        info!("Received feed of {} characters", text.chars().count());
        Ok(text.into_owned())
    }
}

fn transport_error(err: &reqwest::Error) -> FetchError {
    error!("Feed request failed: {}", err);
    FetchError::Transport {
        status: err.status().map(|status| status.as_u16()),
        reason: err.to_string(),
    }
}
