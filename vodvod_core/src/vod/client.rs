use reqwest::Client;
use thiserror::Error;

use super::model::Vod;
use crate::config::VodApiConfig;

#[derive(Debug, Error)]
pub enum VodApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Network error: {0}")]
    Status(u16),
}

pub type Result<T> = std::result::Result<T, VodApiError>;

/// Client for the VOD listing API.
#[derive(Clone)]
pub struct VodClient {
    client: Client,
    config: VodApiConfig,
}

impl VodClient {
    pub fn new(config: VodApiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    /// Every VOD visible to the listing.
    pub async fn fetch_all(&self) -> Result<Vec<Vod>> {
        let url = format!("{}/all/private", self.base_url());
        self.fetch(&url).await
    }

    /// VODs of one streamer. The login is trimmed and lower-cased; a blank
    /// login falls back to `fetch_all`.
    pub async fn fetch_streamer(&self, login: &str) -> Result<Vec<Vod>> {
        let login = login.trim().to_lowercase();
        if login.is_empty() {
            return self.fetch_all().await;
        }
        let url = format!("{}/channels/@{}", self.base_url(), login);
        self.fetch(&url).await
    }

    /// Playable stream URL for a VOD.
    pub fn stream_url(&self, vod: &Vod) -> String {
        format!("{}{}", self.base_url(), vod.link)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<Vod>> {
        log::info!("[vod_client] GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            log::error!("[vod_client] {} responded with {}", url, status);
            return Err(VodApiError::Status(status.as_u16()));
        }
        // An empty listing may arrive as `null`.
        let vods: Option<Vec<Vod>> = response.json().await?;
        Ok(vods.unwrap_or_default())
    }
}
