use std::time::Duration;

/// Default cap on followed redirects before a download fails.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Default base URL of the VOD listing API.
pub const DEFAULT_API_URL: &str = "https://api.vodvod.top";

/// Tuning knobs for `HttpDownloader`.
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    pub max_redirects: usize,
    /// Maximum wait for the next body chunk. `None` waits forever.
    pub idle_timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Capacity of the event channel created by `HttpDownloader::run`.
    pub event_buffer: usize,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            max_redirects: DEFAULT_MAX_REDIRECTS,
            idle_timeout: None,
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("vodvod/", env!("CARGO_PKG_VERSION")).to_string(),
            event_buffer: 256,
        }
    }
}

impl DownloaderConfig {
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = Some(idle_timeout);
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_event_buffer(mut self, event_buffer: usize) -> Self {
        self.event_buffer = event_buffer.max(1);
        self
    }
}

/// Where the VOD listing API lives.
#[derive(Debug, Clone)]
pub struct VodApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for VodApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl VodApiConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
