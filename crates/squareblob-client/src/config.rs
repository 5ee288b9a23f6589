//! Client configuration

use crate::{ClientError, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://blob.squarecloud.app/v1/";

/// Default host serving public object downloads
pub const DEFAULT_PUBLIC_URL: &str = "https://public-blob.squarecloud.dev";

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Square Cloud API key, sent as the `Authorization` header
    pub api_key: String,
    /// API base URL
    pub base_url: String,
    /// Public download host
    pub public_url: String,
    /// How long cached account info and object lists stay valid
    pub clean_cache_timer: Duration,
    /// Directory downloads are written to
    pub download_dir: PathBuf,
    /// Log operations at `info` instead of `debug`
    pub debug: bool,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            public_url: DEFAULT_PUBLIC_URL.to_string(),
            clean_cache_timer: Duration::from_secs(60),
            download_dir: PathBuf::from("blobDownloads/"),
            debug: true,
            timeout: Duration::from_secs(30),
            user_agent: format!("squareblob-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Create a new config with the given API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Build a config from `SQUARECLOUD_API_KEY` and the optional
    /// `SQUAREBLOB_*` variables.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("SQUARECLOUD_API_KEY")
            .map_err(|_| ClientError::Config("SQUARECLOUD_API_KEY is not set".to_string()))?;
        let mut config = Self::new(api_key);

        if let Some(secs) = env_parse::<u64>("SQUAREBLOB_CACHE_TTL_SECS")? {
            config.clean_cache_timer = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("SQUAREBLOB_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(debug) = env_parse::<bool>("SQUAREBLOB_DEBUG")? {
            config.debug = debug;
        }
        if let Ok(dir) = std::env::var("SQUAREBLOB_DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Set the API base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the public download host
    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = url.into();
        self
    }

    /// Set the cache invalidation interval
    pub fn with_clean_cache_timer(mut self, timer: Duration) -> Self {
        self.clean_cache_timer = timer;
        self
    }

    /// Set the download directory
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Toggle operation logging verbosity
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check the configuration before building a client
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ClientError::Config("API key must not be empty".to_string()));
        }
        for (name, value) in [("base_url", &self.base_url), ("public_url", &self.public_url)] {
            Url::parse(value)
                .map_err(|e| ClientError::Config(format!("{} {:?} is not a valid URL: {}", name, value, e)))?;
        }
        if self.clean_cache_timer.is_zero() {
            return Err(ClientError::Config("clean_cache_timer must be positive".to_string()));
        }
        Ok(())
    }

    /// Public download URL for an object id
    pub fn object_url(&self, id: &str) -> String {
        format!("{}/{}", self.public_url.trim_end_matches('/'), id)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ClientError::Config(format!("{} has an invalid value: {:?}", key, raw))),
        Err(_) => Ok(None),
    }
}
