use crate::core::{ConfigError, EntityId};
use reqwest::Url;
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_RESOURCE_PATH: &str = "api/books";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where and how the slice talks to its REST resource.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Application root, always ending with `/`
    pub base_url: Url,

    /// Collection path relative to `base_url`
    pub resource_path: String,

    /// Per-request timeout
    pub timeout: Duration,

    pub user_agent: String,
}

impl ClientConfig {
    /// Create a configuration for the given application root
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            resource_path: DEFAULT_RESOURCE_PATH.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        })
    }

    /// Set the collection path
    pub fn resource_path(mut self, path: &str) -> Self {
        self.resource_path = path.trim_matches('/').to_string();
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent sent with every request
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// Load from `BOOK_API_BASE_URL`, `BOOK_API_RESOURCE` and
    /// `BOOK_API_TIMEOUT_SECS`, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            env::var("BOOK_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let resource =
            env::var("BOOK_API_RESOURCE").unwrap_or_else(|_| DEFAULT_RESOURCE_PATH.to_string());

        let timeout_secs = match env::var("BOOK_API_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue("BOOK_API_TIMEOUT_SECS", "a whole number of seconds")
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self::new(&base_url)?
            .resource_path(&resource)
            .timeout(Duration::from_secs(timeout_secs)))
    }

    /// URL of the resource collection, e.g. `http://host/api/books`
    pub fn collection_url(&self) -> Result<Url, ConfigError> {
        self.base_url
            .join(&self.resource_path)
            .map_err(|err| ConfigError::InvalidBaseUrl(self.base_url.to_string(), err.to_string()))
    }

    /// URL of a single record, e.g. `http://host/api/books/42`
    pub fn item_url(&self, id: &EntityId) -> Result<Url, ConfigError> {
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| {
                ConfigError::InvalidBaseUrl(
                    self.base_url.to_string(),
                    "cannot be a base".to_string(),
                )
            })?
            .push(&id.to_string());
        Ok(url)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|err| ConfigError::InvalidBaseUrl(raw.to_string(), err.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl(
            raw.to_string(),
            "scheme must be http or https".to_string(),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
