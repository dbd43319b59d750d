use crate::api::config::ClientConfig;
use crate::api::pagination::{Links, parse_header_for_links, parse_total_count};
use crate::core::{ClientError, Entity, EntityId, LinkHeaderError, Result, clean_entity};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use tracing::{debug, warn};

pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Query for one page of the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
    /// Scroll-triggered load whose rows are appended to the current list
    pub continuation: bool,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn sort(mut self, sort: &str) -> Self {
        self.sort = Some(sort.to_string());
        self
    }

    pub fn continuation(mut self) -> Self {
        self.continuation = true;
        self
    }

    /// Appends the query string. Paging parameters are only sent together
    /// with a sort; the cache buster is always sent.
    fn apply(&self, url: &mut Url, cache_buster: i64) {
        let mut pairs = url.query_pairs_mut();
        if let Some(sort) = &self.sort {
            if let Some(page) = self.page {
                pairs.append_pair("page", &page.to_string());
            }
            if let Some(size) = self.size {
                pairs.append_pair("size", &size.to_string());
            }
            pairs.append_pair("sort", sort);
        }
        pairs.append_pair("cacheBuster", &cache_buster.to_string());
    }
}

/// A successful response: the HTTP status and the decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub status: u16,
    pub data: T,
}

/// One page of the collection with its pagination headers resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub links: Links,
    pub total_items: u64,
}

/// The REST resource behind an entity slice.
#[async_trait]
pub trait EntityApi<T: Entity>: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Result<Fetched<Page<T>>>;

    async fn get(&self, id: &EntityId) -> Result<Fetched<T>>;

    async fn create(&self, entity: &T) -> Result<Fetched<T>>;

    async fn update(&self, entity: &T) -> Result<Fetched<T>>;

    async fn partial_update(&self, entity: &T) -> Result<Fetched<T>>;

    async fn delete(&self, id: &EntityId) -> Result<Fetched<()>>;
}

/// `reqwest`-backed implementation of [`EntityApi`].
pub struct RestEntityApi<T> {
    http: reqwest::Client,
    config: ClientConfig,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> RestEntityApi<T> {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            config,
            _entity: PhantomData,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn send(&self, method: Method, url: Url, body: Option<&T>) -> Result<Response> {
        debug!(method = %method, url = %url, "issuing request");

        let mut request: RequestBuilder = self.http.request(method.clone(), url.clone());
        if let Some(entity) = body {
            request = request.json(&clean_entity(entity)?);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            debug!(method = %method, url = %url, status = status.as_u16(), "request succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body)
            .or_else(|| status.canonical_reason().map(str::to_string));
        warn!(method = %method, url = %url, status = status.as_u16(), detail = ?detail, "request failed");

        Err(ClientError::Http {
            status: status.as_u16(),
            detail,
        })
    }

    async fn send_entity(&self, method: Method, url: Url, body: Option<&T>) -> Result<Fetched<T>> {
        let response = self.send(method, url, body).await?;
        let status = response.status().as_u16();
        let data = decode(response).await?;
        Ok(Fetched { status, data })
    }

    fn id_url(&self, entity: &T) -> Result<Url> {
        let id = entity.id().ok_or(ClientError::MissingId)?;
        Ok(self.config.item_url(id)?)
    }
}

#[async_trait]
impl<T: Entity> EntityApi<T> for RestEntityApi<T> {
    async fn list(&self, query: &ListQuery) -> Result<Fetched<Page<T>>> {
        let mut url = self.config.collection_url()?;
        query.apply(&mut url, chrono::Utc::now().timestamp_millis());

        let response = self.send(Method::GET, url, None).await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let items: Vec<T> = decode(response).await?;
        let page = page_from_headers(&headers, items)?;

        Ok(Fetched { status, data: page })
    }

    async fn get(&self, id: &EntityId) -> Result<Fetched<T>> {
        let url = self.config.item_url(id)?;
        self.send_entity(Method::GET, url, None).await
    }

    async fn create(&self, entity: &T) -> Result<Fetched<T>> {
        let url = self.config.collection_url()?;
        self.send_entity(Method::POST, url, Some(entity)).await
    }

    async fn update(&self, entity: &T) -> Result<Fetched<T>> {
        let url = self.id_url(entity)?;
        self.send_entity(Method::PUT, url, Some(entity)).await
    }

    async fn partial_update(&self, entity: &T) -> Result<Fetched<T>> {
        let url = self.id_url(entity)?;
        self.send_entity(Method::PATCH, url, Some(entity)).await
    }

    async fn delete(&self, id: &EntityId) -> Result<Fetched<()>> {
        let url = self.config.item_url(id)?;
        let response = self.send(Method::DELETE, url, None).await?;
        Ok(Fetched {
            status: response.status().as_u16(),
            data: (),
        })
    }
}

async fn decode<D: DeserializeOwned>(response: Response) -> Result<D> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Resolves `link` and `x-total-count` for a fetched page.
///
/// A missing link header leaves the cursors empty and a missing or
/// non-numeric count falls back to the page length.
pub fn page_from_headers<T>(headers: &HeaderMap, items: Vec<T>) -> Result<Page<T>> {
    let links = match headers.get(LINK).map(|value| value.to_str()) {
        Some(Ok(raw)) => parse_header_for_links(raw)?,
        Some(Err(_)) => return Err(LinkHeaderError::NotAscii.into()),
        None => Links::default(),
    };

    let total_items = parse_total_count(
        headers
            .get(TOTAL_COUNT_HEADER)
            .and_then(|value| value.to_str().ok()),
    )
    .unwrap_or(items.len() as u64);

    Ok(Page {
        items,
        links,
        total_items,
    })
}

#[derive(serde::Deserialize)]
struct ProblemBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Picks a human readable message out of an error body. Problem-details
/// JSON is preferred; short plain-text bodies are used as-is.
fn error_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(problem) = serde_json::from_str::<ProblemBody>(trimmed) {
        return problem
            .detail
            .or(problem.message)
            .or(problem.title)
            .or(problem.error);
    }

    (trimmed.len() <= 200).then(|| trimmed.to_string())
}
