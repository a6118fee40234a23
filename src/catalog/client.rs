use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use super::{FetchError, FetchedPage, PageFetcher, Record};

pub const DEFAULT_API_URL: &str = "https://api.artic.edu/api/v1/artworks";
pub const DEFAULT_PAGE_SIZE: usize = 12;
pub const MAX_PAGE_SIZE: usize = 100;

const FIELDS: &str = "id,title,place_of_origin,artist_display,inscriptions,date_start,date_end";

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub api_url: String,
    pub page_size: usize,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_seconds: 10,
            proxy: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid API URL: {url}")]
    InvalidUrl { url: String },

    #[error("invalid page_size {value}, expected 1..=100")]
    InvalidPageSize { value: usize },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    data: Vec<Record>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    total: u64,
}

/// Decodes one catalog response body.
pub fn decode_page(page: u32, body: &str) -> Result<FetchedPage, FetchError> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|source| FetchError::Decode { page, source })?;
    Ok(FetchedPage {
        records: response.data,
        total_count: response.pagination.total,
    })
}

/// Page fetcher backed by the Art Institute of Chicago artworks endpoint.
#[derive(Clone, Debug)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    api_url: reqwest::Url,
    page_size: usize,
}

impl HttpPageFetcher {
    pub fn new(options: &ClientOptions) -> Result<Self, ClientError> {
        if options.page_size == 0 || options.page_size > MAX_PAGE_SIZE {
            return Err(ClientError::InvalidPageSize {
                value: options.page_size,
            });
        }
        let api_url =
            reqwest::Url::parse(&options.api_url).map_err(|_| ClientError::InvalidUrl {
                url: options.api_url.clone(),
            })?;
        let client = build_client(options.proxy.as_deref(), options.timeout_seconds)?;
        Ok(Self {
            client,
            api_url,
            page_size: options.page_size,
        })
    }

    pub fn api_url(&self) -> &reqwest::Url {
        &self.api_url
    }
}

fn build_client(proxy: Option<&str>, timeout_seconds: u64) -> Result<reqwest::Client, ClientError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(concat!("artselect/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(Duration::from_secs(timeout_seconds));

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| ClientError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| ClientError::HttpClientBuild { source: e })
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn fetch_page(&self, page: u32) -> Result<FetchedPage, FetchError> {
        let network = |e: reqwest::Error| FetchError::Network {
            page,
            source: Box::new(e),
        };

        tracing::debug!(page, url = %self.api_url, "fetching catalog page");
        let resp = self
            .client
            .get(self.api_url.clone())
            .query(&[
                ("page", page.to_string()),
                ("limit", self.page_size.to_string()),
                ("fields", FIELDS.to_string()),
            ])
            .send()
            .await
            .map_err(network)?
            .error_for_status()
            .map_err(network)?;
        let body = resp.text().await.map_err(network)?;

        decode_page(page, &body)
    }
}
