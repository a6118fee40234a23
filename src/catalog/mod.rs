pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub use client::{ClientError, ClientOptions, HttpPageFetcher};

pub type RecordId = u64;

// one artwork as returned by the catalog, identity is `id`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, rename = "place_of_origin")]
    pub origin_place: Option<String>,
    #[serde(default)]
    pub artist_display: Option<String>,
    #[serde(default)]
    pub inscriptions: Option<String>,
    #[serde(default)]
    pub date_start: Option<i64>,
    #[serde(default)]
    pub date_end: Option<i64>,
}

impl Record {
    pub fn new(id: RecordId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            origin_place: None,
            artist_display: None,
            inscriptions: None,
            date_start: None,
            date_end: None,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// The records of one page plus the catalog-wide record count.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub records: Vec<Record>,
    pub total_count: u64,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error fetching page {page}: {source}")]
    Network {
        page: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("failed to decode page {page}: {source}")]
    Decode {
        page: u32,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn page(&self) -> u32 {
        match self {
            FetchError::Network { page, .. } | FetchError::Decode { page, .. } => *page,
        }
    }
}

/// Source of fixed-size, 1-indexed catalog pages.
///
/// Implementations must return records in catalog order and the same
/// `page_size` for every call.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    fn page_size(&self) -> usize;

    async fn fetch_page(&self, page: u32) -> Result<FetchedPage, FetchError>;
}
