//! HTTP access to the paginated character collection.

use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    domain::CharacterStatus,
    error::ApiErrorBody,
    protocol::{CharacterPage, FetchQuery, PageInfo},
};
use tracing::{debug, info};
use url::Url;

use crate::error::NetworkError;

pub const DEFAULT_COLLECTION_URL: &str = "https://rickandmortyapi.com/api/character";

/// Anything that can answer a [`FetchQuery`]. The runtime only talks to this
/// trait so tests can script responses without a network.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    async fn fetch(&self, query: FetchQuery) -> Result<CharacterPage, NetworkError>;
}

/// Stateless client for `GET /character[?page=N][&status=S]`.
#[derive(Debug, Clone)]
pub struct RemoteCollectionClient {
    http: Client,
    collection_url: Url,
}

impl RemoteCollectionClient {
    pub fn new(collection_url: &str) -> Result<Self, NetworkError> {
        Self::with_timeout(collection_url, None)
    }

    /// `timeout` bounds each individual HTTP request, not a whole traversal.
    pub fn with_timeout(
        collection_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, NetworkError> {
        let collection_url = parse_url(collection_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|source| transport_error(&collection_url, source))?;
        Ok(Self {
            http,
            collection_url,
        })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    /// Eager mode: walks the `next` chain from the collection root and
    /// returns every character in traversal order. Nothing is returned unless
    /// the whole chain resolves.
    pub async fn fetch_all(&self) -> Result<CharacterPage, NetworkError> {
        let mut characters = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut visited = HashSet::new();
        let mut next = Some(self.collection_url.clone());
        let mut pages = 0u32;

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                return Err(NetworkError::Malformed {
                    url: url.to_string(),
                    reason: "pagination links revisit an earlier page".to_string(),
                });
            }

            let page = self.get_page(&url).await?;
            pages += 1;

            for character in page.results {
                if seen_ids.insert(character.id) {
                    characters.push(character);
                } else {
                    debug!(id = character.id.0, %url, "dropping repeated character");
                }
            }

            next = match page.info.next.as_deref() {
                Some(link) => Some(url.join(link).map_err(|source| NetworkError::InvalidUrl {
                    url: link.to_string(),
                    source,
                })?),
                None => None,
            };
        }

        info!(pages, characters = characters.len(), "fetched full collection");
        Ok(CharacterPage {
            info: PageInfo::single(characters.len()),
            results: characters,
        })
    }

    /// Single-page mode: one request, filtered on the server when `status`
    /// is set. The page comes back verbatim.
    pub async fn fetch_page(
        &self,
        page: u32,
        status: Option<CharacterStatus>,
    ) -> Result<CharacterPage, NetworkError> {
        let mut url = self.collection_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("page", &page.to_string());
            if let Some(status) = status {
                pairs.append_pair("status", status.as_str());
            }
        }
        self.get_page(&url).await
    }

    async fn get_page(&self, url: &Url) -> Result<CharacterPage, NetworkError> {
        debug!(%url, "requesting collection page");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| transport_error(url, source))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| transport_error(url, source))?;

        if !status.is_success() {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        serde_json::from_str(&body).map_err(|err| NetworkError::Malformed {
            url: url.to_string(),
            reason: err.to_string(),
        })
    }
}

#[async_trait]
impl CollectionSource for RemoteCollectionClient {
    async fn fetch(&self, query: FetchQuery) -> Result<CharacterPage, NetworkError> {
        match query {
            FetchQuery::All => self.fetch_all().await,
            FetchQuery::Page { page, status } => self.fetch_page(page, status).await,
        }
    }
}

fn parse_url(raw: &str) -> Result<Url, NetworkError> {
    Url::parse(raw.trim()).map_err(|source| NetworkError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

fn transport_error(url: &Url, source: reqwest::Error) -> NetworkError {
    NetworkError::Transport {
        url: url.to_string(),
        source,
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(payload) if !payload.error.trim().is_empty() => payload.error,
        _ => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
