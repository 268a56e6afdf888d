// Restaurant API HTTP client
//
// Wraps `reqwest::Client` with URL construction and status/body handling
// for the read-only restaurant endpoints. The server returns bare JSON
// (no envelope), so every helper decodes straight into the target type.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::Restaurant;
use crate::transport::TransportConfig;

/// HTTP client for the restaurant catalog.
///
/// All methods hit `{base}/api/restaurants/...` and return decoded rows.
pub struct RestaurantClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestaurantClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the server root (e.g. `http://localhost:8080`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/restaurants/all`: every restaurant in the catalog.
    pub async fn list_all(&self) -> Result<Vec<Restaurant>, Error> {
        let url = self.api_url("restaurants/all")?;
        self.get(url).await
    }

    /// `GET /api/restaurants?keyword=`: combined branch + name search.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Restaurant>, Error> {
        let mut url = self.api_url("restaurants")?;
        url.query_pairs_mut().append_pair("keyword", keyword);
        self.get(url).await
    }

    /// `GET /api/restaurants/name?name=`: name-only search.
    pub async fn search_by_name(&self, name: &str) -> Result<Vec<Restaurant>, Error> {
        let mut url = self.api_url("restaurants/name")?;
        url.query_pairs_mut().append_pair("name", name);
        self.get(url).await
    }

    /// `GET /api/restaurants/{id}`: a single restaurant.
    pub async fn get_restaurant(&self, id: i64) -> Result<Restaurant, Error> {
        let url = self.api_url(&format!("restaurants/{id}"))?;
        self.get(url).await
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{path}`, tolerating a trailing slash on the base.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let path = url.path().to_owned();
        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound { path });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }
}
