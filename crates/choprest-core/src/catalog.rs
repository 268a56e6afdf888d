// ── Restaurant catalog ──
//
// Domain-level access to the restaurant REST API. Rows are converted into
// `Restaurant`s here so nothing above this layer sees wire types.

use choprest_api::{RestaurantClient, TransportConfig};
use tracing::debug;

use crate::config::CatalogConfig;
use crate::error::CoreError;
use crate::model::{EntityId, Restaurant};

/// Read-only view of the restaurant catalog.
pub struct RestaurantCatalog {
    client: RestaurantClient,
    timeout_secs: u64,
}

impl RestaurantCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let client = RestaurantClient::new(config.base_url.clone(), &transport)?;
        Ok(Self {
            client,
            timeout_secs: config.timeout.as_secs(),
        })
    }

    /// Every restaurant. Used as the fallback pool for radius searches.
    pub async fn all(&self) -> Result<Vec<Restaurant>, CoreError> {
        let rows = self.client.list_all().await.map_err(|e| self.map_err(e))?;
        Ok(convert_rows(rows))
    }

    /// Keyword search over names and branches. A blank keyword lists
    /// everything.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Restaurant>, CoreError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return self.all().await;
        }
        let rows = self.client.search(keyword).await.map_err(|e| self.map_err(e))?;
        debug!(keyword, count = rows.len(), "catalog search");
        Ok(convert_rows(rows))
    }

    /// Name-only search.
    pub async fn search_by_name(&self, name: &str) -> Result<Vec<Restaurant>, CoreError> {
        let rows = self
            .client
            .search_by_name(name.trim())
            .await
            .map_err(|e| self.map_err(e))?;
        Ok(convert_rows(rows))
    }

    pub async fn get(&self, id: EntityId) -> Result<Restaurant, CoreError> {
        let row = self
            .client
            .get_restaurant(id.get())
            .await
            .map_err(|e| match e {
                choprest_api::Error::NotFound { .. } => CoreError::RestaurantNotFound {
                    identifier: id.to_string(),
                },
                other => self.map_err(other),
            })?;
        Ok(row.into())
    }

    fn map_err(&self, err: choprest_api::Error) -> CoreError {
        match CoreError::from(err) {
            CoreError::Timeout { .. } => CoreError::Timeout {
                timeout_secs: self.timeout_secs,
            },
            other => other,
        }
    }
}

fn convert_rows(rows: Vec<choprest_api::Restaurant>) -> Vec<Restaurant> {
    rows.into_iter().map(Restaurant::from).collect()
}
