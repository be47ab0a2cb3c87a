//! Elasticsearch backend implementation.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::response::Response;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::indices::{IndicesCreateParts, IndicesExistsParts, IndicesRefreshParts};
use elasticsearch::{DeleteByQueryParts, DeleteParts, Elasticsearch, IndexParts, SearchParts};
use serde_json::Value;

use crate::config::{StorageAuth, StorageConfig};
use crate::core::{BackendKind, SearchBackend, SearchHit, SearchHits};
use crate::error::{BackendError, StorageError, StorageResult};

const BACKEND_NAME: &str = "elasticsearch";

fn unavailable(message: String) -> BackendError {
    BackendError::Unavailable {
        backend_name: BACKEND_NAME.to_string(),
        message,
    }
}

fn malformed(message: String) -> BackendError {
    BackendError::MalformedResponse {
        backend_name: BACKEND_NAME.to_string(),
        message,
    }
}

/// Elasticsearch driver for the storage layer.
///
/// Holds one client built from [`StorageConfig`]; all requests go through the
/// same single-node transport, which enforces `request_timeout_ms`.
pub struct ElasticsearchBackend {
    client: Elasticsearch,
    config: StorageConfig,
}

impl Debug for ElasticsearchBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchBackend")
            .field("nodes", &self.config.nodes)
            .field("index_prefix", &self.config.index_prefix)
            .finish_non_exhaustive()
    }
}

impl ElasticsearchBackend {
    /// Creates a new Elasticsearch backend with the given configuration.
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        config.validate()?;
        let client = Self::build_client(&config)?;
        Ok(Self { client, config })
    }

    /// Builds the Elasticsearch client from configuration.
    fn build_client(config: &StorageConfig) -> StorageResult<Elasticsearch> {
        let url = config
            .nodes
            .iter()
            .find(|n| !n.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| "http://localhost:9200".to_string());

        let parsed_url: elasticsearch::http::Url = url.parse().map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Invalid URL {}: {}", url, e),
            })
        })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);

        let mut builder = TransportBuilder::new(conn_pool)
            .timeout(Duration::from_millis(config.request_timeout_ms));

        if config.disable_certificate_validation {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some(ref auth) = config.auth {
            builder = match auth {
                StorageAuth::Basic { username, password } => {
                    builder.auth(Credentials::Basic(username.clone(), password.clone()))
                }
                StorageAuth::Bearer { token } => builder.auth(Credentials::Bearer(token.clone())),
            };
        }

        let transport = builder.build().map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Failed to build transport: {}", e),
            })
        })?;

        Ok(Elasticsearch::new(transport))
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Refreshes indices so recently indexed documents become searchable.
    ///
    /// Only needed for testing; in production ES refreshes automatically.
    pub async fn refresh(&self, indices: &[&str]) -> Result<(), BackendError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(indices))
            .send()
            .await
            .map_err(|e| unavailable(format!("Failed to refresh {:?}: {}", indices, e)))?;
        check_status(response).await.map(|_| ())
    }
}

/// Returns the response when successful, the raw body as `Rejected` otherwise.
async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Rejected {
        backend_name: BACKEND_NAME.to_string(),
        status: status.as_u16(),
        body,
    })
}

fn is_index_not_found(error: &BackendError) -> bool {
    matches!(error, BackendError::Rejected { body, .. } if body.contains("index_not_found_exception"))
}

/// Parses the `hits` section of a search response.
fn parse_search_response(body: &Value) -> Result<SearchHits, BackendError> {
    let hits = body
        .get("hits")
        .ok_or_else(|| malformed("search response has no hits".to_string()))?;

    // `total` is an object since 7.0; older clusters answer with a number.
    let (total, total_is_exact) = match hits.get("total") {
        Some(Value::Number(n)) => (n.as_u64().unwrap_or(0), true),
        Some(t) => (
            t.get("value").and_then(Value::as_u64).unwrap_or(0),
            t.get("relation").and_then(Value::as_str).unwrap_or("eq") == "eq",
        ),
        None => (0, false),
    };

    let hits = hits
        .get("hits")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .map(|hit| SearchHit {
                    id: hit
                        .get("_id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    source: hit.get("_source").cloned().unwrap_or(Value::Null),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(SearchHits {
        total,
        total_is_exact,
        hits,
    })
}

#[async_trait]
impl SearchBackend for ElasticsearchBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Elasticsearch
    }

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn search(&self, indices: &[&str], query: Value) -> Result<SearchHits, BackendError> {
        let response = self
            .client
            .search(SearchParts::Index(indices))
            .body(query)
            .send()
            .await
            .map_err(|e| unavailable(format!("Search failed: {}", e)))?;

        let response = match check_status(response).await {
            Ok(r) => r,
            // An alias with no index behind it yet has nothing to match.
            Err(e) if is_index_not_found(&e) => {
                tracing::debug!("Searched missing index {:?}", indices);
                return Ok(SearchHits {
                    total_is_exact: true,
                    ..Default::default()
                });
            }
            Err(e) => return Err(e),
        };

        let body: Value = response
            .json()
            .await
            .map_err(|e| malformed(format!("Failed to parse search response: {}", e)))?;
        parse_search_response(&body)
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        document: Value,
    ) -> Result<(), BackendError> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(document)
            .send()
            .await
            .map_err(|e| unavailable(format!("Failed to index document: {}", e)))?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| unavailable(format!("Failed to delete document: {}", e)))?;

        match check_status(response).await {
            Ok(_) => Ok(()),
            Err(BackendError::Rejected { status: 404, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn delete_by_query(&self, indices: &[&str], query: Value) -> Result<(), BackendError> {
        let response = self
            .client
            .delete_by_query(DeleteByQueryParts::Index(indices))
            .body(query)
            .send()
            .await
            .map_err(|e| unavailable(format!("Failed to delete by query: {}", e)))?;

        match check_status(response).await {
            Ok(_) => Ok(()),
            Err(e) if is_index_not_found(&e) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn index_exists(&self, index: &str) -> Result<bool, BackendError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| unavailable(format!("Failed to check index existence: {}", e)))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => check_status(response).await.map(|_| true),
        }
    }

    async fn create_index(&self, index: &str, mapping: Value) -> Result<(), BackendError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(mapping)
            .send()
            .await
            .map_err(|e| unavailable(format!("Failed to create index {}: {}", index, e)))?;

        match check_status(response).await {
            Ok(_) => Ok(()),
            // 400 with "resource_already_exists_exception" is OK (race condition)
            Err(BackendError::Rejected { body, .. })
                if body.contains("resource_already_exists_exception") =>
            {
                tracing::warn!("Elasticsearch index '{}' already exists", index);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
