//! Elasticsearch client construction and connection management.
//!
//! [`EsClientHandle`] wraps the shared client behind a reconnect-on-demand
//! policy: [`EsClientHandle::healthy_client`] runs a cheap cluster-health
//! probe and, if the probe fails, rebuilds the transport and swaps it in
//! under a mutex. Concurrent callers block briefly during a swap instead of
//! racing to create duplicate connections.

use std::sync::Arc;
use std::time::Duration;

use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::Elasticsearch;
use parking_lot::Mutex;

use crate::config::{EsAuth, EsClientConfig};
use crate::error::{ConfigError, SearchResult};

/// Builds an Elasticsearch client from configuration.
pub fn build_client(config: &EsClientConfig) -> Result<Elasticsearch, ConfigError> {
    let url = config
        .nodes
        .first()
        .cloned()
        .unwrap_or_else(|| "http://localhost:9200".to_string());

    let parsed_url: elasticsearch::http::Url =
        url.parse().map_err(|e| ConfigError::InvalidNodeUrl {
            url: url.clone(),
            message: format!("{}", e),
        })?;

    let conn_pool = SingleNodeConnectionPool::new(parsed_url);

    let mut builder = TransportBuilder::new(conn_pool)
        .timeout(Duration::from_millis(config.request_timeout_ms));

    if config.disable_certificate_validation {
        builder = builder.cert_validation(CertificateValidation::None);
    }

    if let Some(ref auth) = config.auth {
        builder = match auth {
            EsAuth::Basic { username, password } => {
                builder.auth(Credentials::Basic(username.clone(), password.clone()))
            }
            EsAuth::Bearer { token } => builder.auth(Credentials::Bearer(token.clone())),
        };
    }

    let transport = builder.build().map_err(|e| ConfigError::Transport {
        message: format!("{}", e),
    })?;

    Ok(Elasticsearch::new(transport))
}

/// A shared Elasticsearch client with reconnect-on-demand.
pub struct EsClientHandle {
    config: EsClientConfig,
    inner: Mutex<Arc<Elasticsearch>>,
}

impl EsClientHandle {
    /// Creates a handle, building the initial client eagerly so that a bad
    /// configuration fails at startup.
    pub fn new(config: EsClientConfig) -> Result<Self, ConfigError> {
        let client = build_client(&config)?;
        Ok(Self {
            config,
            inner: Mutex::new(Arc::new(client)),
        })
    }

    /// The current client, without a liveness probe.
    pub fn client(&self) -> Arc<Elasticsearch> {
        self.inner.lock().clone()
    }

    /// The current client after a cluster-health probe; on probe failure the
    /// transport is rebuilt and swapped in before returning.
    pub async fn healthy_client(&self) -> SearchResult<Arc<Elasticsearch>> {
        let current = self.client();

        let probe = current
            .cluster()
            .health(elasticsearch::cluster::ClusterHealthParts::None)
            .send()
            .await;

        match probe {
            Ok(response) if response.status_code().is_success() => Ok(current),
            Ok(response) => {
                tracing::warn!(
                    status = %response.status_code(),
                    "search backend health probe returned non-success, rebuilding client"
                );
                self.swap_client(current)
            }
            Err(e) => {
                tracing::warn!(error = %e, "search backend health probe failed, rebuilding client");
                self.swap_client(current)
            }
        }
    }

    /// Replaces the shared client, unless another caller already swapped it.
    fn swap_client(&self, stale: Arc<Elasticsearch>) -> SearchResult<Arc<Elasticsearch>> {
        let fresh = Arc::new(build_client(&self.config)?);
        let mut guard = self.inner.lock();
        if Arc::ptr_eq(&guard, &stale) {
            *guard = fresh.clone();
            Ok(fresh)
        } else {
            // Lost the race; the other caller's client is the live one.
            Ok(guard.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_node_url() {
        let config = EsClientConfig {
            nodes: vec!["not a url".to_string()],
            ..EsClientConfig::default()
        };
        assert!(matches!(
            build_client(&config),
            Err(ConfigError::InvalidNodeUrl { .. })
        ));
    }

    #[test]
    fn builds_client_with_basic_auth() {
        let config = EsClientConfig {
            auth: Some(EsAuth::Basic {
                username: "elastic".to_string(),
                password: "changeme".to_string(),
            }),
            ..EsClientConfig::default()
        };
        assert!(build_client(&config).is_ok());
    }

    #[test]
    fn handle_serves_the_same_client_until_swapped() {
        let handle = EsClientHandle::new(EsClientConfig::default()).unwrap();
        let a = handle.client();
        let b = handle.client();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
