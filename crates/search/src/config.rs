//! Configuration for the Elasticsearch search layer.

use serde::{Deserialize, Serialize};

/// Authentication configuration for the search backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EsAuth {
    /// Basic username/password authentication.
    Basic {
        /// The username for basic auth.
        username: String,
        /// The password for basic auth.
        password: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// The bearer token.
        token: String,
    },
}

/// Configuration for the Elasticsearch client and search service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsClientConfig {
    /// Elasticsearch node URLs (e.g. `["http://localhost:9200"]`).
    /// Currently uses the first node (single-node connection pool).
    pub nodes: Vec<String>,

    /// The literature index to search (default: `"literature"`).
    #[serde(default = "default_index")]
    pub index: String,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Deepest `offset + limit` forwarded to the backend (default: 100000).
    /// Deeper requests are clamped; see the search service.
    #[serde(default = "default_max_result_window")]
    pub max_result_window: u32,

    /// Keep-alive for export snapshots, in backend time-value syntax
    /// (default: `"1m"`). Also bounds how long an abandoned snapshot lives.
    #[serde(default = "default_pit_keep_alive")]
    pub pit_keep_alive: String,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<EsAuth>,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,
}

fn default_index() -> String {
    "literature".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30000
}

fn default_max_result_window() -> u32 {
    100_000
}

fn default_pit_keep_alive() -> String {
    "1m".to_string()
}

impl Default for EsClientConfig {
    fn default() -> Self {
        Self {
            nodes: vec!["http://localhost:9200".to_string()],
            index: default_index(),
            request_timeout_ms: default_request_timeout_ms(),
            max_result_window: default_max_result_window(),
            pit_keep_alive: default_pit_keep_alive(),
            auth: None,
            disable_certificate_validation: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = EsClientConfig::default();
        assert_eq!(config.index, "literature");
        assert_eq!(config.max_result_window, 100_000);
        assert_eq!(config.pit_keep_alive, "1m");
        assert_eq!(config.nodes, vec!["http://localhost:9200"]);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: EsClientConfig =
            serde_json::from_str(r#"{ "nodes": ["http://es:9200"], "index": "lit" }"#).unwrap();
        assert_eq!(config.index, "lit");
        assert_eq!(config.request_timeout_ms, 30000);
        assert!(config.auth.is_none());
    }
}
