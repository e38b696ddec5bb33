//! Elasticsearch search layer for the literature service.
//!
//! Compiles [`LiteratureSearchRequest`](litsearch_api::LiteratureSearchRequest)
//! values into backend query bodies and materializes the responses back into
//! the domain model:
//!
//! - [`config`] / [`client`] - Backend configuration and the reconnecting
//!   client handle
//! - [`mapper`] - The parameter-to-field table and index metadata
//! - [`query`] - Request bodies, filter clauses, and facet aggregations
//! - [`response`] - Hit materialization and facet extraction
//! - [`pager`] - Snapshot-pinned cursor paging for full exports
//! - [`service`] - The public search service
//!
//! The guiding policy is permissive degradation: malformed values inside an
//! otherwise valid request are dropped with a diagnostic, and only requests
//! that cannot be compiled at all (malformed ranges, oversized facet pages)
//! are rejected.

pub mod client;
pub mod config;
pub mod error;
pub mod mapper;
pub mod pager;
pub mod query;
pub mod response;
pub mod service;

pub use client::EsClientHandle;
pub use config::{EsAuth, EsClientConfig};
pub use error::{ConfigError, RequestError, SearchError, SearchResult};
pub use mapper::FieldMapper;
pub use pager::{ExportPage, ExportPager, PitSearch, DEFAULT_EXPORT_PAGE_SIZE};
pub use query::{SearchRequestBuilder, INNER_AGGREGATION, MAX_AGGREGATION_SIZE};
pub use response::ResponseReader;
pub use service::LiteratureSearchService;
