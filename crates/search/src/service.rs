//! The literature search service.
//!
//! [`LiteratureSearchService`] is the public entry point: it owns the client
//! handle, the request builder, and the response reader, and exposes paged
//! search, single-document lookup, and full exports.

use elasticsearch::http::response::Response;
use elasticsearch::{OpenPointInTimeParts, SearchParts};
use serde_json::{json, Value};
use uuid::Uuid;

use async_trait::async_trait;

use litsearch_api::{LiteratureSearchRequest, LiteratureSearchResult, SearchResponse};

use crate::client::EsClientHandle;
use crate::config::EsClientConfig;
use crate::error::{ConfigError, SearchError, SearchResult};
use crate::mapper::FieldMapper;
use crate::pager::{ExportPager, PitSearch, DEFAULT_EXPORT_PAGE_SIZE};
use crate::query::SearchRequestBuilder;
use crate::response::ResponseReader;

pub struct LiteratureSearchService {
    config: EsClientConfig,
    handle: EsClientHandle,
    builder: SearchRequestBuilder,
    reader: ResponseReader,
}

impl LiteratureSearchService {
    /// Builds the service; configuration and table problems fail here, not
    /// at query time.
    pub fn new(config: EsClientConfig) -> Result<Self, ConfigError> {
        let handle = EsClientHandle::new(config.clone())?;
        let builder = SearchRequestBuilder::new(FieldMapper::new()?);
        let reader = ResponseReader::new()?;
        Ok(Self {
            config,
            handle,
            builder,
            reader,
        })
    }

    /// Runs a paged search.
    ///
    /// Pages past the backend's result window are clamped to the last
    /// reachable window; the response still reports the offset the caller
    /// asked for, so `end_of_records` comes out true and paging clients
    /// stop cleanly instead of receiving an error.
    pub async fn search(
        &self,
        request: &LiteratureSearchRequest,
    ) -> SearchResult<SearchResponse<LiteratureSearchResult>> {
        let from = self.effective_offset(request);
        let body = self.builder.build_search(request, from)?;

        tracing::debug!(offset = request.offset, from, limit = request.limit, "literature search");
        let response_body = self
            .execute_search(SearchParts::Index(&[self.config.index.as_str()]), body)
            .await?;

        self.reader
            .read_search_response(self.builder.mapper(), request, request.offset, &response_body)
    }

    /// Looks a single document up by id.
    pub async fn get_by_id(&self, id: &Uuid) -> SearchResult<Option<LiteratureSearchResult>> {
        let body = self.builder.build_get_by_id(id);
        let response_body = self
            .execute_search(SearchParts::Index(&[self.config.index.as_str()]), body)
            .await?;
        self.reader.read_get_response(&response_body)
    }

    /// A pager over every result matching the request, in sort order.
    pub fn export(&self, request: LiteratureSearchRequest) -> ExportPager<'_> {
        self.export_with_page_size(request, DEFAULT_EXPORT_PAGE_SIZE)
    }

    pub fn export_with_page_size(
        &self,
        request: LiteratureSearchRequest,
        page_size: u32,
    ) -> ExportPager<'_> {
        ExportPager::new(self, self.reader.clone(), request, page_size)
    }

    /// The offset actually sent to the backend: the caller's, unless the
    /// requested window would cross the backend's result-window ceiling.
    fn effective_offset(&self, request: &LiteratureSearchRequest) -> u64 {
        let window = u64::from(self.config.max_result_window);
        let limit = u64::from(request.limit);
        if request.offset.saturating_add(limit) >= window {
            window.saturating_sub(limit)
        } else {
            request.offset
        }
    }

    async fn execute_search(&self, parts: SearchParts<'_>, body: Value) -> SearchResult<Value> {
        let client = self.handle.healthy_client().await?;
        let response = client.search(parts).body(body).send().await?;
        read_body(response).await
    }
}

#[async_trait]
impl PitSearch for LiteratureSearchService {
    async fn open_pit(&self) -> SearchResult<String> {
        let client = self.handle.healthy_client().await?;
        let response = client
            .open_point_in_time(OpenPointInTimeParts::Index(&[self.config.index.as_str()]))
            .keep_alive(&self.config.pit_keep_alive)
            .send()
            .await?;
        let body = read_body(response).await?;
        body["id"]
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| SearchError::Response {
                message: "snapshot response without an id".to_string(),
            })
    }

    async fn pit_page(
        &self,
        request: &LiteratureSearchRequest,
        pit_id: &str,
        search_after: Option<&Value>,
        page_size: u32,
    ) -> SearchResult<Value> {
        let body = self.builder.build_export_search(
            request,
            pit_id,
            &self.config.pit_keep_alive,
            search_after,
            page_size,
        )?;
        // the snapshot pins the index, so the search targets no index itself
        let client = self.handle.client();
        let response = client.search(SearchParts::None).body(body).send().await?;
        read_body(response).await
    }

    async fn close_pit(&self, pit_id: &str) -> SearchResult<()> {
        let client = self.handle.client();
        let response = client
            .close_point_in_time()
            .body(json!({ "id": pit_id }))
            .send()
            .await?;
        read_body(response).await.map(|_| ())
    }
}

/// Status and body handling shared by every backend call.
async fn read_body(response: Response) -> SearchResult<Value> {
    let status = response.status_code();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SearchError::BackendStatus {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| SearchError::Response {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> LiteratureSearchService {
        LiteratureSearchService::new(EsClientConfig::default()).unwrap()
    }

    #[test]
    fn shallow_offsets_pass_through() {
        let mut request = LiteratureSearchRequest::default();
        request.offset = 40;
        request.limit = 20;
        assert_eq!(service().effective_offset(&request), 40);
    }

    #[test]
    fn deep_offsets_clamp_to_the_last_reachable_window() {
        let mut request = LiteratureSearchRequest::default();
        request.offset = 2_000_000;
        request.limit = 20;
        // window is 100_000 by default
        assert_eq!(service().effective_offset(&request), 99_980);
    }

    #[test]
    fn a_window_touching_the_ceiling_clamps_too() {
        let mut request = LiteratureSearchRequest::default();
        request.offset = 99_990;
        request.limit = 10;
        assert_eq!(service().effective_offset(&request), 99_990);

        request.offset = 99_991;
        assert_eq!(service().effective_offset(&request), 99_990);
    }

    #[test]
    fn extreme_offsets_clamp_without_overflow() {
        let mut request = LiteratureSearchRequest::default();
        request.offset = u64::MAX;
        request.limit = 20;
        assert_eq!(service().effective_offset(&request), 99_980);
    }

    #[test]
    fn construction_rejects_bad_configuration() {
        let config = EsClientConfig {
            nodes: vec!["::".to_string()],
            ..EsClientConfig::default()
        };
        assert!(LiteratureSearchService::new(config).is_err());
    }
}
