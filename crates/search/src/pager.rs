//! Cursor-paged export over a pinned snapshot.
//!
//! [`ExportPager`] walks an entire result set page by page: it opens a
//! point-in-time snapshot lazily on the first page, resumes each subsequent
//! page from the previous page's last sort key, and releases the snapshot
//! once the scan is exhausted. Exhaustion clears the cursor, so a further
//! page call starts a fresh scan over a fresh snapshot. If a page fails
//! mid-scan the snapshot is left to expire at its keep-alive rather than
//! closed eagerly, so a caller retrying the page can still resume.

use async_trait::async_trait;
use serde_json::Value;

use litsearch_api::{LiteratureSearchRequest, LiteratureSearchResult};

use crate::error::SearchResult;
use crate::response::ResponseReader;

/// Results fetched per export round trip.
pub const DEFAULT_EXPORT_PAGE_SIZE: u32 = 500;

/// One page of an export scan.
#[derive(Debug)]
pub struct ExportPage {
    pub results: Vec<LiteratureSearchResult>,
    /// Set on the page that exhausts the scan; the page may still carry
    /// results.
    pub end_of_records: bool,
}

/// The snapshot-and-cursor operations the pager drives. Implemented by the
/// search service against the live backend, and by stubs in tests.
#[async_trait]
pub trait PitSearch: Send + Sync {
    /// Opens a point-in-time snapshot over the index and returns its id.
    async fn open_pit(&self) -> SearchResult<String>;

    /// Runs one export page inside the snapshot, resuming after the given
    /// sort key, and returns the raw response body.
    async fn pit_page(
        &self,
        request: &LiteratureSearchRequest,
        pit_id: &str,
        search_after: Option<&Value>,
        page_size: u32,
    ) -> SearchResult<Value>;

    /// Closes a snapshot. Failures are the caller's to tolerate.
    async fn close_pit(&self, pit_id: &str) -> SearchResult<()>;
}

/// Stateful forward-only iterator over every result matching a request.
///
/// One pager per export, called strictly sequentially.
pub struct ExportPager<'a> {
    backend: &'a dyn PitSearch,
    reader: ResponseReader,
    request: LiteratureSearchRequest,
    page_size: u32,
    pit_id: Option<String>,
    search_after: Option<Value>,
}

impl<'a> ExportPager<'a> {
    pub fn new(
        backend: &'a dyn PitSearch,
        reader: ResponseReader,
        request: LiteratureSearchRequest,
        page_size: u32,
    ) -> Self {
        Self {
            backend,
            reader,
            request,
            page_size,
            pit_id: None,
            search_after: None,
        }
    }

    /// The next page of results. A short or empty page ends the scan: the
    /// snapshot is released, the cursor cleared, and the page marked as the
    /// end of records.
    pub async fn next_page(&mut self) -> SearchResult<ExportPage> {
        let pit_id = match &self.pit_id {
            Some(id) => id.clone(),
            None => {
                let id = self.backend.open_pit().await?;
                self.pit_id = Some(id.clone());
                id
            }
        };

        let body = self
            .backend
            .pit_page(&self.request, &pit_id, self.search_after.as_ref(), self.page_size)
            .await?;

        let results = self.reader.read_hits(&body)?;
        self.search_after = self.reader.last_sort_values(&body);

        // a short page means the set is exhausted, no extra empty round trip;
        // counted on the raw hits, since materialization may drop some
        let end_of_records = self.reader.hit_count(&body) < self.page_size as usize;
        if end_of_records {
            self.release().await;
        }

        Ok(ExportPage {
            results,
            end_of_records,
        })
    }

    async fn release(&mut self) {
        self.search_after = None;
        if let Some(pit_id) = self.pit_id.take() {
            if let Err(e) = self.backend.close_pit(&pit_id).await {
                // the snapshot expires at its keep-alive anyway
                tracing::warn!(error = %e, "failed to close export snapshot");
            }
        }
    }
}
