//! Paged search responses and facet counts.

use serde::{Deserialize, Serialize};

use crate::params::LiteratureSearchParameter;

/// One facet value and how many documents carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    /// The bucket value, as stored in the index.
    pub name: String,
    /// Number of matching documents.
    pub count: u64,
}

/// Value counts for one requested facet dimension, in backend bucket order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facet {
    /// The dimension the counts belong to.
    pub field: LiteratureSearchParameter,
    /// Ordered (value, count) pairs, already paged.
    pub counts: Vec<FacetCount>,
}

/// A page of search results with the facet counts computed alongside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse<T> {
    /// Offset the caller asked for (the reported offset, see the service's
    /// deep-pagination clamp).
    pub offset: u64,
    /// Page size.
    pub limit: u32,
    /// Total matching documents.
    pub count: u64,
    /// Whether this page reaches the end of the result set.
    pub end_of_records: bool,
    /// The materialized results.
    pub results: Vec<T>,
    /// Facet counts, one entry per requested facet with a field mapping.
    pub facets: Vec<Facet>,
}

impl<T> SearchResponse<T> {
    /// An empty response for the given window.
    pub fn new(offset: u64, limit: u32) -> Self {
        Self {
            offset,
            limit,
            count: 0,
            end_of_records: true,
            results: Vec::new(),
            facets: Vec::new(),
        }
    }

    /// Recomputes `end_of_records` from the current window and count.
    pub fn update_end_of_records(&mut self) {
        self.end_of_records = self.offset + u64::from(self.limit) >= self.count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_records_tracks_the_window() {
        let mut response: SearchResponse<()> = SearchResponse::new(0, 20);
        response.count = 50;
        response.update_end_of_records();
        assert!(!response.end_of_records);

        response.offset = 40;
        response.update_end_of_records();
        assert!(response.end_of_records);
    }
}
