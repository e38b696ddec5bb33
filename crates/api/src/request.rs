//! The faceted search request.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::params::LiteratureSearchParameter;

/// The reserved free-text token meaning "match everything".
pub const QUERY_WILDCARD: &str = "*";

const DEFAULT_LIMIT: u32 = 20;
const DEFAULT_FACET_OFFSET: u32 = 0;
const DEFAULT_FACET_LIMIT: u32 = 10;

/// Per-facet paging override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetPage {
    /// How many leading buckets to skip.
    pub offset: u32,
    /// How many buckets to return.
    pub limit: u32,
}

/// A faceted search request, already parsed from transport parameters.
///
/// `parameters` is a multimap: each parameter filters on the union (OR) of
/// its raw values, and distinct parameters combine with AND. A raw value may
/// be a literal or a `low,high` range with `*` for an open end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiteratureSearchRequest {
    /// Free-text query; `None`, empty, or [`QUERY_WILDCARD`] match everything.
    pub q: Option<String>,
    /// Raw filter values per parameter.
    pub parameters: HashMap<LiteratureSearchParameter, BTreeSet<String>>,
    /// Result window offset.
    pub offset: u64,
    /// Result window size.
    pub limit: u32,
    /// Dimensions to return value counts for.
    pub facets: Vec<LiteratureSearchParameter>,
    /// Per-facet paging overrides.
    pub facet_pages: HashMap<LiteratureSearchParameter, FacetPage>,
    /// Request-level facet bucket offset, when no per-facet override applies.
    pub facet_offset: Option<u32>,
    /// Request-level facet bucket limit, when no per-facet override applies.
    pub facet_limit: Option<u32>,
    /// Drop facet buckets with fewer matches than this.
    pub facet_min_count: Option<u32>,
    /// Multi-select facet semantics: a facet's counts ignore its own filter.
    pub multi_select_facets: bool,
    /// Ask the engine to highlight matched fragments in title and abstract.
    pub highlight: bool,
}

impl Default for LiteratureSearchRequest {
    fn default() -> Self {
        Self {
            q: None,
            parameters: HashMap::new(),
            offset: 0,
            limit: DEFAULT_LIMIT,
            facets: Vec::new(),
            facet_pages: HashMap::new(),
            facet_offset: None,
            facet_limit: None,
            facet_min_count: None,
            multi_select_facets: false,
            highlight: false,
        }
    }
}

impl LiteratureSearchRequest {
    /// An empty request with the given result window.
    pub fn new(offset: u64, limit: u32) -> Self {
        Self {
            offset,
            limit,
            ..Self::default()
        }
    }

    /// Adds a raw filter value for a parameter.
    pub fn add_parameter(
        &mut self,
        parameter: LiteratureSearchParameter,
        value: impl Into<String>,
    ) -> &mut Self {
        self.parameters.entry(parameter).or_default().insert(value.into());
        self
    }

    /// The bucket offset to use for a facet: the per-facet override, then the
    /// request-level value, then 0.
    pub fn facet_offset_for(&self, facet: LiteratureSearchParameter) -> u32 {
        self.facet_pages
            .get(&facet)
            .map(|page| page.offset)
            .or(self.facet_offset)
            .unwrap_or(DEFAULT_FACET_OFFSET)
    }

    /// The bucket limit to use for a facet: the per-facet override, then the
    /// request-level value, then 10.
    pub fn facet_limit_for(&self, facet: LiteratureSearchParameter) -> u32 {
        self.facet_pages
            .get(&facet)
            .map(|page| page.limit)
            .or(self.facet_limit)
            .unwrap_or(DEFAULT_FACET_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facet_paging_precedence() {
        let mut request = LiteratureSearchRequest::default();
        request.facet_limit = Some(25);
        request.facet_pages.insert(
            LiteratureSearchParameter::Topics,
            FacetPage {
                offset: 5,
                limit: 50,
            },
        );

        // per-facet override wins
        assert_eq!(
            request.facet_limit_for(LiteratureSearchParameter::Topics),
            50
        );
        assert_eq!(
            request.facet_offset_for(LiteratureSearchParameter::Topics),
            5
        );
        // request-level fallback
        assert_eq!(
            request.facet_limit_for(LiteratureSearchParameter::Year),
            25
        );
        // hard default
        assert_eq!(request.facet_offset_for(LiteratureSearchParameter::Year), 0);
    }

    #[test]
    fn add_parameter_builds_a_multimap() {
        let mut request = LiteratureSearchRequest::default();
        request
            .add_parameter(LiteratureSearchParameter::Year, "2020")
            .add_parameter(LiteratureSearchParameter::Year, "2021");
        assert_eq!(
            request
                .parameters
                .get(&LiteratureSearchParameter::Year)
                .unwrap()
                .len(),
            2
        );
    }
}
