//! Litsearch Domain Model
//!
//! Transport-independent types for the literature search service:
//!
//! - [`params`] - Search parameters and their value kinds
//! - [`vocabulary`] - Closed vocabularies (literature types, topics, regions)
//!   and validated country/language codes
//! - [`request`] - The faceted search request
//! - [`response`] - Paged search responses and facet counts
//! - [`result`] - The literature search result record
//!
//! The search layer (`litsearch-es`) compiles a [`request::LiteratureSearchRequest`]
//! into an Elasticsearch query and materializes hits back into
//! [`result::LiteratureSearchResult`] values.

pub mod params;
pub mod request;
pub mod response;
pub mod result;
pub mod vocabulary;

pub use params::{EnumKind, LiteratureSearchParameter, ValueKind};
pub use request::{FacetPage, LiteratureSearchRequest, QUERY_WILDCARD};
pub use response::{Facet, FacetCount, SearchResponse};
pub use result::LiteratureSearchResult;
pub use vocabulary::{Country, Language, LiteratureType, Region, Relevance, Topic};
