//! Query compilation: request bodies, filter clauses, and facet
//! aggregations.

pub mod aggregations;
pub mod builder;
pub mod filters;

pub use aggregations::{INNER_AGGREGATION, MAX_AGGREGATION_SIZE};
pub use builder::{group_parameters, GroupedParams, SearchRequestBuilder};
