//! Facet aggregation compilation.
//!
//! Each requested facet becomes a terms aggregation named after its index
//! field, sized by the facet page bounded by the field's cardinality. Under
//! multi-select, a facet's aggregation is wrapped in a filter built from
//! every *other* active facet's post-filter, so its counts ignore its own
//! selection but respect the siblings'.

use serde_json::{json, Map, Value};

use litsearch_api::LiteratureSearchRequest;

use crate::error::RequestError;
use crate::mapper::FieldMapper;
use crate::query::builder::GroupedParams;
use crate::query::filters;

/// Hard ceiling on a single terms aggregation. Requests needing more buckets
/// fail fast instead of reaching the backend.
pub const MAX_AGGREGATION_SIZE: u64 = 1_200_000;

/// Name of the terms aggregation nested inside a multi-select filter
/// wrapper; the response reader looks it up under either the top level or
/// this name.
pub const INNER_AGGREGATION: &str = "inner";

/// Builds the aggregation section, or `None` when no facets are requested.
pub fn build_aggregations(
    mapper: &FieldMapper,
    request: &LiteratureSearchRequest,
    grouped: &GroupedParams,
) -> Result<Option<Value>, RequestError> {
    if request.facets.is_empty() {
        return Ok(None);
    }

    let mut aggregations = Map::new();

    for facet in &request.facets {
        let field = match mapper.field_for(*facet) {
            Some(field) => field,
            None => {
                tracing::debug!(facet = %facet, "facet has no field mapping, skipping");
                continue;
            }
        };

        let offset = request.facet_offset_for(*facet);
        let limit = request.facet_limit_for(*facet);
        let mut size = u64::from(offset) + u64::from(limit);
        if let Some(cardinality) = mapper.cardinality(field) {
            size = size.min(u64::from(cardinality));
        }
        if size > MAX_AGGREGATION_SIZE {
            return Err(RequestError::AggregationTooLarge {
                facet: facet.to_string(),
                size,
                ceiling: MAX_AGGREGATION_SIZE,
            });
        }

        let mut terms = json!({ "field": field, "size": size });
        if let Some(min_count) = request.facet_min_count {
            terms["min_doc_count"] = json!(min_count);
        }
        let terms_aggregation = json!({ "terms": terms });

        let aggregation = if request.multi_select_facets && request.facets.len() > 1 {
            match sibling_filter(mapper, grouped, *facet)? {
                Some(filter) => json!({
                    "filter": filter,
                    "aggs": { INNER_AGGREGATION: terms_aggregation }
                }),
                // no other facet filters active, plain terms is equivalent
                None => terms_aggregation,
            }
        } else {
            terms_aggregation
        };

        aggregations.insert(field.to_string(), aggregation);
    }

    if aggregations.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Value::Object(aggregations)))
    }
}

/// The filter built from every post-filter parameter except the facet's own,
/// or `None` when no other facet has an active filter.
fn sibling_filter(
    mapper: &FieldMapper,
    grouped: &GroupedParams,
    facet: litsearch_api::LiteratureSearchParameter,
) -> Result<Option<Value>, RequestError> {
    let mut clauses = Vec::new();
    for (param, values) in &grouped.post_filter_params {
        if *param == facet {
            continue;
        }
        if let Some(clause) = filters::clause_for_param(mapper, *param, values)? {
            clauses.push(clause);
        }
    }

    if clauses.is_empty() {
        Ok(None)
    } else {
        Ok(Some(json!({ "bool": { "filter": clauses } })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litsearch_api::LiteratureSearchParameter;

    fn mapper() -> FieldMapper {
        FieldMapper::new().unwrap()
    }

    fn grouped(request: &LiteratureSearchRequest) -> GroupedParams {
        crate::query::builder::group_parameters(request)
    }

    #[test]
    fn no_facets_yields_no_aggregations() {
        let request = LiteratureSearchRequest::default();
        let aggs = build_aggregations(&mapper(), &request, &grouped(&request)).unwrap();
        assert!(aggs.is_none());
    }

    #[test]
    fn size_is_offset_plus_limit_bounded_by_cardinality() {
        let mut request = LiteratureSearchRequest::default();
        request.facets = vec![
            LiteratureSearchParameter::LiteratureType,
            LiteratureSearchParameter::Year,
        ];
        request.facet_offset = Some(10);
        request.facet_limit = Some(40);

        let aggs = build_aggregations(&mapper(), &request, &grouped(&request))
            .unwrap()
            .unwrap();
        // literatureType is capped at its cardinality of 20
        assert_eq!(aggs["literatureType"]["terms"]["size"].as_u64(), Some(20));
        // year has no known cardinality, size stays offset+limit
        assert_eq!(aggs["year"]["terms"]["size"].as_u64(), Some(50));
    }

    #[test]
    fn exceeding_the_ceiling_is_an_error() {
        let mut request = LiteratureSearchRequest::default();
        request.facets = vec![LiteratureSearchParameter::Year];
        request.facet_limit = Some(2_000_000);

        let err = build_aggregations(&mapper(), &request, &grouped(&request)).unwrap_err();
        assert!(matches!(err, RequestError::AggregationTooLarge { .. }));
    }

    #[test]
    fn min_count_is_forwarded() {
        let mut request = LiteratureSearchRequest::default();
        request.facets = vec![LiteratureSearchParameter::Topics];
        request.facet_min_count = Some(5);

        let aggs = build_aggregations(&mapper(), &request, &grouped(&request))
            .unwrap()
            .unwrap();
        assert_eq!(
            aggs["topics"]["terms"]["min_doc_count"].as_u64(),
            Some(5)
        );
    }

    #[test]
    fn multi_select_excludes_a_facets_own_filter() {
        let mut request = LiteratureSearchRequest::default();
        request.multi_select_facets = true;
        request.facets = vec![
            LiteratureSearchParameter::LiteratureType,
            LiteratureSearchParameter::Topics,
        ];
        request.add_parameter(LiteratureSearchParameter::LiteratureType, "journal");
        request.add_parameter(LiteratureSearchParameter::Topics, "MARINE");

        let aggs = build_aggregations(&mapper(), &request, &grouped(&request))
            .unwrap()
            .unwrap();

        // literatureType's aggregation filters on topics, not on itself
        let lt = serde_json::to_string(&aggs["literatureType"]).unwrap();
        assert!(lt.contains("\"topics\""));
        assert!(!lt.contains("\"literatureType\":\"journal\""));
        assert!(lt.contains(INNER_AGGREGATION));

        // and symmetrically for topics
        let topics = serde_json::to_string(&aggs["topics"]).unwrap();
        assert!(topics.contains("\"literatureType\""));
        assert!(!topics.contains("MARINE\""));
    }

    #[test]
    fn single_facet_skips_the_filter_wrapper() {
        let mut request = LiteratureSearchRequest::default();
        request.multi_select_facets = true;
        request.facets = vec![LiteratureSearchParameter::Topics];
        request.add_parameter(LiteratureSearchParameter::Topics, "MARINE");

        let aggs = build_aggregations(&mapper(), &request, &grouped(&request))
            .unwrap()
            .unwrap();
        assert!(aggs["topics"].get("terms").is_some());
        assert!(aggs["topics"].get("filter").is_none());
    }

    #[test]
    fn multi_select_without_sibling_filters_falls_back_to_plain_terms() {
        let mut request = LiteratureSearchRequest::default();
        request.multi_select_facets = true;
        request.facets = vec![
            LiteratureSearchParameter::LiteratureType,
            LiteratureSearchParameter::Topics,
        ];
        // only literatureType is filtered, so topics gets the wrapper but
        // literatureType has no sibling filter to apply
        request.add_parameter(LiteratureSearchParameter::LiteratureType, "journal");

        let aggs = build_aggregations(&mapper(), &request, &grouped(&request))
            .unwrap()
            .unwrap();
        assert!(aggs["literatureType"].get("terms").is_some());
        assert!(aggs["topics"].get("filter").is_some());
    }
}
