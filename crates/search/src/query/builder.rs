//! Search request assembly.
//!
//! Turns a [`LiteratureSearchRequest`] into the JSON body the backend
//! executes. Parameter clauses come from [`filters`], the facet section from
//! [`aggregations`]; this module owns the grouping of parameters into query
//! versus post-filter, the page window, sorting, source filtering, and
//! highlighting.

use std::collections::{BTreeSet, HashMap};

use serde_json::{json, Value};

use litsearch_api::{LiteratureSearchParameter, LiteratureSearchRequest, QUERY_WILDCARD};

use crate::error::RequestError;
use crate::mapper::FieldMapper;
use crate::query::{aggregations, filters};

/// Highlighted fragments are wrapped in these tags so clients can style them.
const HIGHLIGHT_PRE_TAG: &str = "<em class=\"gbifHl\">";
const HIGHLIGHT_POST_TAG: &str = "</em>";

/// Fields eligible for highlighting.
const HIGHLIGHT_FIELDS: &[&str] = &["title", "abstract"];

/// Parameters split by where their filter applies.
///
/// Under multi-select faceting, a parameter that is also a requested facet
/// moves to the post-filter so its own selection narrows the hits but not
/// the facet counts. Otherwise everything filters the query directly.
#[derive(Debug, Default)]
pub struct GroupedParams {
    /// Parameters filtering both hits and facet counts.
    pub query_params: HashMap<LiteratureSearchParameter, BTreeSet<String>>,
    /// Parameters filtering hits only, applied after aggregation.
    pub post_filter_params: HashMap<LiteratureSearchParameter, BTreeSet<String>>,
}

/// Partitions the request's parameters. The split depends only on the facet
/// list and the multi-select flag, so regrouping an already-grouped request
/// is a no-op.
pub fn group_parameters(request: &LiteratureSearchRequest) -> GroupedParams {
    let mut grouped = GroupedParams::default();
    let multi_select = request.multi_select_facets && !request.facets.is_empty();

    for (param, values) in &request.parameters {
        if values.is_empty() {
            continue;
        }
        if multi_select && request.facets.contains(param) {
            grouped
                .post_filter_params
                .insert(*param, values.clone());
        } else {
            grouped.query_params.insert(*param, values.clone());
        }
    }

    grouped
}

/// Builds full search request bodies against a fixed field mapping.
pub struct SearchRequestBuilder {
    mapper: FieldMapper,
}

impl SearchRequestBuilder {
    pub fn new(mapper: FieldMapper) -> Self {
        Self { mapper }
    }

    pub fn mapper(&self) -> &FieldMapper {
        &self.mapper
    }

    /// The paged search body. `from` is the effective offset after the
    /// caller applied the result-window clamp.
    pub fn build_search(
        &self,
        request: &LiteratureSearchRequest,
        from: u64,
    ) -> Result<Value, RequestError> {
        let grouped = group_parameters(request);

        let mut body = json!({
            "from": from,
            "size": request.limit,
            "track_total_hits": true,
            "sort": self.mapper.default_sort(),
            "_source": {
                "includes": self.mapper.source_includes(),
                "excludes": self.mapper.source_excludes()
            },
            "query": self.build_query(request, &grouped.query_params)?
        });

        let post_filters = filters::clauses_for_params(&self.mapper, &grouped.post_filter_params)?;
        if !post_filters.is_empty() {
            body["post_filter"] = json!({ "bool": { "filter": post_filters } });
        }

        if let Some(aggs) = aggregations::build_aggregations(&self.mapper, request, &grouped)? {
            body["aggs"] = aggs;
        }

        if request.highlight {
            body["highlight"] = self.build_highlight();
        }

        Ok(body)
    }

    /// A single-document lookup by id.
    pub fn build_get_by_id(&self, id: &uuid::Uuid) -> Value {
        json!({
            "size": 1,
            "_source": {
                "includes": self.mapper.source_includes(),
                "excludes": self.mapper.source_excludes()
            },
            "query": { "term": { "id": id.to_string() } }
        })
    }

    /// One page of an export scan: snapshot-pinned, cursor-paged, no counts.
    /// `search_after` is the sort key of the previous page's last hit.
    pub fn build_export_search(
        &self,
        request: &LiteratureSearchRequest,
        pit_id: &str,
        keep_alive: &str,
        search_after: Option<&Value>,
        page_size: u32,
    ) -> Result<Value, RequestError> {
        let grouped = group_parameters(request);

        let mut body = json!({
            "size": page_size,
            "track_total_hits": false,
            "sort": self.mapper.default_sort(),
            "_source": {
                "includes": self.mapper.source_includes(),
                "excludes": self.mapper.source_excludes()
            },
            "query": self.build_query(request, &grouped.query_params)?,
            "pit": { "id": pit_id, "keep_alive": keep_alive }
        });

        // exports ignore the multi-select split, every filter narrows hits
        let post_filters = filters::clauses_for_params(&self.mapper, &grouped.post_filter_params)?;
        if !post_filters.is_empty() {
            body["post_filter"] = json!({ "bool": { "filter": post_filters } });
        }

        if let Some(after) = search_after {
            body["search_after"] = after.clone();
        }

        Ok(body)
    }

    /// The query section: full text plus query-group filters, or match-all
    /// when neither applies.
    fn build_query(
        &self,
        request: &LiteratureSearchRequest,
        query_params: &HashMap<LiteratureSearchParameter, BTreeSet<String>>,
    ) -> Result<Value, RequestError> {
        let full_text = request
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty() && *q != QUERY_WILDCARD)
            .map(|q| self.mapper.full_text_query(q));

        let filter_clauses = filters::clauses_for_params(&self.mapper, query_params)?;

        Ok(match (full_text, filter_clauses.is_empty()) {
            (None, true) => json!({ "match_all": {} }),
            (None, false) => json!({ "bool": { "filter": filter_clauses } }),
            (Some(text), true) => text,
            (Some(text), false) => json!({
                "bool": {
                    "must": [text],
                    "filter": filter_clauses
                }
            }),
        })
    }

    fn build_highlight(&self) -> Value {
        let mut fields = serde_json::Map::new();
        for field in HIGHLIGHT_FIELDS {
            fields.insert(field.to_string(), json!({ "number_of_fragments": 0 }));
        }
        json!({
            "pre_tags": [HIGHLIGHT_PRE_TAG],
            "post_tags": [HIGHLIGHT_POST_TAG],
            "fields": fields
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> SearchRequestBuilder {
        SearchRequestBuilder::new(FieldMapper::new().unwrap())
    }

    #[test]
    fn empty_request_is_match_all() {
        let request = LiteratureSearchRequest::default();
        let body = builder().build_search(&request, 0).unwrap();
        assert!(body["query"]["match_all"].is_object());
        assert_eq!(body["from"].as_u64(), Some(0));
        assert_eq!(body["size"].as_u64(), Some(20));
        assert_eq!(body["track_total_hits"].as_bool(), Some(true));
        assert!(body.get("post_filter").is_none());
        assert!(body.get("aggs").is_none());
        assert!(body.get("highlight").is_none());
    }

    #[test]
    fn wildcard_q_is_match_all() {
        let mut request = LiteratureSearchRequest::default();
        request.q = Some("*".to_string());
        let body = builder().build_search(&request, 0).unwrap();
        assert!(body["query"]["match_all"].is_object());
    }

    #[test]
    fn free_text_with_filters_combines_must_and_filter() {
        let mut request = LiteratureSearchRequest::default();
        request.q = Some("tapir".to_string());
        request.add_parameter(LiteratureSearchParameter::Year, "2020");

        let body = builder().build_search(&request, 0).unwrap();
        let query = serde_json::to_string(&body["query"]).unwrap();
        assert!(query.contains("\"must\""));
        assert!(query.contains("tapir"));
        assert!(query.contains("\"year\":\"2020\""));
    }

    #[test]
    fn grouping_without_multi_select_keeps_everything_in_the_query() {
        let mut request = LiteratureSearchRequest::default();
        request.facets = vec![LiteratureSearchParameter::Topics];
        request.add_parameter(LiteratureSearchParameter::Topics, "MARINE");
        request.add_parameter(LiteratureSearchParameter::Year, "2020");

        let grouped = group_parameters(&request);
        assert_eq!(grouped.query_params.len(), 2);
        assert!(grouped.post_filter_params.is_empty());
    }

    #[test]
    fn multi_select_moves_faceted_parameters_to_the_post_filter() {
        let mut request = LiteratureSearchRequest::default();
        request.multi_select_facets = true;
        request.facets = vec![LiteratureSearchParameter::Topics];
        request.add_parameter(LiteratureSearchParameter::Topics, "MARINE");
        request.add_parameter(LiteratureSearchParameter::Year, "2020");

        let grouped = group_parameters(&request);
        assert!(grouped
            .query_params
            .contains_key(&LiteratureSearchParameter::Year));
        assert!(grouped
            .post_filter_params
            .contains_key(&LiteratureSearchParameter::Topics));

        let body = builder().build_search(&request, 0).unwrap();
        let post = serde_json::to_string(&body["post_filter"]).unwrap();
        assert!(post.contains("MARINE"));
        let query = serde_json::to_string(&body["query"]).unwrap();
        assert!(!query.contains("MARINE"));
    }

    #[test]
    fn grouping_partitions_without_loss() {
        let mut request = LiteratureSearchRequest::default();
        request.multi_select_facets = true;
        request.facets = vec![
            LiteratureSearchParameter::Topics,
            LiteratureSearchParameter::LiteratureType,
        ];
        request.add_parameter(LiteratureSearchParameter::Topics, "MARINE");
        request.add_parameter(LiteratureSearchParameter::Year, "2020");
        request.add_parameter(LiteratureSearchParameter::PeerReview, "true");

        let grouped = group_parameters(&request);
        let total = grouped.query_params.len() + grouped.post_filter_params.len();
        assert_eq!(total, request.parameters.len());
        for param in request.parameters.keys() {
            assert!(
                grouped.query_params.contains_key(param)
                    ^ grouped.post_filter_params.contains_key(param)
            );
        }
    }

    #[test]
    fn highlight_section_when_requested() {
        let mut request = LiteratureSearchRequest::default();
        request.highlight = true;
        let body = builder().build_search(&request, 0).unwrap();
        assert!(body["highlight"]["fields"]["title"].is_object());
        assert!(body["highlight"]["fields"]["abstract"].is_object());
        assert_eq!(
            body["highlight"]["pre_tags"][0].as_str(),
            Some(HIGHLIGHT_PRE_TAG)
        );
    }

    #[test]
    fn get_by_id_is_a_single_term_lookup() {
        let id = uuid::Uuid::nil();
        let body = builder().build_get_by_id(&id);
        assert_eq!(body["size"].as_u64(), Some(1));
        assert_eq!(
            body["query"]["term"]["id"].as_str(),
            Some("00000000-0000-0000-0000-000000000000")
        );
    }

    #[test]
    fn export_body_pins_the_snapshot_and_resumes_the_cursor() {
        let request = LiteratureSearchRequest::default();
        let after = json!([1.0, "2024-01-01T00:00:00", "abc"]);
        let body = builder()
            .build_export_search(&request, "pit-123", "1m", Some(&after), 500)
            .unwrap();
        assert_eq!(body["pit"]["id"].as_str(), Some("pit-123"));
        assert_eq!(body["pit"]["keep_alive"].as_str(), Some("1m"));
        assert_eq!(body["search_after"], after);
        assert_eq!(body["size"].as_u64(), Some(500));
        assert_eq!(body["track_total_hits"].as_bool(), Some(false));
        assert!(body.get("from").is_none());
    }

    #[test]
    fn export_first_page_has_no_cursor() {
        let request = LiteratureSearchRequest::default();
        let body = builder()
            .build_export_search(&request, "pit-123", "1m", None, 500)
            .unwrap();
        assert!(body.get("search_after").is_none());
    }
}
