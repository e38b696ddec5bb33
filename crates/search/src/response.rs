//! Response materialization.
//!
//! [`ResponseReader`] turns raw backend hits into
//! [`LiteratureSearchResult`] records and aggregation sections into
//! [`Facet`] counts. Extraction is fault-isolated per field: a value of the
//! wrong type drops that field with a diagnostic, never the record and
//! never the request.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::{Map, Value};
use uuid::Uuid;

use litsearch_api::{
    Country, Facet, FacetCount, Language, LiteratureSearchRequest, LiteratureSearchResult,
    LiteratureType, Region, Relevance, SearchResponse, Topic,
};

use crate::error::{ConfigError, SearchError, SearchResult};
use crate::mapper::FieldMapper;
use crate::query::INNER_AGGREGATION;

/// Field names containing a dot are paths into sub-documents.
const NESTED_FIELD_PATTERN: &str = r"^\w+(\.\w+)+$";

/// Reads backend response bodies into the result model.
#[derive(Clone)]
pub struct ResponseReader {
    nested: Regex,
}

impl ResponseReader {
    pub fn new() -> Result<Self, ConfigError> {
        let nested =
            Regex::new(NESTED_FIELD_PATTERN).map_err(|e| ConfigError::ResponsePattern {
                message: e.to_string(),
            })?;
        Ok(Self { nested })
    }

    /// Reads a full paged search response. `reported_offset` is the offset
    /// the caller asked for, which the service may have clamped before the
    /// backend call.
    pub fn read_search_response(
        &self,
        mapper: &FieldMapper,
        request: &LiteratureSearchRequest,
        reported_offset: u64,
        body: &Value,
    ) -> SearchResult<SearchResponse<LiteratureSearchResult>> {
        let count = body["hits"]["total"]["value"]
            .as_u64()
            .ok_or_else(|| SearchError::Response {
                message: "missing hits.total.value".to_string(),
            })?;

        let mut response = SearchResponse::new(reported_offset, request.limit);
        response.count = count;
        response.results = self.read_hits(body)?;
        response.facets = self.parse_facets(mapper, request, body.get("aggregations"));
        response.update_end_of_records();
        Ok(response)
    }

    /// Reads the materialized hits of any search response body.
    pub fn read_hits(&self, body: &Value) -> SearchResult<Vec<LiteratureSearchResult>> {
        let hits = body["hits"]["hits"]
            .as_array()
            .ok_or_else(|| SearchError::Response {
                message: "missing hits.hits".to_string(),
            })?;

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            match hit["_source"].as_object() {
                Some(source) => results.push(self.to_result(source, hit.get("highlight"))),
                None => tracing::debug!("hit without a source document, skipped"),
            }
        }
        Ok(results)
    }

    /// Number of raw hits on a page, before materialization drops any.
    pub fn hit_count(&self, body: &Value) -> usize {
        body["hits"]["hits"].as_array().map_or(0, Vec::len)
    }

    /// Reads a single-document lookup: the first hit, if any.
    pub fn read_get_response(
        &self,
        body: &Value,
    ) -> SearchResult<Option<LiteratureSearchResult>> {
        Ok(self.read_hits(body)?.into_iter().next())
    }

    /// The sort key of the last hit, used to resume a cursor-paged scan.
    pub fn last_sort_values(&self, body: &Value) -> Option<Value> {
        body["hits"]["hits"]
            .as_array()?
            .last()?
            .get("sort")
            .cloned()
    }

    /// Facet counts for every requested facet present in the aggregation
    /// section. Multi-select wrappers are transparent: buckets are taken
    /// from the top level or from the named inner aggregation.
    pub fn parse_facets(
        &self,
        mapper: &FieldMapper,
        request: &LiteratureSearchRequest,
        aggregations: Option<&Value>,
    ) -> Vec<Facet> {
        let aggregations = match aggregations {
            Some(aggs) => aggs,
            None => return Vec::new(),
        };

        let mut facets = Vec::new();
        for facet in &request.facets {
            let field = match mapper.field_for(*facet) {
                Some(field) => field,
                None => continue,
            };
            let aggregation = match aggregations.get(field) {
                Some(agg) => agg,
                None => continue,
            };
            let buckets = aggregation
                .get("buckets")
                .or_else(|| aggregation[INNER_AGGREGATION].get("buckets"))
                .and_then(Value::as_array);
            let buckets = match buckets {
                Some(buckets) => buckets,
                None => continue,
            };

            let offset = request.facet_offset_for(*facet) as usize;
            let limit = request.facet_limit_for(*facet) as usize;
            let counts = buckets
                .iter()
                .skip(offset)
                .take(limit)
                .filter_map(bucket_count)
                .collect();

            facets.push(Facet {
                field: *facet,
                counts,
            });
        }
        facets
    }

    /// Materializes one source document, substituting highlighted fragments
    /// where present.
    pub fn to_result(
        &self,
        source: &Map<String, Value>,
        highlight: Option<&Value>,
    ) -> LiteratureSearchResult {
        let mut result = LiteratureSearchResult::default();

        result.id = self.uuid_field(source, "id");
        result.title = self.string_field(source, "title");
        result.abstract_text = self.string_field(source, "abstract");
        if let Some(highlight) = highlight {
            if let Some(fragment) = first_fragment(highlight, "title") {
                result.title = Some(fragment);
            }
            if let Some(fragment) = first_fragment(highlight, "abstract") {
                result.abstract_text = Some(fragment);
            }
        }

        result.authors = self.object_array_field(source, "authors");
        result.identifiers = self.object_field(source, "identifiers");
        result.keywords = self.string_array_field(source, "keywords");
        result.tags = self.string_array_field(source, "tags");
        result.websites = self.string_array_field(source, "websites");

        result.year = self.int_field(source, "year");
        result.month = self.int_field(source, "month");
        result.day = self.int_field(source, "day");
        result.created = self.date_field(source, "created");
        result.created_at = self.date_field(source, "createdAt");
        result.updated_at = self.date_field(source, "updatedAt");
        result.accessed = self.string_field(source, "accessed");

        result.language = self.parsed_field::<Language>(source, "language");
        result.country = self.parsed_field::<Country>(source, "country");
        result.countries_of_researcher =
            self.parsed_set_field::<Country>(source, "countriesOfResearcher");
        result.countries_of_coverage =
            self.parsed_set_field::<Country>(source, "countriesOfCoverage");
        result.regions = self.parsed_set_field::<Region>(source, "region");
        result.topics = self.parsed_set_field::<Topic>(source, "topics");
        result.relevance = self.parsed_set_field::<Relevance>(source, "relevance");
        result.literature_type = self.parsed_field::<LiteratureType>(source, "literatureType");

        result.source = self.string_field(source, "source");
        result.publisher = self.string_field(source, "publisher");
        result.notes = self.string_field(source, "notes");
        result.content_type = self.string_field(source, "contentType");
        result.user_context = self.string_field(source, "userContext");

        result.dataset_key = self.uuid_array_field(source, "datasetKey");
        result.publishing_organization_key =
            self.uuid_array_field(source, "publishingOrganizationKey");
        result.download_key = self.string_array_field(source, "downloadKey");
        result.profile_id = self.uuid_field(source, "profileId");
        result.group_id = self.uuid_field(source, "groupId");

        result.peer_review = self.bool_field(source, "peerReview");
        result.open_access = self.bool_field(source, "openAccess");
        result.authored = self.bool_field(source, "authored");
        result.confirmed = self.bool_field(source, "confirmed");
        result.read = self.bool_field(source, "read");
        result.starred = self.bool_field(source, "starred");
        result.searchable = self.bool_field(source, "searchable");
        result.file_attached = self.bool_field(source, "fileAttached");
        result.hidden = self.bool_field(source, "hidden");
        result.private_publication = self.bool_field(source, "privatePublication");

        result
    }

    /// Resolves a field, descending into sub-documents for dotted paths.
    fn value<'a>(&self, source: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
        if self.nested.is_match(field) {
            let mut parts = field.split('.');
            let mut current = source.get(parts.next()?)?;
            for part in parts {
                current = current.get(part)?;
            }
            Some(current)
        } else {
            source.get(field)
        }
    }

    fn string_field(&self, source: &Map<String, Value>, field: &str) -> Option<String> {
        match self.value(source, field)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => drop_field(field, other),
        }
    }

    fn int_field(&self, source: &Map<String, Value>, field: &str) -> Option<i32> {
        match self.value(source, field)? {
            Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
            Value::String(s) => s.parse().ok().or_else(|| drop_field(field, s)),
            Value::Null => None,
            other => drop_field(field, other),
        }
    }

    fn bool_field(&self, source: &Map<String, Value>, field: &str) -> Option<bool> {
        match self.value(source, field)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => drop_field(field, s),
            },
            Value::Null => None,
            other => drop_field(field, other),
        }
    }

    fn uuid_field(&self, source: &Map<String, Value>, field: &str) -> Option<Uuid> {
        let raw = self.string_field(source, field)?;
        Uuid::parse_str(&raw).ok().or_else(|| drop_field(field, &raw))
    }

    fn date_field(&self, source: &Map<String, Value>, field: &str) -> Option<DateTime<Utc>> {
        let raw = self.string_field(source, field)?;
        parse_date(&raw).or_else(|| drop_field(field, &raw))
    }

    fn parsed_field<T: std::str::FromStr>(
        &self,
        source: &Map<String, Value>,
        field: &str,
    ) -> Option<T> {
        let raw = self.string_field(source, field)?;
        raw.parse().ok().or_else(|| drop_field(field, &raw))
    }

    fn string_array_field(&self, source: &Map<String, Value>, field: &str) -> Vec<String> {
        self.array_field(source, field, |element| match element {
            Value::String(s) => Some(s.clone()),
            other => drop_field(field, other),
        })
    }

    fn uuid_array_field(&self, source: &Map<String, Value>, field: &str) -> Vec<Uuid> {
        self.array_field(source, field, |element| {
            element
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .or_else(|| drop_field(field, element))
        })
    }

    fn object_array_field(
        &self,
        source: &Map<String, Value>,
        field: &str,
    ) -> Vec<Map<String, Value>> {
        self.array_field(source, field, |element| match element {
            Value::Object(map) => Some(map.clone()),
            other => drop_field(field, other),
        })
    }

    fn parsed_set_field<T: std::str::FromStr + Ord>(
        &self,
        source: &Map<String, Value>,
        field: &str,
    ) -> std::collections::BTreeSet<T> {
        self.array_field(source, field, |element| {
            element
                .as_str()
                .and_then(|s| s.parse().ok())
                .or_else(|| drop_field(field, element))
        })
        .into_iter()
        .collect()
    }

    fn array_field<T, F>(&self, source: &Map<String, Value>, field: &str, extract: F) -> Vec<T>
    where
        F: Fn(&Value) -> Option<T>,
    {
        match self.value(source, field) {
            Some(Value::Array(elements)) => elements.iter().filter_map(extract).collect(),
            // single values appear unwrapped for single-element arrays
            Some(value @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => {
                extract(value).into_iter().collect()
            }
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                drop_field::<(), _>(field, other);
                Vec::new()
            }
        }
    }

    fn object_field(&self, source: &Map<String, Value>, field: &str) -> Map<String, Value> {
        match self.value(source, field) {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(other) => {
                drop_field::<(), _>(field, other);
                Map::new()
            }
        }
    }
}

/// Logs a dropped field and yields `None`; extraction stays total.
fn drop_field<T, V: std::fmt::Debug>(field: &str, value: V) -> Option<T> {
    tracing::debug!(field, ?value, "unexpected value shape, field dropped");
    None
}

fn first_fragment(highlight: &Value, field: &str) -> Option<String> {
    highlight[field][0].as_str().map(ToString::to_string)
}

fn bucket_count(bucket: &Value) -> Option<FacetCount> {
    let name = match bucket.get("key_as_string") {
        Some(Value::String(s)) => s.clone(),
        _ => match bucket.get("key")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        },
    };
    Some(FacetCount {
        name,
        count: bucket["doc_count"].as_u64()?,
    })
}

/// Parses an indexed date at any of its stored precisions. A `0000` year
/// segment is an unknown-year sentinel and normalizes to year 1.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix("0000") {
        return parse_date(&format!("0001{}", rest));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    if raw.len() == 4 {
        if let Ok(year) = raw.parse::<i32>() {
            return NaiveDate::from_ymd_opt(year, 1, 1)
                .map(|d| d.and_hms_opt(0, 0, 0))?
                .map(|dt| dt.and_utc());
        }
    }
    None
}
