//! Static knowledge about the literature index.
//!
//! The [`FieldMapper`] owns the bijection between search parameters and index
//! field names, per-field cardinality for the closed vocabularies, the date
//! field set, the stored-field source filter, the default sort, and the
//! full-text relevance query. It is built once at startup from a static
//! table and validated then; a malformed table fails construction, never a
//! query.

use std::collections::HashMap;

use serde_json::{json, Value};

use litsearch_api::LiteratureSearchParameter;

use crate::error::ConfigError;

/// One row of the parameter-to-field table: parameter, index field, and the
/// field's value cardinality where the vocabulary is closed.
type FieldRow = (LiteratureSearchParameter, &'static str, Option<u32>);

const FIELD_TABLE: &[FieldRow] = &[
    (
        LiteratureSearchParameter::CountriesOfResearcher,
        "countriesOfResearcher",
        Some(250),
    ),
    (
        LiteratureSearchParameter::CountriesOfCoverage,
        "countriesOfCoverage",
        Some(250),
    ),
    (
        LiteratureSearchParameter::LiteratureType,
        "literatureType",
        Some(20),
    ),
    (LiteratureSearchParameter::Relevance, "relevance", Some(8)),
    (LiteratureSearchParameter::Year, "year", None),
    (LiteratureSearchParameter::Topics, "topics", Some(18)),
    (LiteratureSearchParameter::DatasetKey, "datasetKey", None),
    (
        LiteratureSearchParameter::PublishingOrganizationKey,
        "publishingOrganizationKey",
        None,
    ),
    (LiteratureSearchParameter::PeerReview, "peerReview", Some(2)),
    (LiteratureSearchParameter::OpenAccess, "openAccess", Some(2)),
    (LiteratureSearchParameter::DownloadKey, "downloadKey", None),
    (LiteratureSearchParameter::Doi, "identifiers.doi", None),
    (LiteratureSearchParameter::Source, "source", None),
    (LiteratureSearchParameter::Publisher, "publisher", None),
    (LiteratureSearchParameter::Language, "language", Some(250)),
    (LiteratureSearchParameter::Added, "createdAt", None),
];

/// Fields holding dates, compiled to date range queries.
const DATE_FIELDS: &[&str] = &["created", "createdAt", "updatedAt", "accessed"];

/// The catch-all full-text field is index-only and never returned.
const EXCLUDE_FIELDS: &[&str] = &["all"];

/// Stored fields fetched for each hit.
const SOURCE_FIELDS: &[&str] = &[
    "id",
    "title",
    "abstract",
    "authors",
    "identifiers",
    "keywords",
    "tags",
    "websites",
    "year",
    "month",
    "day",
    "created",
    "createdAt",
    "updatedAt",
    "accessed",
    "language",
    "country",
    "countriesOfResearcher",
    "countriesOfCoverage",
    "region",
    "topics",
    "relevance",
    "literatureType",
    "source",
    "publisher",
    "notes",
    "contentType",
    "userContext",
    "datasetKey",
    "publishingOrganizationKey",
    "downloadKey",
    "profileId",
    "groupId",
    "peerReview",
    "openAccess",
    "authored",
    "confirmed",
    "read",
    "starred",
    "searchable",
    "fileAttached",
    "hidden",
    "privatePublication",
];

/// Bijective parameter/field mapping plus per-field index metadata.
pub struct FieldMapper {
    to_field: HashMap<LiteratureSearchParameter, &'static str>,
    to_param: HashMap<&'static str, LiteratureSearchParameter>,
    cardinality: HashMap<&'static str, u32>,
}

impl FieldMapper {
    /// Builds the mapper from the static table, rejecting duplicate
    /// parameters or field names.
    pub fn new() -> Result<Self, ConfigError> {
        let mut to_field = HashMap::with_capacity(FIELD_TABLE.len());
        let mut to_param = HashMap::with_capacity(FIELD_TABLE.len());
        let mut cardinality = HashMap::new();

        for (param, field, card) in FIELD_TABLE {
            if to_field.insert(*param, *field).is_some() {
                return Err(ConfigError::FieldTable {
                    message: format!("duplicate parameter: {}", param),
                });
            }
            if to_param.insert(*field, *param).is_some() {
                return Err(ConfigError::FieldTable {
                    message: format!("duplicate field name: {}", field),
                });
            }
            if let Some(card) = card {
                cardinality.insert(*field, *card);
            }
        }

        Ok(Self {
            to_field,
            to_param,
            cardinality,
        })
    }

    /// The index field a parameter filters on, if the parameter is mapped.
    pub fn field_for(&self, param: LiteratureSearchParameter) -> Option<&'static str> {
        self.to_field.get(&param).copied()
    }

    /// The parameter a field name maps back to. Total on the mapped subset.
    pub fn param_for(&self, field: &str) -> Option<LiteratureSearchParameter> {
        self.to_param.get(field).copied()
    }

    /// Distinct-value bound for a field, where the vocabulary is closed.
    pub fn cardinality(&self, field: &str) -> Option<u32> {
        self.cardinality.get(field).copied()
    }

    /// Whether the field holds dates.
    pub fn is_date_field(&self, field: &str) -> bool {
        DATE_FIELDS.contains(&field)
    }

    /// Stored fields to fetch for each hit.
    pub fn source_includes(&self) -> &'static [&'static str] {
        SOURCE_FIELDS
    }

    /// Stored fields never returned.
    pub fn source_excludes(&self) -> &'static [&'static str] {
        EXCLUDE_FIELDS
    }

    /// Default sort: relevance, then newest first, with the document id as
    /// the tie-breaker required by search-after pagination.
    pub fn default_sort(&self) -> Value {
        json!([
            { "_score": { "order": "desc" } },
            { "createdAt": { "order": "desc" } },
            { "id": { "order": "asc" } }
        ])
    }

    /// The full-text relevance query for a free-text term: a match against
    /// the catch-all field, with phrase boosts on title and abstract.
    pub fn full_text_query(&self, q: &str) -> Value {
        json!({
            "bool": {
                "must": [
                    {
                        "match": {
                            "all": {
                                "query": q,
                                "operator": "and"
                            }
                        }
                    }
                ],
                "should": [
                    { "match_phrase": { "title": { "query": q, "boost": 10.0 } } },
                    { "match_phrase": { "abstract": { "query": q, "boost": 3.0 } } }
                ]
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_is_bijective() {
        let mapper = FieldMapper::new().unwrap();
        for (param, field, _) in FIELD_TABLE {
            assert_eq!(mapper.field_for(*param), Some(*field));
            assert_eq!(mapper.param_for(field), Some(*param));
        }
    }

    #[test]
    fn every_parameter_is_mapped() {
        let mapper = FieldMapper::new().unwrap();
        for param in LiteratureSearchParameter::ALL {
            assert!(
                mapper.field_for(*param).is_some(),
                "unmapped parameter: {}",
                param
            );
        }
    }

    #[test]
    fn cardinality_only_for_closed_vocabularies() {
        let mapper = FieldMapper::new().unwrap();
        assert_eq!(mapper.cardinality("literatureType"), Some(20));
        assert_eq!(mapper.cardinality("peerReview"), Some(2));
        assert_eq!(mapper.cardinality("year"), None);
        assert_eq!(mapper.cardinality("identifiers.doi"), None);
    }

    #[test]
    fn date_fields() {
        let mapper = FieldMapper::new().unwrap();
        assert!(mapper.is_date_field("createdAt"));
        assert!(!mapper.is_date_field("year"));
    }

    #[test]
    fn full_text_query_hits_the_catch_all_field() {
        let mapper = FieldMapper::new().unwrap();
        let query = serde_json::to_string(&mapper.full_text_query("tapir")).unwrap();
        assert!(query.contains("\"all\""));
        assert!(query.contains("match_phrase"));
        assert!(query.contains("tapir"));
    }

    #[test]
    fn default_sort_ends_with_the_tie_breaker() {
        let mapper = FieldMapper::new().unwrap();
        let sort = mapper.default_sort();
        let last = sort.as_array().unwrap().last().unwrap();
        assert_eq!(last["id"]["order"].as_str(), Some("asc"));
    }
}
