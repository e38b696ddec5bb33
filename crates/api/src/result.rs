//! The literature search result record.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::vocabulary::{Country, Language, LiteratureType, Region, Relevance, Topic};

/// A single materialized literature item.
///
/// Every scalar field is optional: the materializer sets only the fields it
/// could extract and coerce, and a mistyped index value leaves its field
/// unset rather than failing the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiteratureSearchResult {
    pub id: Option<Uuid>,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    /// Author records as the index stores them (first/last name, affiliation).
    pub authors: Vec<Map<String, Value>>,
    /// External identifiers (doi, isbn, ...) keyed by scheme.
    pub identifiers: Map<String, Value>,
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
    pub websites: Vec<String>,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub day: Option<i32>,
    pub created: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub accessed: Option<String>,
    pub language: Option<Language>,
    pub country: Option<Country>,
    pub countries_of_researcher: BTreeSet<Country>,
    pub countries_of_coverage: BTreeSet<Country>,
    pub regions: BTreeSet<Region>,
    pub topics: BTreeSet<Topic>,
    pub relevance: BTreeSet<Relevance>,
    pub literature_type: Option<LiteratureType>,
    pub source: Option<String>,
    pub publisher: Option<String>,
    pub notes: Option<String>,
    pub content_type: Option<String>,
    pub user_context: Option<String>,
    pub dataset_key: Vec<Uuid>,
    pub publishing_organization_key: Vec<Uuid>,
    pub download_key: Vec<String>,
    pub profile_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub peer_review: Option<bool>,
    pub open_access: Option<bool>,
    pub authored: Option<bool>,
    pub confirmed: Option<bool>,
    pub read: Option<bool>,
    pub starred: Option<bool>,
    pub searchable: Option<bool>,
    pub file_attached: Option<bool>,
    pub hidden: Option<bool>,
    pub private_publication: Option<bool>,
}
