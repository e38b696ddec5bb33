//! Search parameters and their value kinds.
//!
//! Every parameter carries a closed [`ValueKind`] tag describing how its raw
//! request values are coerced before they reach the query compiler. The query
//! layer matches on the tag; there is no runtime type inspection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How raw request values for a parameter are coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Passed through as a literal string.
    String,
    /// Parsed as `true`/`false`, case-insensitive, indexed lowercase.
    Boolean,
    /// Parsed as a signed integer; also supports `low,high` ranges.
    Integer,
    /// Parsed as a date; also supports `low,high` ranges.
    Date,
    /// Parsed as a UUID, indexed in hyphenated lowercase form.
    Uuid,
    /// Looked up as an ISO 3166-1 alpha-2 country code.
    Country,
    /// Looked up as an ISO 639 language code, indexed as 639-3.
    Language,
    /// Looked up in one of the closed vocabularies.
    Enum(EnumKind),
}

/// Which closed vocabulary an [`ValueKind::Enum`] parameter uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumKind {
    LiteratureType,
    Topic,
    Relevance,
}

/// A filterable (and facetable) dimension of the literature index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LiteratureSearchParameter {
    CountriesOfResearcher,
    CountriesOfCoverage,
    LiteratureType,
    Relevance,
    Year,
    Topics,
    DatasetKey,
    PublishingOrganizationKey,
    PeerReview,
    OpenAccess,
    DownloadKey,
    Doi,
    Source,
    Publisher,
    Language,
    Added,
}

impl LiteratureSearchParameter {
    /// All parameters, in declaration order.
    pub const ALL: &'static [LiteratureSearchParameter] = &[
        LiteratureSearchParameter::CountriesOfResearcher,
        LiteratureSearchParameter::CountriesOfCoverage,
        LiteratureSearchParameter::LiteratureType,
        LiteratureSearchParameter::Relevance,
        LiteratureSearchParameter::Year,
        LiteratureSearchParameter::Topics,
        LiteratureSearchParameter::DatasetKey,
        LiteratureSearchParameter::PublishingOrganizationKey,
        LiteratureSearchParameter::PeerReview,
        LiteratureSearchParameter::OpenAccess,
        LiteratureSearchParameter::DownloadKey,
        LiteratureSearchParameter::Doi,
        LiteratureSearchParameter::Source,
        LiteratureSearchParameter::Publisher,
        LiteratureSearchParameter::Language,
        LiteratureSearchParameter::Added,
    ];

    /// The value kind raw request values are coerced to.
    pub fn value_kind(&self) -> ValueKind {
        match self {
            LiteratureSearchParameter::CountriesOfResearcher
            | LiteratureSearchParameter::CountriesOfCoverage => ValueKind::Country,
            LiteratureSearchParameter::LiteratureType => {
                ValueKind::Enum(EnumKind::LiteratureType)
            }
            LiteratureSearchParameter::Relevance => ValueKind::Enum(EnumKind::Relevance),
            LiteratureSearchParameter::Topics => ValueKind::Enum(EnumKind::Topic),
            LiteratureSearchParameter::Year => ValueKind::Integer,
            LiteratureSearchParameter::DatasetKey
            | LiteratureSearchParameter::PublishingOrganizationKey => ValueKind::Uuid,
            LiteratureSearchParameter::PeerReview | LiteratureSearchParameter::OpenAccess => {
                ValueKind::Boolean
            }
            LiteratureSearchParameter::DownloadKey
            | LiteratureSearchParameter::Doi
            | LiteratureSearchParameter::Source
            | LiteratureSearchParameter::Publisher => ValueKind::String,
            LiteratureSearchParameter::Language => ValueKind::Language,
            LiteratureSearchParameter::Added => ValueKind::Date,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            LiteratureSearchParameter::CountriesOfResearcher => "countriesOfResearcher",
            LiteratureSearchParameter::CountriesOfCoverage => "countriesOfCoverage",
            LiteratureSearchParameter::LiteratureType => "literatureType",
            LiteratureSearchParameter::Relevance => "relevance",
            LiteratureSearchParameter::Year => "year",
            LiteratureSearchParameter::Topics => "topics",
            LiteratureSearchParameter::DatasetKey => "datasetKey",
            LiteratureSearchParameter::PublishingOrganizationKey => "publishingOrganizationKey",
            LiteratureSearchParameter::PeerReview => "peerReview",
            LiteratureSearchParameter::OpenAccess => "openAccess",
            LiteratureSearchParameter::DownloadKey => "downloadKey",
            LiteratureSearchParameter::Doi => "doi",
            LiteratureSearchParameter::Source => "source",
            LiteratureSearchParameter::Publisher => "publisher",
            LiteratureSearchParameter::Language => "language",
            LiteratureSearchParameter::Added => "added",
        }
    }
}

impl fmt::Display for LiteratureSearchParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LiteratureSearchParameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        LiteratureSearchParameter::ALL
            .iter()
            .find(|p| p.name().to_ascii_lowercase() == folded)
            .copied()
            .ok_or_else(|| format!("unknown search parameter: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_and_snake_case() {
        assert_eq!(
            "countriesOfResearcher"
                .parse::<LiteratureSearchParameter>()
                .unwrap(),
            LiteratureSearchParameter::CountriesOfResearcher
        );
        assert_eq!(
            "PEER_REVIEW".parse::<LiteratureSearchParameter>().unwrap(),
            LiteratureSearchParameter::PeerReview
        );
        assert!("sort".parse::<LiteratureSearchParameter>().is_err());
    }

    #[test]
    fn every_parameter_has_a_value_kind() {
        for param in LiteratureSearchParameter::ALL {
            // match must be exhaustive, this just exercises each arm
            let _ = param.value_kind();
        }
    }

    #[test]
    fn display_roundtrips() {
        for param in LiteratureSearchParameter::ALL {
            let parsed: LiteratureSearchParameter = param.to_string().parse().unwrap();
            assert_eq!(parsed, *param);
        }
    }
}
