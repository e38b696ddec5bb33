//! Closed vocabularies and validated code types.
//!
//! The enum vocabularies parse case-insensitively (the HTTP layer passes raw
//! query-string values through) and expose the exact token stored in the
//! search index via [`as_str`](LiteratureType::as_str). [`Country`] and
//! [`Language`] are validated code newtypes rather than exhaustive enums:
//! the index stores ISO 3166-1 alpha-2 and ISO 639-3 codes, and values that
//! do not look like such codes fail coercion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Normalizes a raw vocabulary token for lookup: uppercased, with spaces and
/// hyphens folded to underscores.
fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

macro_rules! vocabulary {
    ($(#[$doc:meta])* $name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $(#[allow(missing_docs)] $variant,)+
        }

        impl $name {
            /// The token stored in the search index for this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = normalize(s);
                let token = normalized.as_str();
                $(
                    if token == normalize($token) {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!("unknown {} value: {}", stringify!($name), s))
            }
        }
    };
}

vocabulary! {
    /// The publication type of a literature item.
    LiteratureType {
        Journal => "journal",
        Book => "book",
        Generic => "generic",
        BookSection => "book_section",
        ConferenceProceedings => "conference_proceedings",
        WorkingPaper => "working_paper",
        Report => "report",
        WebPage => "web_page",
        Thesis => "thesis",
        MagazineArticle => "magazine_article",
        Statute => "statute",
        Patent => "patent",
        NewspaperArticle => "newspaper_article",
        ComputerProgram => "computer_program",
        Hearing => "hearing",
        TelevisionBroadcast => "television_broadcast",
        EncyclopediaArticle => "encyclopedia_article",
        Case => "case",
        Film => "film",
        Bill => "bill",
    }
}

vocabulary! {
    /// Subject area a literature item is tagged with.
    Topic {
        Agriculture => "AGRICULTURE",
        BiodiversityScience => "BIODIVERSITY_SCIENCE",
        Biogeography => "BIOGEOGRAPHY",
        CitizenScience => "CITIZEN_SCIENCE",
        ClimateChange => "CLIMATE_CHANGE",
        Conservation => "CONSERVATION",
        DataManagement => "DATA_MANAGEMENT",
        DataPaper => "DATA_PAPER",
        Ecology => "ECOLOGY",
        EcosystemServices => "ECOSYSTEM_SERVICES",
        Evolution => "EVOLUTION",
        Freshwater => "FRESHWATER",
        HumanHealth => "HUMAN_HEALTH",
        Invasives => "INVASIVES",
        Marine => "MARINE",
        Phylogenetics => "PHYLOGENETICS",
        SpeciesDistributions => "SPECIES_DISTRIBUTIONS",
        Taxonomy => "TAXONOMY",
    }
}

vocabulary! {
    /// How mediated data was used by a publication.
    Relevance {
        Used => "USED",
        Cited => "CITED",
        Discussed => "DISCUSSED",
        Primary => "PRIMARY",
        Recommended => "RECOMMENDED",
        Mentioned => "MENTIONED",
        Published => "PUBLISHED",
        Acknowledged => "ACKNOWLEDGED",
    }
}

vocabulary! {
    /// Continental region grouping of countries.
    Region {
        Africa => "AFRICA",
        Asia => "ASIA",
        Europe => "EUROPE",
        NorthAmerica => "NORTH_AMERICA",
        Oceania => "OCEANIA",
        LatinAmerica => "LATIN_AMERICA",
        Antarctica => "ANTARCTICA",
    }
}

/// An ISO 3166-1 alpha-2 country code, stored uppercase.
///
/// The index holds alpha-2 codes; anything that is not two ASCII letters
/// fails to parse and is dropped by the permissive coercion policy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Country(String);

impl Country {
    /// The uppercase alpha-2 code.
    pub fn iso2(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Country(code.to_ascii_uppercase()))
        } else {
            Err(format!("not an ISO 3166-1 alpha-2 code: {}", s))
        }
    }
}

impl TryFrom<String> for Country {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Country> for String {
    fn from(value: Country) -> Self {
        value.0
    }
}

/// Two-letter ISO 639-1 aliases for the languages that actually occur in the
/// corpus; everything else must arrive as a three-letter 639-3 code.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("ar", "ara"),
    ("cs", "ces"),
    ("da", "dan"),
    ("de", "deu"),
    ("en", "eng"),
    ("es", "spa"),
    ("fi", "fin"),
    ("fr", "fra"),
    ("it", "ita"),
    ("ja", "jpn"),
    ("ko", "kor"),
    ("nl", "nld"),
    ("no", "nor"),
    ("pl", "pol"),
    ("pt", "por"),
    ("ru", "rus"),
    ("sv", "swe"),
    ("tr", "tur"),
    ("uk", "ukr"),
    ("zh", "zho"),
];

/// An ISO 639 language code, normalized to the lowercase three-letter form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    /// The lowercase 639-3 code.
    pub fn iso3(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        if !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(format!("not an ISO 639 code: {}", s));
        }
        match code.len() {
            3 => Ok(Language(code)),
            2 => LANGUAGE_ALIASES
                .iter()
                .find(|(alias, _)| *alias == code)
                .map(|(_, iso3)| Language((*iso3).to_string()))
                .ok_or_else(|| format!("unknown two-letter language code: {}", s)),
            _ => Err(format!("not an ISO 639 code: {}", s)),
        }
    }
}

impl TryFrom<String> for Language {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literature_type_parses_case_insensitively() {
        assert_eq!(
            "JOURNAL".parse::<LiteratureType>().unwrap(),
            LiteratureType::Journal
        );
        assert_eq!(
            "book_section".parse::<LiteratureType>().unwrap(),
            LiteratureType::BookSection
        );
        assert_eq!(
            "Conference-Proceedings".parse::<LiteratureType>().unwrap(),
            LiteratureType::ConferenceProceedings
        );
        assert!("sonnet".parse::<LiteratureType>().is_err());
    }

    #[test]
    fn topic_roundtrips_index_token() {
        let topic: Topic = "citizen_science".parse().unwrap();
        assert_eq!(topic.as_str(), "CITIZEN_SCIENCE");
        assert_eq!(topic.as_str().parse::<Topic>().unwrap(), topic);
    }

    #[test]
    fn country_normalizes_to_uppercase() {
        let dk: Country = "dk".parse().unwrap();
        assert_eq!(dk.iso2(), "DK");
        assert!("Denmark".parse::<Country>().is_err());
        assert!("d1".parse::<Country>().is_err());
    }

    #[test]
    fn language_accepts_both_code_lengths() {
        assert_eq!("ENG".parse::<Language>().unwrap().iso3(), "eng");
        assert_eq!("en".parse::<Language>().unwrap().iso3(), "eng");
        assert!("xq".parse::<Language>().is_err());
        assert!("english".parse::<Language>().is_err());
    }
}
