//! Records produced by a crawl and the inputs that drive it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{CrawlerError, FetchFailure, Result};

/// Kind of GitHub search to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    Repositories,
    Issues,
    Wikis,
}

impl SearchType {
    pub const ALL: [SearchType; 3] = [Self::Repositories, Self::Issues, Self::Wikis];

    /// Canonical value, as typed by the user.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Repositories => "Repositories",
            Self::Issues => "Issues",
            Self::Wikis => "Wikis",
        }
    }

    /// Value sent in the `type` query parameter.
    pub fn query_value(self) -> String {
        self.as_str().to_lowercase()
    }

    /// Only repository hits have a detail page worth fetching.
    pub fn enriches(self) -> bool {
        matches!(self, Self::Repositories)
    }

    /// Comma separated list of the accepted values.
    pub fn options() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = CrawlerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CrawlerError::Config(format!(
                    "Invalid search type: {s}. Available types are: {}",
                    Self::options()
                ))
            })
    }
}

/// What to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keywords: Vec<String>,
    pub search_type: SearchType,
}

impl SearchQuery {
    pub fn new(keywords: Vec<String>, search_type: SearchType) -> Self {
        Self {
            keywords,
            search_type,
        }
    }

    /// Keywords joined the way GitHub's search box joins them.
    pub fn query_string(&self) -> String {
        self.keywords.join("+")
    }
}

/// One entry of a search listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SearchHit {
    pub url: String,
}

/// A repository hit enriched from its detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryDetail {
    pub url: String,
    pub owner: Option<String>,
    pub language_stats: BTreeMap<String, String>,
}

/// One entry of the final output list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SearchRecord {
    Hit(SearchHit),
    Detail(RepositoryDetail),
}

impl SearchRecord {
    pub fn url(&self) -> &str {
        match self {
            Self::Hit(hit) => &hit.url,
            Self::Detail(detail) => &detail.url,
        }
    }
}

/// Where a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// The search page itself could not be fetched.
    SearchFailed,
    /// Search succeeded and no enrichment applies to this search type.
    Searched,
    /// Search succeeded and every hit went through enrichment.
    Enriched,
}

/// Result of one crawl.
///
/// `records` only ever contains pages that were fetched and parsed;
/// `failures` lists the pages that were not, so "zero hits" and "every
/// detail page failed" stay distinguishable.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub phase: RunPhase,
    pub hits_found: usize,
    pub records: Vec<SearchRecord>,
    pub failures: Vec<FetchFailure>,
}

impl SearchOutcome {
    pub(crate) fn search_failed(failure: FetchFailure) -> Self {
        Self {
            phase: RunPhase::SearchFailed,
            hits_found: 0,
            records: Vec::new(),
            failures: vec![failure],
        }
    }

    /// The records as indented JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_every_valid_search_type() {
        for search_type in SearchType::ALL {
            assert_eq!(
                search_type.as_str().parse::<SearchType>().ok(),
                Some(search_type)
            );
        }
    }

    #[test]
    fn rejects_unknown_search_type() {
        for input in ["InvalidType", "repositories", "", " Issues"] {
            let err = input.parse::<SearchType>().unwrap_err();
            assert!(matches!(err, CrawlerError::Config(_)), "{input:?}");
        }
        let err = "Code".parse::<SearchType>().unwrap_err();
        assert!(err.to_string().contains("Repositories, Issues, Wikis"));
    }

    #[test]
    fn query_value_is_lower_cased() {
        assert_eq!(SearchType::Repositories.query_value(), "repositories");
        assert_eq!(SearchType::Wikis.query_value(), "wikis");
    }

    #[test]
    fn only_repositories_enrich() {
        assert!(SearchType::Repositories.enriches());
        assert!(!SearchType::Issues.enriches());
        assert!(!SearchType::Wikis.enriches());
    }

    #[test]
    fn keywords_joined_with_plus() {
        let query = SearchQuery::new(
            vec!["openstack".into(), "nova".into(), "css".into()],
            SearchType::Repositories,
        );
        assert_eq!(query.query_string(), "openstack+nova+css");
    }

    #[test]
    fn outcome_renders_records_as_indented_json() {
        let outcome = SearchOutcome {
            phase: RunPhase::Searched,
            hits_found: 1,
            records: vec![SearchRecord::Hit(SearchHit {
                url: "https://github.com/repo1".into(),
            })],
            failures: Vec::new(),
        };
        let rendered = outcome.to_json().unwrap();
        assert_eq!(rendered, "[\n  {\n    \"url\": \"https://github.com/repo1\"\n  }\n]");

        let failed = SearchOutcome::search_failed(FetchFailure::Aborted {
            url: "https://github.com/search".into(),
            reason: "closed".into(),
        });
        assert_eq!(failed.to_json().unwrap(), "[]");
    }

    #[test]
    fn records_serialize_without_tags() {
        let hit = SearchRecord::Hit(SearchHit {
            url: "https://github.com/repo1".into(),
        });
        assert_eq!(
            serde_json::to_value(&hit).unwrap(),
            json!({"url": "https://github.com/repo1"})
        );

        let detail = SearchRecord::Detail(RepositoryDetail {
            url: "https://github.com/repo1".into(),
            owner: None,
            language_stats: BTreeMap::new(),
        });
        assert_eq!(
            serde_json::to_value(&detail).unwrap(),
            json!({"url": "https://github.com/repo1", "owner": null, "language_stats": {}})
        );
    }
}
