//! Normalized entity structs shared by the facade, renderers and indexer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Entity types the catalog can be searched by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Artist,
    Release,
    #[value(name = "releasegroup", alias = "release-group")]
    #[serde(alias = "release-group")]
    ReleaseGroup,
    Label,
    Track,
    #[value(name = "cdstub")]
    CdStub,
    #[value(name = "freedb")]
    FreeDb,
    Annotation,
}

impl EntityType {
    pub const ALL: [EntityType; 8] = [
        EntityType::Artist,
        EntityType::Release,
        EntityType::ReleaseGroup,
        EntityType::Label,
        EntityType::Track,
        EntityType::CdStub,
        EntityType::FreeDb,
        EntityType::Annotation,
    ];

    /// Name used on the builder command line and as the index directory name.
    pub fn name(self) -> &'static str {
        match self {
            EntityType::Artist => "artist",
            EntityType::Release => "release",
            EntityType::ReleaseGroup => "releasegroup",
            EntityType::Label => "label",
            EntityType::Track => "track",
            EntityType::CdStub => "cdstub",
            EntityType::FreeDb => "freedb",
            EntityType::Annotation => "annotation",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity type: {0}")]
pub struct UnknownEntityType(pub String);

impl FromStr for EntityType {
    type Err = UnknownEntityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        match wanted.as_str() {
            "release-group" | "release_group" => return Ok(EntityType::ReleaseGroup),
            "freedb-disc" => return Ok(EntityType::FreeDb),
            _ => {}
        }
        EntityType::ALL
            .into_iter()
            .find(|e| e.name() == wanted)
            .ok_or_else(|| UnknownEntityType(s.to_string()))
    }
}

/// Output flavour of a search response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Xml,
}

/// One matching document: stored field values plus a 0-100 relevance score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub score: u32,
    pub fields: BTreeMap<String, Vec<String>>,
}

impl Hit {
    pub fn new(score: u32) -> Self {
        Self {
            score,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style helper, mostly for fixtures.
    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(value.into());
        self
    }

    /// First stored value of `field`, if any and non-empty.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|v| v.first())
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// First value of `field` or the empty string.
    pub fn text(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }

    /// Every stored value of a multi-valued field.
    pub fn values(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Identifier fields consulted, in priority order, for a single-hit redirect.
pub const REDIRECT_FIELDS: [&str; 3] = ["trid", "reid", "arid"];

/// One requested page of hits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultPage {
    pub hits: Vec<Hit>,
    pub estimated_total: usize,
    pub offset: usize,
}

impl ResultPage {
    /// Identifier of the sole match when the backend estimates exactly one.
    pub fn redirect_id(&self) -> Option<&str> {
        if self.estimated_total != 1 {
            return None;
        }
        redirect_field(self.hits.first()?)
    }
}

/// First present of the redirect identifiers on `hit`.
pub fn redirect_field(hit: &Hit) -> Option<&str> {
    REDIRECT_FIELDS.iter().find_map(|f| hit.get(f))
}

/// Tagged outcome of a query: no matches, a single-hit redirect, or a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Empty,
    Redirect { id: String, page: ResultPage },
    Page(ResultPage),
}

impl SearchOutcome {
    pub fn from_page(page: ResultPage) -> Self {
        Self::from_page_with_lead(page, None)
    }

    /// Like [`SearchOutcome::from_page`], with `lead` standing in for the
    /// sole match when the requested page starts past it.
    pub fn from_page_with_lead(page: ResultPage, lead: Option<&Hit>) -> Self {
        if page.estimated_total == 0 {
            return SearchOutcome::Empty;
        }
        let id = page
            .redirect_id()
            .or_else(|| lead.filter(|_| page.estimated_total == 1).and_then(redirect_field))
            .map(str::to_string);
        match id {
            Some(id) => SearchOutcome::Redirect { id, page },
            None => SearchOutcome::Page(page),
        }
    }
}
