//! Followed and ignored entities.
//!
//! An entity is either a feed source (subreddit) or an author (redditor).
//! Identity is `(kind, name)` and names are compared case-sensitively.

use serde::{Deserialize, Serialize};

/// Which side of a post an entity lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Feed source (subreddit)
    Subreddit,

    /// Author (redditor)
    Redditor,
}

impl EntityKind {
    /// The kind on the other side of a post
    pub fn counterpart(self) -> Self {
        match self {
            EntityKind::Subreddit => EntityKind::Redditor,
            EntityKind::Redditor => EntityKind::Subreddit,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Subreddit => write!(f, "subreddit"),
            EntityKind::Redditor => write!(f, "redditor"),
        }
    }
}

/// Folder layout strategy for an entity's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum StoreType {
    /// `<owner>/<counterpart>`
    Nested,

    /// `<owner>`
    Flat,

    /// Shared download root
    ReallyFlat,
}

impl std::str::FromStr for StoreType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nested" => Ok(StoreType::Nested),
            "flat" => Ok(StoreType::Flat),
            "really-flat" => Ok(StoreType::ReallyFlat),
            _ => Err(unknown_value("store_type", s, &["nested", "flat", "really-flat"])),
        }
    }
}

impl TryFrom<String> for StoreType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::Nested => write!(f, "nested"),
            StoreType::Flat => write!(f, "flat"),
            StoreType::ReallyFlat => write!(f, "really-flat"),
        }
    }
}

/// Listing order requested from the feed client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum SortType {
    Hot,
    New,
    Top,
    Controversial,
    /// Subreddits only
    Rising,
    /// Continuous `new` polling that never terminates on its own
    Stream,
}

impl SortType {
    /// Whether this order takes a time window
    pub fn takes_toggle(self) -> bool {
        matches!(self, SortType::Top | SortType::Controversial)
    }

    /// Whether redditor listings support this order
    pub fn supported_for(self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Subreddit => true,
            EntityKind::Redditor => !matches!(self, SortType::Rising),
        }
    }

    /// Path segment / query value used by the listing API
    pub fn as_str(self) -> &'static str {
        match self {
            SortType::Hot => "hot",
            SortType::New => "new",
            SortType::Top => "top",
            SortType::Controversial => "controversial",
            SortType::Rising => "rising",
            SortType::Stream => "stream",
        }
    }
}

impl std::str::FromStr for SortType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hot" => Ok(SortType::Hot),
            "new" => Ok(SortType::New),
            "top" => Ok(SortType::Top),
            "controversial" => Ok(SortType::Controversial),
            "rising" => Ok(SortType::Rising),
            "stream" => Ok(SortType::Stream),
            _ => Err(unknown_value(
                "sort_type",
                s,
                &["hot", "new", "top", "controversial", "rising", "stream"],
            )),
        }
    }
}

impl TryFrom<String> for SortType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Default for SortType {
    fn default() -> Self {
        Self::New
    }
}

impl std::fmt::Display for SortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time window for `top` and `controversial`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum SortToggle {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl SortToggle {
    pub fn as_str(self) -> &'static str {
        match self {
            SortToggle::Hour => "hour",
            SortToggle::Day => "day",
            SortToggle::Week => "week",
            SortToggle::Month => "month",
            SortToggle::Year => "year",
            SortToggle::All => "all",
        }
    }
}

impl std::str::FromStr for SortToggle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" => Ok(SortToggle::Hour),
            "day" => Ok(SortToggle::Day),
            "week" => Ok(SortToggle::Week),
            "month" => Ok(SortToggle::Month),
            "year" => Ok(SortToggle::Year),
            "all" => Ok(SortToggle::All),
            _ => Err(unknown_value(
                "sort_toggle",
                s,
                &["hour", "day", "week", "month", "year", "all"],
            )),
        }
    }
}

impl TryFrom<String> for SortToggle {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Default for SortToggle {
    fn default() -> Self {
        Self::Week
    }
}

impl std::fmt::Display for SortToggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved search criteria for one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchCriteria {
    /// Maximum posts per fetch (per poll in stream mode)
    pub post_limit: u32,

    pub sort_type: SortType,

    /// Only set when `sort_type` takes a time window
    pub sort_toggle: Option<SortToggle>,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            post_limit: 5,
            sort_type: SortType::New,
            sort_toggle: None,
        }
    }
}

/// A followed entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub kind: EntityKind,

    /// Identity key (case-sensitive)
    pub name: String,

    /// Overrides `name` as the storage folder
    pub alias: Option<String>,

    pub store_type: StoreType,

    pub search_criteria: SearchCriteria,
}

impl Entity {
    /// Create an entity with default criteria
    pub fn new(kind: EntityKind, name: impl Into<String>, store_type: StoreType) -> Self {
        Self {
            kind,
            name: name.into(),
            alias: None,
            store_type,
            search_criteria: SearchCriteria::default(),
        }
    }

    /// Set a folder alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Set search criteria
    pub fn with_criteria(mut self, criteria: SearchCriteria) -> Self {
        self.search_criteria = criteria;
        self
    }

    /// Folder name this entity owns
    pub fn folder_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn is_redditor(&self) -> bool {
        self.kind == EntityKind::Redditor
    }

    pub fn is_subreddit(&self) -> bool {
        self.kind == EntityKind::Subreddit
    }
}

/// Error text for an unrecognised enum value in configuration
pub(crate) fn unknown_value(field: &str, value: &str, expected: &[&str]) -> String {
    format!(
        "unknown {} '{}', expected one of: {}",
        field,
        value,
        expected.join(", ")
    )
}

/// Whether `name` can be used as one folder name as written
pub fn is_plain_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Map a name to a single folder name below its parent.
///
/// Separators and NUL become `_`; `.`, `..` and blank names become `_`.
/// Every path segment built from an entity or post name goes through here.
pub fn folder_segment(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    match cleaned.trim() {
        "" | "." | ".." => "_".to_string(),
        trimmed => trimmed.to_string(),
    }
}
