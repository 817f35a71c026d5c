//! Configuration for redd-harvest.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (REDD_HARVEST_DOWNLOAD_FOLDER)
//! 2. Config file (`--config`, $REDD_HARVEST_CONFIG, or ~/.config/redd-harvest/config.yml)
//! 3. Defaults
//!
//! The loaded [`HarvestConfig`] is immutable and handed to each component
//! at construction. Link patterns are compiled and checked here, so a bad
//! pattern aborts the run before anything is fetched.

pub mod paths;

use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::entity::unknown_value;
use crate::domain::resource::canonical_extension;
use crate::domain::{
    is_plain_segment, Entity, EntityKind, SearchCriteria, SortToggle, SortType, StoreType,
};

pub const DEFAULT_APP: &str = "redd-harvest";
pub const DEFAULT_USERNAME: &str = "unknown";
pub const DEFAULT_POST_LIMIT: u32 = 5;
pub const DEFAULT_RATE_LIMIT_MAX_WAIT: u64 = 120;
pub const DEFAULT_BACKOFF_SLEEP: f64 = 0.1;

/// Configuration errors (fatal at load)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Failed to determine home directory")]
    HomeDir,

    #[error("A {kind} entry has an empty name")]
    EmptyName { kind: String },

    #[error("{kind} name '{name}' must be a single folder name (no '/', '\\', '.' or '..')")]
    InvalidName { kind: String, name: String },

    #[error("Link rule #{index} has an empty base_url")]
    EmptyBaseUrl { index: usize },

    #[error("Invalid page search pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Page search pattern '{pattern}' contains a capturing group; use (?:...) instead")]
    CapturingGroup { pattern: String },

    #[error("backoff_sleep must be a finite, non-negative, representable number of seconds (got {0})")]
    InvalidBackoff(f64),
}

/// Tie-break applied when a post overlaps two configured entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum FavorEntity {
    /// Author side wins
    Redditor,

    /// Feed side wins
    Subreddit,

    /// Overlapping posts are dropped
    Disabled,
}

impl Default for FavorEntity {
    fn default() -> Self {
        Self::Redditor
    }
}

impl std::str::FromStr for FavorEntity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redditor" => Ok(FavorEntity::Redditor),
            "subreddit" => Ok(FavorEntity::Subreddit),
            "disabled" => Ok(FavorEntity::Disabled),
            _ => Err(unknown_value(
                "favor_entity",
                s,
                &["redditor", "subreddit", "disabled"],
            )),
        }
    }
}

impl TryFrom<String> for FavorEntity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for FavorEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FavorEntity::Redditor => write!(f, "redditor"),
            FavorEntity::Subreddit => write!(f, "subreddit"),
            FavorEntity::Disabled => write!(f, "disabled"),
        }
    }
}

// ============================================================================
// Raw file schema (matches YAML structure)
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub globals: Option<GlobalsFile>,
    #[serde(default)]
    pub redditors: Option<Vec<EntityFile>>,
    #[serde(default)]
    pub subreddits: Option<Vec<EntityFile>>,
    #[serde(default)]
    pub ignored_redditors: Option<Vec<IgnoredFile>>,
    #[serde(default)]
    pub ignored_subreddits: Option<Vec<IgnoredFile>>,
    #[serde(default)]
    pub links: Option<Vec<LinkFile>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalsFile {
    pub app: Option<String>,
    pub username: Option<String>,
    pub post_limit: Option<u32>,
    /// Seconds
    pub rate_limit_max_wait: Option<u64>,
    /// Seconds, fractional allowed
    pub backoff_sleep: Option<f64>,
    pub download_folder: Option<String>,
    pub separate_media: Option<bool>,
    pub prune_ignorables: Option<bool>,
    pub favor_entity: Option<FavorEntity>,
    /// Allow over-18 posts
    pub bonk: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityFile {
    pub name: String,
    pub store_type: Option<StoreType>,
    pub alias: Option<String>,
    #[serde(default)]
    pub search_criteria: Option<SearchCriteriaFile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchCriteriaFile {
    pub post_limit: Option<u32>,
    pub sort_type: Option<SortType>,
    pub sort_toggle: Option<SortToggle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IgnoredFile {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkFile {
    pub base_url: String,
    #[serde(default, alias = "direct_dl_url_extensions")]
    pub direct_dl_extensions: Option<Vec<String>>,
    #[serde(default)]
    pub sub_searches: Option<Vec<SubSearchFile>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubSearchFile {
    #[serde(default, alias = "page_search_regex")]
    pub page_search_pattern: Option<String>,
    #[serde(default, alias = "extension")]
    pub trigger_extension: Option<String>,
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// Process-wide settings
#[derive(Debug, Clone)]
pub struct Globals {
    pub app: String,
    pub username: String,
    pub post_limit: u32,
    pub rate_limit_max_wait: Duration,
    pub backoff_sleep: Duration,
    /// Absolute storage root
    pub download_folder: PathBuf,
    pub separate_media: bool,
    pub prune_ignorables: bool,
    pub favor_entity: FavorEntity,
    pub bonk: bool,
}

impl Globals {
    /// Defaults rooted at the given download folder
    pub fn with_download_folder(download_folder: impl Into<PathBuf>) -> Self {
        Self {
            app: DEFAULT_APP.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            post_limit: DEFAULT_POST_LIMIT,
            rate_limit_max_wait: Duration::from_secs(DEFAULT_RATE_LIMIT_MAX_WAIT),
            backoff_sleep: Duration::from_secs_f64(DEFAULT_BACKOFF_SLEEP),
            download_folder: download_folder.into(),
            separate_media: false,
            prune_ignorables: false,
            favor_entity: FavorEntity::default(),
            bonk: false,
        }
    }

    /// HTTP user agent
    pub fn user_agent(&self) -> String {
        format!(
            "rust:{}:{} (by /u/{})",
            self.app,
            env!("CARGO_PKG_VERSION"),
            self.username
        )
    }
}

/// A secondary in-page search
#[derive(Debug, Clone)]
pub struct SubSearch {
    /// Only applies when the post URL ends in this extension
    pub trigger_extension: Option<String>,
    pub pattern: Regex,
}

impl SubSearch {
    /// Compile a page search pattern, rejecting capturing groups
    pub fn new(pattern: &str, trigger_extension: Option<&str>) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

        // group 0 is the whole match
        if regex.captures_len() > 1 {
            return Err(ConfigError::CapturingGroup {
                pattern: pattern.to_string(),
            });
        }

        Ok(Self {
            // compared against url_extension, which is canonical too
            trigger_extension: trigger_extension.map(canonical_extension),
            pattern: regex,
        })
    }
}

/// A trusted link rule
#[derive(Debug, Clone)]
pub struct LinkRule {
    /// Literal prefix matched against post URLs
    pub base_url: String,

    /// Lowercase, no leading dot
    pub direct_dl_extensions: Vec<String>,

    pub sub_searches: Vec<SubSearch>,
}

impl LinkRule {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            direct_dl_extensions: Vec::new(),
            sub_searches: Vec::new(),
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.direct_dl_extensions = extensions
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .collect();
        self
    }

    pub fn with_sub_search(mut self, sub_search: SubSearch) -> Self {
        self.sub_searches.push(sub_search);
        self
    }

    /// Literal, ASCII case-insensitive prefix match
    pub fn matches(&self, url: &str) -> bool {
        url.len() >= self.base_url.len()
            && url.is_char_boundary(self.base_url.len())
            && url[..self.base_url.len()].eq_ignore_ascii_case(&self.base_url)
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub globals: Globals,
    pub redditors: Vec<Entity>,
    pub subreddits: Vec<Entity>,
    pub ignored_redditors: Vec<String>,
    pub ignored_subreddits: Vec<String>,
    /// Order is significant: first match wins
    pub links: Vec<LinkRule>,
    /// Path to config file (if loaded from one)
    pub config_file: Option<PathBuf>,
}

impl HarvestConfig {
    /// Empty configuration rooted at the given download folder
    pub fn new(download_folder: impl Into<PathBuf>) -> Self {
        Self {
            globals: Globals::with_download_folder(download_folder),
            redditors: Vec::new(),
            subreddits: Vec::new(),
            ignored_redditors: Vec::new(),
            ignored_subreddits: Vec::new(),
            links: Vec::new(),
            config_file: None,
        }
    }

    /// Load and validate a config file, then apply env overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_yaml(&content)?;
        config.config_file = Some(path.to_path_buf());

        if let Ok(folder) = std::env::var(paths::DOWNLOAD_FOLDER_ENV) {
            if !folder.trim().is_empty() {
                config.globals.download_folder = paths::expand_home(folder.trim())?;
            }
        }

        Ok(config)
    }

    /// Parse and validate YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let raw: ConfigFile = serde_yaml::from_str(yaml)?;
        Self::from_file(raw)
    }

    fn from_file(raw: ConfigFile) -> Result<Self, ConfigError> {
        let g = raw.globals.unwrap_or_default();

        let backoff = g.backoff_sleep.unwrap_or(DEFAULT_BACKOFF_SLEEP);
        let backoff_sleep =
            Duration::try_from_secs_f64(backoff).map_err(|_| ConfigError::InvalidBackoff(backoff))?;

        let download_folder = paths::expand_home(
            g.download_folder
                .as_deref()
                .unwrap_or(paths::DEFAULT_DOWNLOAD_FOLDER),
        )?;

        let globals = Globals {
            app: g.app.unwrap_or_else(|| DEFAULT_APP.to_string()),
            username: g.username.unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            post_limit: g.post_limit.unwrap_or(DEFAULT_POST_LIMIT),
            rate_limit_max_wait: Duration::from_secs(
                g.rate_limit_max_wait.unwrap_or(DEFAULT_RATE_LIMIT_MAX_WAIT),
            ),
            backoff_sleep,
            download_folder,
            separate_media: g.separate_media.unwrap_or(false),
            prune_ignorables: g.prune_ignorables.unwrap_or(false),
            favor_entity: g.favor_entity.unwrap_or_default(),
            bonk: g.bonk.unwrap_or(false),
        };

        let redditors = raw
            .redditors
            .unwrap_or_default()
            .into_iter()
            .map(|e| resolve_entity(EntityKind::Redditor, e, globals.post_limit))
            .collect::<Result<Vec<_>, _>>()?;

        let subreddits = raw
            .subreddits
            .unwrap_or_default()
            .into_iter()
            .map(|e| resolve_entity(EntityKind::Subreddit, e, globals.post_limit))
            .collect::<Result<Vec<_>, _>>()?;

        let ignored_redditors = resolve_ignored("ignored_redditor", raw.ignored_redditors)?;
        let ignored_subreddits = resolve_ignored("ignored_subreddit", raw.ignored_subreddits)?;

        let links = raw
            .links
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, link)| resolve_link(index, link))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            globals,
            redditors,
            subreddits,
            ignored_redditors,
            ignored_subreddits,
            links,
            config_file: None,
        })
    }
}

fn resolve_entity(
    kind: EntityKind,
    raw: EntityFile,
    default_post_limit: u32,
) -> Result<Entity, ConfigError> {
    let name = folder_name(&kind.to_string(), &raw.name)?;

    let store_type = raw.store_type.unwrap_or(match kind {
        EntityKind::Redditor => StoreType::Flat,
        EntityKind::Subreddit => StoreType::Nested,
    });

    let sc = raw.search_criteria.unwrap_or_default();
    let mut sort_type = sc.sort_type.unwrap_or_default();
    if !sort_type.supported_for(kind) {
        warn!(
            "{} '{}' does not support sort_type '{}', using 'new'",
            kind, name, sort_type
        );
        sort_type = SortType::New;
    }
    let sort_toggle = if sort_type.takes_toggle() {
        Some(sc.sort_toggle.unwrap_or_default())
    } else {
        None
    };

    let alias = match raw.alias.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(alias) => Some(folder_name(&format!("{} alias", kind), alias)?),
    };

    Ok(Entity {
        kind,
        name,
        alias,
        store_type,
        search_criteria: SearchCriteria {
            post_limit: sc.post_limit.unwrap_or(default_post_limit),
            sort_type,
            sort_toggle,
        },
    })
}

fn resolve_ignored(kind: &str, raw: Option<Vec<IgnoredFile>>) -> Result<Vec<String>, ConfigError> {
    raw.unwrap_or_default()
        .into_iter()
        .map(|i| folder_name(kind, &i.name))
        .collect()
}

/// Names end up as folder names, so each must be one plain path segment
fn folder_name(kind: &str, raw: &str) -> Result<String, ConfigError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ConfigError::EmptyName {
            kind: kind.to_string(),
        });
    }
    if !is_plain_segment(name) {
        return Err(ConfigError::InvalidName {
            kind: kind.to_string(),
            name: name.to_string(),
        });
    }
    Ok(name.to_string())
}

fn resolve_link(index: usize, raw: LinkFile) -> Result<LinkRule, ConfigError> {
    let base_url = raw.base_url.trim().to_string();
    if base_url.is_empty() {
        return Err(ConfigError::EmptyBaseUrl { index });
    }

    let mut rule = LinkRule::new(base_url).with_extensions(raw.direct_dl_extensions.unwrap_or_default());

    for search in raw.sub_searches.unwrap_or_default() {
        // sub searches without a pattern have nothing to look for
        let Some(pattern) = search.page_search_pattern else {
            continue;
        };
        rule = rule.with_sub_search(SubSearch::new(&pattern, search.trigger_extension.as_deref())?);
    }

    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
globals:
  post_limit: 10
  backoff_sleep: 2.5
  download_folder: /tmp/redd-harvest-test
  favor_entity: subreddit
  separate_media: true
redditors:
  - name: " someone "
    search_criteria:
      sort_type: top
subreddits:
  - name: pics
    alias: pictures
    search_criteria:
      post_limit: 3
      sort_type: hot
      sort_toggle: day
ignored_redditors:
  - name: spammer
ignored_subreddits:
links:
  - base_url: https://i.imgur.com
    direct_dl_url_extensions: [jpg, .PNG]
  - base_url: https://imgur.com
    sub_searches:
      - page_search_regex: 'https://i\.imgur\.com/[0-9a-zA-Z]+\.mp4'
        extension: gifv
      - trigger_extension: jpg
"#;

    #[test]
    fn test_sample_parses_with_defaults() {
        let config = HarvestConfig::from_yaml(SAMPLE).unwrap();
        let g = &config.globals;
        assert_eq!(g.post_limit, 10);
        assert_eq!(g.backoff_sleep, Duration::from_millis(2500));
        assert_eq!(g.rate_limit_max_wait, Duration::from_secs(120));
        assert_eq!(g.download_folder, PathBuf::from("/tmp/redd-harvest-test"));
        assert_eq!(g.favor_entity, FavorEntity::Subreddit);
        assert!(g.separate_media);
        assert!(!g.prune_ignorables);
        assert!(!g.bonk);

        let redditor = &config.redditors[0];
        assert_eq!(redditor.name, "someone");
        assert_eq!(redditor.store_type, StoreType::Flat);
        assert_eq!(redditor.search_criteria.post_limit, 10);
        assert_eq!(redditor.search_criteria.sort_type, SortType::Top);
        assert_eq!(redditor.search_criteria.sort_toggle, Some(SortToggle::Week));

        let sub = &config.subreddits[0];
        assert_eq!(sub.store_type, StoreType::Nested);
        assert_eq!(sub.folder_name(), "pictures");
        assert_eq!(sub.search_criteria.post_limit, 3);
        // toggle only applies to top/controversial
        assert_eq!(sub.search_criteria.sort_toggle, None);

        assert_eq!(config.ignored_redditors, vec!["spammer".to_string()]);
        assert!(config.ignored_subreddits.is_empty());
    }

    #[test]
    fn test_links_keep_order_and_normalize() {
        let config = HarvestConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.links.len(), 2);
        assert_eq!(config.links[0].base_url, "https://i.imgur.com");
        assert_eq!(config.links[0].direct_dl_extensions, vec!["jpg", "png"]);

        // the entry without a pattern is dropped
        let imgur = &config.links[1];
        assert_eq!(imgur.sub_searches.len(), 1);
        assert_eq!(imgur.sub_searches[0].trigger_extension.as_deref(), Some("gifv"));
    }

    #[test]
    fn test_capturing_group_rejected_at_load() {
        let yaml = r#"
links:
  - base_url: https://imgur.com
    sub_searches:
      - page_search_pattern: 'https://i\.imgur\.com/([a-z]+)\.mp4'
"#;
        let err = HarvestConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::CapturingGroup { .. }));
    }

    #[test]
    fn test_non_capturing_group_accepted() {
        let sub = SubSearch::new(r"https://x\.com/(?:a|b)\.mp4", None).unwrap();
        assert!(sub.pattern.is_match("https://x.com/a.mp4"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let err = SubSearch::new("https://(?:broken", None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_unknown_favor_rejected() {
        let yaml = "globals:\n  favor_entity: nobody\n";
        assert!(matches!(
            HarvestConfig::from_yaml(yaml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rising_falls_back_for_redditors() {
        let yaml = r#"
redditors:
  - name: someone
    search_criteria:
      sort_type: rising
subreddits:
  - name: pics
    search_criteria:
      sort_type: rising
"#;
        let config = HarvestConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.redditors[0].search_criteria.sort_type, SortType::New);
        assert_eq!(config.subreddits[0].search_criteria.sort_type, SortType::Rising);
    }

    #[test]
    fn test_empty_name_rejected() {
        let yaml = "subreddits:\n  - name: '  '\n";
        assert!(matches!(
            HarvestConfig::from_yaml(yaml),
            Err(ConfigError::EmptyName { .. })
        ));
    }

    #[test]
    fn test_path_like_names_rejected() {
        for yaml in [
            "ignored_redditors:\n  - name: '..'\n",
            "ignored_subreddits:\n  - name: 'a/b'\n",
            "subreddits:\n  - name: '../../x'\n",
            "redditors:\n  - name: '.'\n",
            "subreddits:\n  - name: pics\n    alias: /etc\n",
            "subreddits:\n  - name: pics\n    alias: 'a\\b'\n",
        ] {
            assert!(
                matches!(
                    HarvestConfig::from_yaml(yaml),
                    Err(ConfigError::InvalidName { .. })
                ),
                "accepted: {}",
                yaml
            );
        }
    }

    #[test]
    fn test_huge_backoff_rejected() {
        for yaml in [
            "globals:\n  backoff_sleep: 1.0e30\n",
            "globals:\n  backoff_sleep: -1\n",
            "globals:\n  backoff_sleep: .nan\n",
        ] {
            assert!(matches!(
                HarvestConfig::from_yaml(yaml),
                Err(ConfigError::InvalidBackoff(_))
            ));
        }
    }

    #[test]
    fn test_jpeg_trigger_is_canonical() {
        let sub = SubSearch::new("x", Some(".JPEG")).unwrap();
        assert_eq!(sub.trigger_extension.as_deref(), Some("jpg"));

        // direct extensions stay literal so `.jpeg` URLs still match
        let rule = LinkRule::new("https://i.redd.it").with_extensions(["jpeg"]);
        assert_eq!(rule.direct_dl_extensions, vec!["jpeg"]);
    }

    #[test]
    fn test_enum_values_ignore_case() {
        let yaml = r#"
globals:
  favor_entity: Subreddit
subreddits:
  - name: pics
    store_type: Flat
    search_criteria:
      sort_type: TOP
      sort_toggle: Month
"#;
        let config = HarvestConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.globals.favor_entity, FavorEntity::Subreddit);
        let sub = &config.subreddits[0];
        assert_eq!(sub.store_type, StoreType::Flat);
        assert_eq!(sub.search_criteria.sort_type, SortType::Top);
        assert_eq!(sub.search_criteria.sort_toggle, Some(SortToggle::Month));
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "globals:\n  post_limit: 7\n").unwrap();

        let config = HarvestConfig::load(&path).unwrap();
        assert_eq!(config.globals.post_limit, 7);
        assert_eq!(config.config_file, Some(path));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = HarvestConfig::load(Path::new("/nonexistent/config.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_link_rule_prefix_is_literal_and_case_insensitive() {
        let rule = LinkRule::new("https://i.imgur.com");
        assert!(rule.matches("https://i.imgur.com/x.jpg"));
        assert!(rule.matches("HTTPS://I.IMGUR.COM/x.jpg"));
        assert!(!rule.matches("https://imgur.com/x.jpg"));

        // dots are not wildcards
        let rule = LinkRule::new("https://i.imgur.com");
        assert!(!rule.matches("https://iximgur.com/x.jpg"));
    }

    #[test]
    fn test_user_agent() {
        let g = Globals::with_download_folder("/tmp");
        assert!(g.user_agent().starts_with("rust:redd-harvest:"));
        assert!(g.user_agent().ends_with("(by /u/unknown)"));
    }
}
