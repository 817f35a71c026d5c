//! Link resolver: turns a post URL into concrete downloads.
//!
//! The first rule whose `base_url` is a literal prefix of the post URL is
//! used; rule order comes straight from configuration, so users can
//! override a broad rule by putting a narrower one ahead of it.
//!
//! For the matched rule, in order:
//! 1. gallery posts yield every item at its source quality
//! 2. platform-hosted videos yield their direct stream
//! 3. URLs ending in an allowed extension are downloaded as-is
//! 4. sub-searches fetch the post page and take the first full-match URL

use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::adapters::PageFetcher;
use crate::config::{LinkRule, SubSearch};
use crate::domain::resource::url_extension;
use crate::domain::{Post, ResolvedResource};

/// Resolves posts against the configured link rules
pub struct LinkResolver {
    rules: Vec<LinkRule>,
    fetcher: Arc<dyn PageFetcher>,
}

impl LinkResolver {
    pub fn new(rules: Vec<LinkRule>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { rules, fetcher }
    }

    /// First rule whose base URL prefixes `url`
    pub fn rule_for(&self, url: &str) -> Option<&LinkRule> {
        self.rules.iter().find(|rule| rule.matches(url))
    }

    /// Resources to download for a post; empty when nothing applies
    pub async fn resolve(&self, post: &Post) -> Vec<ResolvedResource> {
        let Some(rule) = self.rule_for(&post.url) else {
            debug!("No link rule matches {}", post.url);
            return Vec::new();
        };
        debug!("{} matched link rule {}", post.url, rule.base_url);

        if !post.gallery.is_empty() {
            return post
                .gallery
                .iter()
                .map(|url| ResolvedResource::from_url(url.as_str()))
                .collect();
        }

        if let Some(video) = post.hosted_video.as_deref() {
            return vec![ResolvedResource::from_url(video)];
        }

        if let Some(url) = direct_download_url(&post.url, rule) {
            return vec![ResolvedResource::from_url(url)];
        }

        if let Some(url) = self.sub_search(&post.url, rule).await {
            return vec![ResolvedResource::from_url(url)];
        }

        info!("Nothing downloadable found at {}", post.url);
        Vec::new()
    }

    async fn sub_search(&self, url: &str, rule: &LinkRule) -> Option<String> {
        let extension = url_extension(url);
        let mut page: Option<String> = None;

        for search in &rule.sub_searches {
            if !applies(search, extension.as_deref()) {
                continue;
            }

            if page.is_none() {
                match self.fetcher.fetch_text(url).await {
                    Ok(text) => page = Some(text),
                    Err(e) => {
                        warn!("Failed to fetch page {}: {}", url, e);
                        return None;
                    }
                }
            }

            let text = page.as_deref().unwrap_or_default();
            if let Some(found) = find_url(text, search) {
                return Some(found);
            }
            debug!("No match for '{}' in {}", search.pattern.as_str(), url);
        }

        None
    }
}

fn applies(search: &SubSearch, extension: Option<&str>) -> bool {
    match search.trigger_extension.as_deref() {
        Some(trigger) => extension == Some(trigger),
        None => true,
    }
}

/// First full match in page order that parses as an absolute URL
fn find_url(page: &str, search: &SubSearch) -> Option<String> {
    search
        .pattern
        .find_iter(page)
        .map(|m| m.as_str().replace("&amp;", "&"))
        .find(|candidate| match Url::parse(candidate) {
            Ok(url) => url.has_host(),
            Err(_) => {
                debug!("Not a valid URL: {}", candidate);
                false
            }
        })
}

/// Direct-download form of `url` if its extension is allowed by `rule`.
///
/// Besides a plain `<name>.<ext>`, this accepts `<name>.<ext>?<query>`
/// (query dropped) and the thumbnail form `<name>_d.<ext>?<query>`
/// (rewritten to `<name>.<ext>`).
pub fn direct_download_url(url: &str, rule: &LinkRule) -> Option<String> {
    let lower = url.to_ascii_lowercase();
    let (path, query) = match lower.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (lower.as_str(), None),
    };

    for ext in &rule.direct_dl_extensions {
        let dotted = format!(".{}", ext);
        let thumb = format!("_d.{}", ext);

        if query.is_none() {
            if path.len() > dotted.len() && path.ends_with(&dotted) {
                return Some(url.to_string());
            }
            continue;
        }

        if path.len() > thumb.len() && path.ends_with(&thumb) {
            return Some(format!("{}{}", &url[..path.len() - thumb.len()], dotted));
        }
        if path.len() > dotted.len() && path.ends_with(&dotted) {
            return Some(url[..path.len()].to_string());
        }
    }

    None
}
