//! Reddit listing client over the public JSON endpoints.
//!
//! Listings are paged 100 at a time via the `after` cursor. Upstream rate
//! limits are read from the `x-ratelimit-*` headers: when the budget runs out
//! the client waits for the reset window, but never longer than the
//! configured maximum, in which case it gives up with
//! [`FetchError::RateLimited`].

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info};

use super::{FeedClient, FeedQuery, FetchError};
use crate::domain::{EntityKind, Post, SortType, UNKNOWN_AUTHOR};

pub const DEFAULT_BASE_URL: &str = "https://www.reddit.com";

/// Reddit caps listing pages at 100 items
const PAGE_SIZE: u32 = 100;

/// Reddit listing client
pub struct RedditClient {
    client: reqwest::Client,
    base_url: String,
    rate_limit_max_wait: Duration,
    /// Earliest instant the next request may go out
    next_allowed: Mutex<Option<Instant>>,
}

impl RedditClient {
    /// Create a client against reddit.com
    pub fn new(client: reqwest::Client, rate_limit_max_wait: Duration) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL, rate_limit_max_wait)
    }

    /// Create a client against a custom base URL
    pub fn with_base_url(
        client: reqwest::Client,
        base_url: impl Into<String>,
        rate_limit_max_wait: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limit_max_wait,
            next_allowed: Mutex::new(None),
        }
    }

    /// Build the listing URL for one page
    pub fn listing_url(&self, query: &FeedQuery, limit: u32, after: Option<&str>) -> Result<Url, FetchError> {
        // stream polls the newest posts
        let sort = match query.sort {
            SortType::Stream => SortType::New,
            other => other,
        };

        let raw = match query.kind {
            EntityKind::Subreddit => format!("{}/r/{}/{}.json", self.base_url, query.name, sort),
            EntityKind::Redditor => format!("{}/user/{}/submitted.json", self.base_url, query.name),
        };

        let mut url = Url::parse(&raw).map_err(|e| FetchError::InvalidResponse {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        {
            let mut pairs = url.query_pairs_mut();
            if query.kind == EntityKind::Redditor {
                pairs.append_pair("sort", sort.as_str());
            }
            pairs.append_pair("limit", &limit.to_string());
            pairs.append_pair("raw_json", "1");
            if let Some(toggle) = query.toggle.filter(|_| sort.takes_toggle()) {
                pairs.append_pair("t", toggle.as_str());
            }
            if let Some(after) = after {
                pairs.append_pair("after", after);
            }
        }

        Ok(url)
    }

    /// Wait out an exhausted rate-limit window, if any
    async fn respect_rate_limit(&self) -> Result<(), FetchError> {
        let wait = {
            let next = self.next_allowed.lock().unwrap_or_else(|e| e.into_inner());
            next.and_then(|at| at.checked_duration_since(Instant::now()))
        };

        if let Some(wait) = wait {
            if wait > self.rate_limit_max_wait {
                return Err(FetchError::RateLimited {
                    reset_secs: wait.as_secs(),
                    max_wait_secs: self.rate_limit_max_wait.as_secs(),
                });
            }
            info!("Rate limit exhausted, waiting {:.1}s", wait.as_secs_f64());
            tokio::time::sleep(wait).await;
        }

        Ok(())
    }

    fn record_rate_limit(&self, headers: &HeaderMap) {
        let remaining = header_f64(headers, "x-ratelimit-remaining");
        let reset = header_f64(headers, "x-ratelimit-reset");

        match (remaining, reset) {
            (Some(remaining), Some(reset)) if remaining < 1.0 => self.defer_for(reset),
            _ => *self.next_allowed.lock().unwrap_or_else(|e| e.into_inner()) = None,
        }
    }

    fn defer_for(&self, seconds: f64) {
        let seconds = if seconds.is_finite() {
            seconds.clamp(0.0, 86_400.0)
        } else {
            86_400.0
        };
        let at = Instant::now() + Duration::from_secs_f64(seconds);
        *self.next_allowed.lock().unwrap_or_else(|e| e.into_inner()) = Some(at);
    }

    async fn fetch_page(&self, url: Url) -> Result<ListingData, FetchError> {
        // one retry after a 429 that resets within the allowed wait
        for _ in 0..2 {
            self.respect_rate_limit().await?;

            debug!("GET {}", url);
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|source| FetchError::Http {
                    url: url.to_string(),
                    source,
                })?;

            self.record_rate_limit(response.headers());
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let reset = header_f64(response.headers(), "x-ratelimit-reset")
                    .or_else(|| header_f64(response.headers(), "retry-after"))
                    .unwrap_or(self.rate_limit_max_wait.as_secs_f64() + 1.0);
                self.defer_for(reset);
                continue;
            }

            if matches!(
                status,
                StatusCode::FORBIDDEN | StatusCode::NOT_FOUND | StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS
            ) {
                return Err(FetchError::Unrecoverable(format!(
                    "{} returned HTTP {} (private, banned or missing?)",
                    url,
                    status.as_u16()
                )));
            }

            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let body = response.text().await.map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

            return parse_listing(&body).map_err(|reason| FetchError::InvalidResponse {
                url: url.to_string(),
                reason,
            });
        }

        // second 429 in a row: surface whatever wait is now pending
        self.respect_rate_limit().await?;
        Err(FetchError::Status {
            url: url.to_string(),
            status: StatusCode::TOO_MANY_REQUESTS.as_u16(),
        })
    }
}

#[async_trait]
impl FeedClient for RedditClient {
    async fn fetch_posts(&self, query: &FeedQuery) -> Result<Vec<Post>, FetchError> {
        let mut posts = Vec::new();
        let mut after: Option<String> = None;

        while (posts.len() as u32) < query.limit {
            let remaining = query.limit - posts.len() as u32;
            let url = self.listing_url(query, remaining.min(PAGE_SIZE), after.as_deref())?;
            let page = self.fetch_page(url).await?;

            if page.posts.is_empty() {
                break;
            }
            posts.extend(page.posts);

            match page.after {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        posts.truncate(query.limit as usize);
        Ok(posts)
    }
}

fn header_f64(headers: &HeaderMap, name: &str) -> Option<f64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
}

// ============================================================================
// Listing JSON
// ============================================================================

/// One parsed listing page
#[derive(Debug, Clone)]
pub struct ListingData {
    pub posts: Vec<Post>,
    pub after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: RawListingData,
}

#[derive(Debug, Deserialize)]
struct RawListingData {
    #[serde(default)]
    children: Vec<Child>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: RawPost,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    id: String,
    #[serde(default)]
    title: String,
    author: Option<String>,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    stickied: bool,
    #[serde(default)]
    pinned: bool,
    #[serde(default)]
    over_18: bool,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    is_gallery: Option<bool>,
    #[serde(default)]
    gallery_data: Option<GalleryData>,
    #[serde(default)]
    media_metadata: Option<BTreeMap<String, MediaMetadata>>,
    #[serde(default)]
    media: Option<Media>,
    #[serde(default)]
    crosspost_parent_list: Option<Vec<RawPost>>,
}

#[derive(Debug, Deserialize)]
struct GalleryData {
    #[serde(default)]
    items: Vec<GalleryItem>,
}

#[derive(Debug, Deserialize)]
struct GalleryItem {
    media_id: String,
}

#[derive(Debug, Deserialize)]
struct MediaMetadata {
    #[serde(default)]
    s: Option<MediaSource>,
}

/// Highest-quality source of a gallery item
#[derive(Debug, Deserialize)]
struct MediaSource {
    u: Option<String>,
    gif: Option<String>,
    mp4: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Media {
    reddit_video: Option<RedditVideo>,
}

#[derive(Debug, Deserialize)]
struct RedditVideo {
    fallback_url: Option<String>,
}

impl RawPost {
    fn gallery_urls(&self) -> Vec<String> {
        if !self.is_gallery.unwrap_or(false) {
            return Vec::new();
        }
        let Some(metadata) = self.media_metadata.as_ref() else {
            return Vec::new();
        };

        let source = |id: &str| {
            metadata
                .get(id)
                .and_then(|m| m.s.as_ref())
                .and_then(|s| s.u.as_ref().or(s.gif.as_ref()).or(s.mp4.as_ref()))
                .map(|u| unescape(u.trim()))
        };

        match self.gallery_data.as_ref() {
            Some(data) if !data.items.is_empty() => {
                data.items.iter().filter_map(|i| source(i.media_id.as_str())).collect()
            }
            _ => metadata.keys().filter_map(|id| source(id.as_str())).collect(),
        }
    }

    fn hosted_video(&self) -> Option<String> {
        self.media
            .as_ref()
            .and_then(|m| m.reddit_video.as_ref())
            .and_then(|v| v.fallback_url.as_ref())
            .map(|u| unescape(u.trim()))
    }

    fn into_post(self) -> Post {
        let mut gallery = self.gallery_urls();
        let mut hosted_video = self.hosted_video();

        // crossposts carry their media on the parent
        if let Some(parents) = self.crosspost_parent_list.as_ref() {
            for parent in parents {
                if gallery.is_empty() {
                    gallery = parent.gallery_urls();
                }
                if hosted_video.is_none() {
                    hosted_video = parent.hosted_video();
                }
            }
        }

        let author = self
            .author
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty() && a != "[deleted]")
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        Post {
            id: self.id,
            title: self.title,
            author_name: author,
            source_feed_name: self.subreddit.trim().to_string(),
            url: self.url.map(|u| unescape(u.trim())).unwrap_or_default(),
            pinned: self.stickied || self.pinned,
            over_18: self.over_18,
            created_at: created_at(self.created_utc),
            gallery,
            hosted_video,
        }
    }
}

fn created_at(created_utc: f64) -> DateTime<Utc> {
    Utc.timestamp_opt(created_utc as i64, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn unescape(url: &str) -> String {
    url.replace("&amp;", "&")
}

/// Parse a listing page body
pub fn parse_listing(body: &str) -> Result<ListingData, String> {
    let listing: Listing = serde_json::from_str(body).map_err(|e| e.to_string())?;
    Ok(ListingData {
        posts: listing
            .data
            .children
            .into_iter()
            .map(|c| c.data.into_post())
            .collect(),
        after: listing.data.after,
    })
}
