//! Posts delivered by the feed client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::EntityKind;

/// Author name used when the upstream author is deleted or unavailable
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// A single post as seen by the harvester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Upstream post id
    pub id: String,

    #[serde(default)]
    pub title: String,

    pub author_name: String,

    pub source_feed_name: String,

    pub url: String,

    /// Pinned/stickied by a moderator
    #[serde(default)]
    pub pinned: bool,

    #[serde(default)]
    pub over_18: bool,

    pub created_at: DateTime<Utc>,

    /// Highest-quality URL of each gallery item, in gallery order
    #[serde(default)]
    pub gallery: Vec<String>,

    /// Direct stream of a platform-hosted video
    #[serde(default)]
    pub hosted_video: Option<String>,
}

impl Post {
    /// Create a post with just the routing-relevant fields
    pub fn new(
        id: impl Into<String>,
        author_name: impl Into<String>,
        source_feed_name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            author_name: author_name.into(),
            source_feed_name: source_feed_name.into(),
            url: url.into(),
            pinned: false,
            over_18: false,
            created_at: Utc::now(),
            gallery: Vec::new(),
            hosted_video: None,
        }
    }

    /// Name on the given side of the post
    pub fn name_for(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Redditor => &self.author_name,
            EntityKind::Subreddit => &self.source_feed_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_for_each_side() {
        let post = Post::new("abc", "someone", "pics", "https://i.redd.it/x.jpg");
        assert_eq!(post.name_for(EntityKind::Redditor), "someone");
        assert_eq!(post.name_for(EntityKind::Subreddit), "pics");
    }
}
