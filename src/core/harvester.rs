//! Harvest loop.
//!
//! Walks the active entities one at a time, pulls their posts and drives
//! each post through routing, resolution and storage. Nothing here runs
//! concurrently: one entity, one post, one resource at a time.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::adapters::{FeedClient, FeedQuery, PageFetcher};
use crate::config::{Globals, HarvestConfig};
use crate::domain::resource::sniff;
use crate::domain::{Entity, MediaKind, Post, ResolvedResource, SortType};

use super::prune::prune;
use super::registry::EntityRegistry;
use super::resolver::LinkResolver;
use super::routing::{DropReason, Route, Router, StorageTarget};
use super::store::{self, SaveOutcome};

/// Post ids a stream remembers between polls
pub const STREAM_SEEN_CAPACITY: usize = 301;

const STREAM_IDLE_MIN: Duration = Duration::from_secs(1);
const STREAM_IDLE_MAX: Duration = Duration::from_secs(16);

/// Cooperative shutdown flag shared between the loop and signal handlers
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Sleep for `duration` unless shut down first.
    ///
    /// Returns false when interrupted.
    pub async fn sleep(&self, duration: Duration) -> bool {
        let mut rx = self.tx.subscribe();
        tokio::select! {
            _ = tokio::time::sleep(duration) => !self.is_triggered(),
            _ = wait_triggered(&mut rx) => false,
        }
    }
}

async fn wait_triggered(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            // sender gone, nobody can trigger any more
            std::future::pending::<()>().await;
        }
    }
}

/// Questions asked in interactive mode
#[async_trait]
pub trait Prompt: Send + Sync {
    /// Yes/no question
    async fn confirm(&self, question: &str) -> bool;

    /// Pick the owner of an overlapping post; None keeps it dropped
    async fn choose_owner(&self, post: &Post, candidates: &[Entity]) -> Option<usize>;
}

/// Which active entities a run touches
#[derive(Debug, Clone, Default)]
pub struct HarvestScope {
    pub subreddits_only: bool,
    pub redditors_only: bool,
    pub only_name: Option<String>,
}

impl HarvestScope {
    pub fn includes(&self, entity: &Entity) -> bool {
        if self.subreddits_only && entity.is_redditor() {
            return false;
        }
        if self.redditors_only && entity.is_subreddit() {
            return false;
        }
        match self.only_name.as_deref() {
            Some(name) if !name.is_empty() => entity.name == name,
            _ => true,
        }
    }
}

/// Outcome for one resource (or one post when nothing was fetched)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStatus {
    NewSaved,
    AlreadySaved,
    NotSaved,
    Ignored,
    Bonk,
}

impl std::fmt::Display for RetrievalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetrievalStatus::NewSaved => write!(f, "new_saved"),
            RetrievalStatus::AlreadySaved => write!(f, "already_saved"),
            RetrievalStatus::NotSaved => write!(f, "not_saved"),
            RetrievalStatus::Ignored => write!(f, "ignored"),
            RetrievalStatus::Bonk => write!(f, "bonk"),
        }
    }
}

/// Counters for a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub pruned: usize,
    pub entities: usize,
    pub entities_failed: usize,
    pub posts: usize,
    pub new_saved: usize,
    pub already_saved: usize,
    pub not_saved: usize,
    pub ignored: usize,
    pub bonk: usize,
}

impl HarvestReport {
    pub fn record(&mut self, status: RetrievalStatus) {
        match status {
            RetrievalStatus::NewSaved => self.new_saved += 1,
            RetrievalStatus::AlreadySaved => self.already_saved += 1,
            RetrievalStatus::NotSaved => self.not_saved += 1,
            RetrievalStatus::Ignored => self.ignored += 1,
            RetrievalStatus::Bonk => self.bonk += 1,
        }
    }
}

/// Filters repeated and pinned posts out of successive stream polls
#[derive(Debug, Default)]
pub struct StreamPoller {
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl StreamPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts not handed out before, oldest first
    pub fn fresh(&mut self, newest_first: Vec<Post>) -> Vec<Post> {
        let mut fresh: Vec<Post> = newest_first
            .into_iter()
            .filter(|p| !p.pinned && !self.seen.contains(&p.id))
            .collect();
        fresh.reverse();

        for post in &fresh {
            self.remember(&post.id);
        }
        fresh
    }

    fn remember(&mut self, id: &str) {
        if !self.seen.insert(id.to_string()) {
            return;
        }
        self.order.push_back(id.to_string());
        while self.order.len() > STREAM_SEEN_CAPACITY {
            if let Some(old) = self.order.pop_front() {
                self.seen.remove(&old);
            }
        }
    }
}

/// Drives a full harvest run
pub struct Harvester {
    globals: Globals,
    router: Router,
    resolver: LinkResolver,
    feed: Arc<dyn FeedClient>,
    fetcher: Arc<dyn PageFetcher>,
    shutdown: Shutdown,
    prompt: Option<Arc<dyn Prompt>>,
}

impl Harvester {
    pub fn new(
        config: &HarvestConfig,
        feed: Arc<dyn FeedClient>,
        fetcher: Arc<dyn PageFetcher>,
        shutdown: Shutdown,
    ) -> Self {
        let globals = config.globals.clone();
        let router = Router::new(
            EntityRegistry::from_config(config),
            globals.favor_entity,
            globals.download_folder.clone(),
            globals.separate_media,
        );
        let resolver = LinkResolver::new(config.links.clone(), Arc::clone(&fetcher));

        Self {
            globals,
            router,
            resolver,
            feed,
            fetcher,
            shutdown,
            prompt: None,
        }
    }

    /// Ask the user before pruning and on ambiguous overlaps
    pub fn with_prompt(mut self, prompt: Arc<dyn Prompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Prune if configured, then harvest every entity in scope
    #[instrument(skip(self, scope))]
    pub async fn run(&self, scope: &HarvestScope) -> Result<HarvestReport> {
        let root = &self.globals.download_folder;
        std::fs::create_dir_all(root)
            .with_context(|| format!("Failed to create download folder {}", root.display()))?;

        let mut report = HarvestReport::default();

        if self.globals.prune_ignorables {
            report.pruned = self.prune().await;
        }

        let entities: Vec<&Entity> = self
            .router
            .registry()
            .active_entities()
            .filter(|e| {
                let included = scope.includes(e);
                if !included {
                    debug!("Skipping {} '{}' (out of scope)", e.kind, e.name);
                }
                included
            })
            .collect();

        for (i, entity) in entities.into_iter().enumerate() {
            if self.shutdown.is_triggered() {
                info!("Interrupted, stopping early");
                break;
            }

            if i > 0 {
                debug!("Sleeping {:?} before next entity", self.globals.backoff_sleep);
                if !self.shutdown.sleep(self.globals.backoff_sleep).await {
                    info!("Interrupted, stopping early");
                    break;
                }
            }

            report.entities += 1;
            self.harvest_entity(entity, &mut report).await;
        }

        info!(
            entities = report.entities,
            failed = report.entities_failed,
            posts = report.posts,
            new_saved = report.new_saved,
            already_saved = report.already_saved,
            not_saved = report.not_saved,
            ignored = report.ignored,
            bonk = report.bonk,
            pruned = report.pruned,
            "Harvest finished"
        );

        Ok(report)
    }

    async fn prune(&self) -> usize {
        if let Some(prompt) = &self.prompt {
            let question = "Configured to prune content from ignored entities, continue?";
            if !prompt.confirm(question).await {
                info!("Pruning skipped");
                return 0;
            }
        }

        let removed = prune(
            self.router.registry(),
            &self.globals.download_folder,
            self.globals.separate_media,
        );
        info!("Pruned {} folder(s)", removed);
        removed
    }

    #[instrument(skip(self, entity, report), fields(kind = %entity.kind, entity = %entity.name))]
    async fn harvest_entity(&self, entity: &Entity, report: &mut HarvestReport) {
        let criteria = &entity.search_criteria;
        if criteria.sort_type == SortType::Stream {
            return self.stream_entity(entity, report).await;
        }

        let query = FeedQuery {
            kind: entity.kind,
            name: entity.name.clone(),
            sort: criteria.sort_type,
            toggle: criteria.sort_toggle,
            limit: criteria.post_limit,
        };

        let posts = match self.feed.fetch_posts(&query).await {
            Ok(posts) => posts,
            Err(e) => {
                error!("Failed to fetch posts from '{}': {}", entity.name, e);
                report.entities_failed += 1;
                return;
            }
        };

        let mut count = 0;
        for post in posts.iter().take(criteria.post_limit as usize) {
            if self.shutdown.is_triggered() {
                info!("Interrupted, stopping early");
                break;
            }
            self.process_post(post, entity, report).await;
            count += 1;
        }
        info!("Processed {} post(s) from '{}'", count, entity.name);
    }

    async fn stream_entity(&self, entity: &Entity, report: &mut HarvestReport) {
        info!("Streaming new posts from '{}'", entity.name);

        let query = FeedQuery {
            kind: entity.kind,
            name: entity.name.clone(),
            sort: SortType::New,
            toggle: None,
            limit: entity.search_criteria.post_limit,
        };
        let mut poller = StreamPoller::new();
        let mut idle = STREAM_IDLE_MIN;

        while !self.shutdown.is_triggered() {
            match self.feed.fetch_posts(&query).await {
                Ok(posts) => {
                    let fresh = poller.fresh(posts);
                    if fresh.is_empty() {
                        idle = (idle * 2).min(STREAM_IDLE_MAX);
                    } else {
                        idle = STREAM_IDLE_MIN;
                    }
                    for post in &fresh {
                        if self.shutdown.is_triggered() {
                            break;
                        }
                        self.process_post(post, entity, report).await;
                    }
                }
                Err(e) if e.aborts_entity() => {
                    error!("Stream from '{}' stopped: {}", entity.name, e);
                    report.entities_failed += 1;
                    return;
                }
                Err(e) => {
                    warn!("Stream poll for '{}' failed: {}", entity.name, e);
                    idle = (idle * 2).min(STREAM_IDLE_MAX);
                }
            }

            if !self.shutdown.sleep(idle).await {
                break;
            }
        }
        info!("Stream from '{}' stopped", entity.name);
    }

    async fn process_post(&self, post: &Post, origin: &Entity, report: &mut HarvestReport) {
        report.posts += 1;
        info!(
            "Processing post '{}' by {} in {} ({})",
            post.id, post.author_name, post.source_feed_name, post.url
        );

        if post.over_18 && !self.globals.bonk {
            log_status(RetrievalStatus::Bonk, &post.url);
            report.record(RetrievalStatus::Bonk);
            return;
        }

        let Some(target) = self.target(post, origin).await else {
            log_status(RetrievalStatus::Ignored, &post.url);
            report.record(RetrievalStatus::Ignored);
            return;
        };

        let resources = self.resolver.resolve(post).await;
        if resources.is_empty() {
            log_status(RetrievalStatus::NotSaved, &post.url);
            report.record(RetrievalStatus::NotSaved);
            return;
        }

        for resource in &resources {
            if self.shutdown.is_triggered() {
                break;
            }
            let status = self.retrieve(resource, &target).await;
            log_status(status, &resource.source_url);
            report.record(status);
        }
    }

    async fn target(&self, post: &Post, origin: &Entity) -> Option<StorageTarget> {
        match self.router.route(post, Some(origin)) {
            Route::Target(target) => Some(target),
            Route::Dropped(DropReason::AmbiguousOverlap { author, feed }) => {
                let prompt = self.prompt.as_ref()?;
                let candidates: Vec<Entity> = author.into_iter().chain(feed).collect();
                let choice = prompt.choose_owner(post, &candidates).await?;
                let owner = candidates.get(choice)?;
                Some(self.router.target_for(owner, post))
            }
            Route::Dropped(reason) => {
                debug!("Dropping post '{}': {}", post.id, reason);
                None
            }
        }
    }

    async fn retrieve(&self, resource: &ResolvedResource, target: &StorageTarget) -> RetrievalStatus {
        let bytes = match self.fetcher.fetch_bytes(&resource.source_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Download failed: {}", e);
                return RetrievalStatus::NotSaved;
            }
        };
        if bytes.is_empty() {
            warn!("Empty download from {}", resource.source_url);
            return RetrievalStatus::NotSaved;
        }

        let (media, extension) = match sniff(&bytes) {
            Some((media, ext)) if self.globals.separate_media => (media, ext.to_string()),
            _ => (
                MediaKind::from_extension(&resource.byte_extension),
                resource.byte_extension.clone(),
            ),
        };

        match store::save(&bytes, &extension, &target.folder(media)) {
            Ok(SaveOutcome::Stored(path)) => {
                debug!("Stored {}", path.display());
                RetrievalStatus::NewSaved
            }
            Ok(SaveOutcome::Deduplicated(path)) => {
                debug!("Already have {}", path.display());
                RetrievalStatus::AlreadySaved
            }
            Err(e) => {
                warn!("{}", e);
                RetrievalStatus::NotSaved
            }
        }
    }
}

fn log_status(status: RetrievalStatus, source_url: &str) {
    info!("Status: {}; source_url: {}", status, source_url);
}
