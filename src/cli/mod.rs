//! Command-line interface for redd-harvest.
//!
//! Provides commands for harvesting, writing an example configuration
//! and inspecting the resolved configuration.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::adapters::{HttpFetcher, RedditClient};
use crate::config::{paths, HarvestConfig};
use crate::core::{HarvestScope, Harvester, Prompt, Shutdown};
use crate::domain::Entity;

pub mod prompt;

pub use prompt::StdinPrompt;

const EXAMPLE_CONFIG: &str = include_str!("../../data/example.yml");

/// redd-harvest - Download media from followed subreddits and redditors
#[derive(Parser, Debug)]
#[command(name = "redd-harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Harvest media from every configured entity
    Run {
        /// Config file (defaults to ~/.config/redd-harvest/config.yml)
        #[arg(short, long, env = "REDD_HARVEST_CONFIG")]
        config: Option<PathBuf>,

        /// Only harvest subreddits
        #[arg(short, long, conflicts_with = "redditors_only")]
        subreddits_only: bool,

        /// Only harvest redditors
        #[arg(short, long)]
        redditors_only: bool,

        /// Only harvest the entity with this name
        #[arg(short, long)]
        only_name: Option<String>,

        /// Ask before pruning, on ambiguous overlaps and on Ctrl-C
        #[arg(short, long)]
        interactive: bool,
    },

    /// Write a commented example config file
    Setup {
        /// Where to write it (defaults to the config file location)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Show the resolved configuration (for debugging)
    Config {
        /// Config file (defaults to ~/.config/redd-harvest/config.yml)
        #[arg(short, long, env = "REDD_HARVEST_CONFIG")]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run {
                config,
                subreddits_only,
                redditors_only,
                only_name,
                interactive,
            } => {
                let scope = HarvestScope {
                    subreddits_only,
                    redditors_only,
                    only_name,
                };
                run_harvest(config, scope, interactive).await
            }
            Commands::Setup { path } => setup(path),
            Commands::Config { config } => show_config(config),
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<HarvestConfig> {
    let path = match path {
        Some(path) => path,
        None => paths::config_file()?,
    };

    if !path.exists() {
        bail!(
            "No config file at {}. Run `redd-harvest setup` to create one.",
            path.display()
        );
    }

    HarvestConfig::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

async fn run_harvest(config: Option<PathBuf>, scope: HarvestScope, interactive: bool) -> Result<()> {
    let config = load_config(config)?;
    info!(
        "Harvesting into {}",
        config.globals.download_folder.display()
    );

    let fetcher = HttpFetcher::new(&config.globals.user_agent())
        .context("Failed to create HTTP client")?;
    let feed = RedditClient::new(fetcher.client().clone(), config.globals.rate_limit_max_wait);

    let shutdown = Shutdown::new();
    let prompt: Option<Arc<dyn Prompt>> = if interactive {
        Some(Arc::new(StdinPrompt))
    } else {
        None
    };
    spawn_interrupt_handler(shutdown.clone(), prompt.clone());

    let mut harvester = Harvester::new(&config, Arc::new(feed), Arc::new(fetcher), shutdown);
    if let Some(prompt) = prompt {
        harvester = harvester.with_prompt(prompt);
    }

    let report = harvester.run(&scope).await?;

    println!();
    println!("Entities:      {} ({} failed)", report.entities, report.entities_failed);
    println!("Posts:         {}", report.posts);
    println!("New saved:     {}", report.new_saved);
    println!("Already saved: {}", report.already_saved);
    println!("Not saved:     {}", report.not_saved);
    println!("Ignored:       {}", report.ignored);
    println!("Bonk:          {}", report.bonk);
    if report.pruned > 0 {
        println!("Pruned:        {}", report.pruned);
    }

    Ok(())
}

/// First Ctrl-C requests a clean stop, a second one exits immediately
fn spawn_interrupt_handler(shutdown: Shutdown, prompt: Option<Arc<dyn Prompt>>) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl-C: {}", e);
                return;
            }

            if shutdown.is_triggered() {
                eprintln!("Interrupted again, exiting");
                std::process::exit(130);
            }

            let again = async {
                let _ = tokio::signal::ctrl_c().await;
            };
            match on_interrupt(prompt.as_deref(), again).await {
                Interrupt::Stop => {
                    info!("Stopping after the current post");
                    shutdown.trigger();
                }
                Interrupt::Continue => {}
                Interrupt::Exit => {
                    eprintln!("Interrupted again, exiting");
                    std::process::exit(130);
                }
            }
        }
    });
}

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    Stop,
    Continue,
    Exit,
}

/// Resolve one Ctrl-C; `again` completes on the next one
async fn on_interrupt<F>(prompt: Option<&dyn Prompt>, again: F) -> Interrupt
where
    F: std::future::Future<Output = ()>,
{
    let Some(prompt) = prompt else {
        return Interrupt::Stop;
    };

    // the stdin read cannot be cancelled, so a second press has to win here
    tokio::select! {
        stop = prompt.confirm("Interrupted, stop harvesting?") => {
            if stop { Interrupt::Stop } else { Interrupt::Continue }
        }
        _ = again => Interrupt::Exit,
    }
}

fn setup(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => paths::config_file()?,
    };

    if path.exists() {
        bail!("Config file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        create_private_dir(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    write_private_file(&path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote example config to {}", path.display());
    println!("Edit it, then run `redd-harvest run`.");
    Ok(())
}

fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

fn write_private_file(path: &Path, content: &str) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}

/// Show the resolved configuration (for debugging)
fn show_config(path: Option<PathBuf>) -> Result<()> {
    let cfg = load_config(path)?;
    let g = &cfg.globals;

    println!("==============================================================");
    println!("  redd-harvest configuration");
    println!("==============================================================");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!();
    println!("Globals:");
    println!("  User agent:          {}", g.user_agent());
    println!("  Post limit:          {}", g.post_limit);
    println!("  Rate limit max wait: {}s", g.rate_limit_max_wait.as_secs());
    println!("  Backoff sleep:       {}s", g.backoff_sleep.as_secs_f64());
    println!("  Download folder:     {}", g.download_folder.display());
    println!("  Separate media:      {}", g.separate_media);
    println!("  Prune ignorables:    {}", g.prune_ignorables);
    println!("  Favor entity:        {}", g.favor_entity);
    println!("  Bonk:                {}", g.bonk);
    println!();
    print_entities("Redditors", &cfg.redditors);
    print_entities("Subreddits", &cfg.subreddits);
    print_names("Ignored redditors", &cfg.ignored_redditors);
    print_names("Ignored subreddits", &cfg.ignored_subreddits);

    println!("Links:");
    if cfg.links.is_empty() {
        println!("  (none)");
    }
    for link in &cfg.links {
        println!("  {}", link.base_url);
        if !link.direct_dl_extensions.is_empty() {
            println!("    extensions: {}", link.direct_dl_extensions.join(", "));
        }
        for search in &link.sub_searches {
            match &search.trigger_extension {
                Some(ext) => println!("    search ({}): {}", ext, search.pattern.as_str()),
                None => println!("    search: {}", search.pattern.as_str()),
            }
        }
    }

    Ok(())
}

fn print_entities(title: &str, entities: &[Entity]) {
    println!("{}:", title);
    if entities.is_empty() {
        println!("  (none)");
    }
    for entity in entities {
        let c = &entity.search_criteria;
        let toggle = c
            .sort_toggle
            .map(|t| format!("/{}", t))
            .unwrap_or_default();
        let alias = entity
            .alias
            .as_ref()
            .map(|a| format!(" as '{}'", a))
            .unwrap_or_default();
        println!(
            "  {}{} [{}] {} {}{}",
            entity.name, alias, entity.store_type, c.post_limit, c.sort_type, toggle
        );
    }
    println!();
}

fn print_names(title: &str, names: &[String]) {
    println!("{}:", title);
    if names.is_empty() {
        println!("  (none)");
    }
    for name in names {
        println!("  {}", name);
    }
    println!();
}
