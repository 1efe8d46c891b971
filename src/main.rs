//! # Project Index CLI (`pix`)
//!
//! Thin presentation layer over the client core: resolves the endpoint,
//! fetches and ranks projects, and renders them as plain text. Navigation
//! itself stays with the caller — `pix open` records the touch and prints
//! the project URL for the shell or OS opener to follow.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pix list` | Show recents and the full catalogue |
//! | `pix search <query>` | Fuzzy-search by name and description |
//! | `pix open <id>` | Record a touch and print the project URL |
//! | `pix validate` | Probe the endpoint for compatibility |
//! | `pix endpoint` | Show the resolved endpoint and its flavor |
//! | `pix recent` | Show the pruned recency list |
//! | `pix set-url <url>` | Store the fallback base URL preference |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use project_index::client::{parse_base, IndexClient};
use project_index::config::{self, Config};
use project_index::endpoint::{EndpointResolver, API_URL_KEY};
use project_index::flavor::Flavor;
use project_index::models::Project;
use project_index::recency::RecencyStore;
use project_index::search::{rank, Ranked};
use project_index::storage::{FileStore, KeyValueStore};

/// Project Index CLI — browse a personal project index and jump straight
/// to a project's external URL.
#[derive(Parser)]
#[command(
    name = "pix",
    about = "Browse a personal project index from the command line",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Defaults to the per-user config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show recently opened projects followed by the full catalogue.
    List,

    /// Fuzzy-search projects by name and description.
    Search {
        /// The search query string.
        query: String,
    },

    /// Record a touch for a project and print its URL.
    ///
    /// The URL is printed on stdout for the caller to navigate to; this
    /// command performs no browser launch itself.
    Open {
        /// Project id.
        id: String,
    },

    /// Probe the configured endpoint and report its metadata.
    Validate,

    /// Show the resolved endpoint, where it came from, and its flavor.
    Endpoint,

    /// Show the recency list, pruned against the live project set.
    Recent,

    /// Store the fallback base URL preference.
    SetUrl {
        /// Base URL of the project index API.
        url: String,
    },
}

/// Everything a command needs, wired from config.
struct App {
    config: Config,
    client: IndexClient,
    resolver: EndpointResolver,
    recency: RecencyStore,
    store: Arc<FileStore>,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let store = Arc::new(FileStore::new(config.store_path()));
        let resolver = EndpointResolver::new(config.endpoint_path(), store.clone());
        let recency = RecencyStore::new(store.clone());
        let client = IndexClient::new(config.api.key.clone())?;
        Ok(Self {
            config,
            client,
            resolver,
            recency,
            store,
        })
    }

    /// Resolve, fetch, and prune — the shared front half of every
    /// data-bearing command.
    async fn fetch_current(&self) -> Result<(String, Vec<Project>)> {
        let endpoint = self.resolver.resolve().await?;
        let projects = self.client.fetch_projects(&endpoint.url).await?;

        let valid: HashSet<String> = projects.iter().map(|p| p.id.clone()).collect();
        if let Err(err) = self.recency.prune(&valid).await {
            warn!("failed to prune recency list: {}", err);
        }

        Ok((endpoint.url, projects))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;
    let app = App::new(config)?;

    match cli.command {
        Commands::List => run_list(&app).await,
        Commands::Search { query } => run_search(&app, &query).await,
        Commands::Open { id } => run_open(&app, &id).await,
        Commands::Validate => run_validate(&app).await,
        Commands::Endpoint => run_endpoint(&app).await,
        Commands::Recent => run_recent(&app).await,
        Commands::SetUrl { url } => run_set_url(&app, &url).await,
    }
}

async fn run_list(app: &App) -> Result<()> {
    let (url, projects) = app.fetch_current().await?;
    let recents = app.recency.get().await;
    let display_count = app.config.search.recent_display_count;

    match rank(&projects, "", &recents, display_count) {
        Ranked::Sections { recent, remainder } => {
            if !recent.is_empty() {
                println!("--- Recent ---");
                for project in &recent {
                    print_project(project);
                }
                println!();
            }
            println!(
                "--- Projects ({} projects via {}) ---",
                projects.len(),
                Flavor::detect(&url)
            );
            for project in &remainder {
                print_project(project);
            }
        }
        Ranked::Matches(_) => unreachable!("empty query always sections"),
    }

    Ok(())
}

async fn run_search(app: &App, query: &str) -> Result<()> {
    let (_, projects) = app.fetch_current().await?;
    let recents = app.recency.get().await;

    match rank(&projects, query, &recents, app.config.search.recent_display_count) {
        Ranked::Matches(matches) if matches.is_empty() => println!("No results."),
        Ranked::Matches(matches) => {
            for scored in &matches {
                print_project(&scored.project);
            }
        }
        Ranked::Sections { recent, remainder } => {
            // blank query falls back to the sectioned view
            for project in recent.iter().chain(remainder.iter()) {
                print_project(project);
            }
        }
    }

    Ok(())
}

async fn run_open(app: &App, id: &str) -> Result<()> {
    let (url, projects) = app.fetch_current().await?;

    let project = projects
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| anyhow::anyhow!("project not found: {}", id))?;

    // Recency and the backend touch are fire-and-forget relative to
    // navigation: failures are reported, never block the URL.
    if let Err(err) = app.recency.add(id).await {
        warn!("failed to record recent project: {}", err);
    }
    if Flavor::detect(&url) == Flavor::SupabaseRest {
        if let Err(err) = app.client.touch_project(&url, id).await {
            warn!("touch failed: {}", err);
        }
    }

    println!("{}", project.open_url);
    Ok(())
}

async fn run_validate(app: &App) -> Result<()> {
    let endpoint = app.resolver.resolve().await?;
    let meta = app.client.validate(&endpoint.url).await?;
    println!("{}", meta.display_description());
    Ok(())
}

async fn run_endpoint(app: &App) -> Result<()> {
    match app.resolver.resolve_opt().await {
        Some(endpoint) => {
            println!("url:    {}", endpoint.url);
            println!("source: {}", endpoint.source);
            println!("flavor: {}", Flavor::detect(&endpoint.url));
        }
        None => println!("API URL not configured."),
    }
    Ok(())
}

async fn run_recent(app: &App) -> Result<()> {
    let (_, projects) = app.fetch_current().await?;
    let recents = app.recency.get().await;

    if recents.is_empty() {
        println!("No recent projects.");
        return Ok(());
    }
    for id in &recents {
        if let Some(project) = projects.iter().find(|p| &p.id == id) {
            print_project(project);
        }
    }
    Ok(())
}

async fn run_set_url(app: &App, url: &str) -> Result<()> {
    parse_base(url)?;
    app.store.set(API_URL_KEY, url.trim()).await?;
    println!("Preference saved.");
    Ok(())
}

fn print_project(project: &Project) {
    match project.description.as_deref() {
        Some(desc) if !desc.is_empty() => {
            println!("{:<32} {}  ({})", project.name, project.open_url, desc)
        }
        _ => println!("{:<32} {}", project.name, project.open_url),
    }
}
