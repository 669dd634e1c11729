//! `evmarket`: terminal front-end for the EV & battery marketplace.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use evmarket_core::pages::ListingKind;
use evmarket_core::{ApiClient, ClientConfig, FileStore, ListingService, Session, UreqTransport};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "evmarket", about = "Browse and post EV and battery listings", version)]
struct Cli {
    /// Backend origin. Falls back to `EVMARKET_API_BASE`.
    #[arg(long, global = true, value_name = "url")]
    api_base: Option<String>,
    /// Where the bearer token is kept. Falls back to `EVMARKET_SESSION_FILE`.
    #[arg(long, global = true, value_name = "path")]
    session_file: Option<PathBuf>,
    /// Listings per page. Falls back to `EVMARKET_PAGE_SIZE`.
    #[arg(long, global = true, value_name = "n")]
    page_size: Option<u32>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Probe `/api/health`.
    Health,
    /// Featured listings from the landing page.
    Home,
    /// List categories.
    Categories,
    /// Browse listings, optionally filtered.
    Browse {
        #[arg(long)]
        category: Option<i64>,
        #[arg(long, short)]
        query: Option<String>,
        /// One-based page number.
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show one listing.
    Show { id: String },
    /// Listings posted by a user.
    User {
        id: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Post a new listing.
    Post {
        #[arg(value_enum)]
        kind: Kind,
        /// Form input as `field=value`, e.g. `--set title="VinFast VF8"`.
        #[arg(long = "set", value_name = "field=value", value_parser = parse_assignment)]
        fields: Vec<(String, String)>,
        /// Accept the posting terms.
        #[arg(long)]
        agree_terms: bool,
        /// Image files to attach after the listing is created.
        #[arg(long = "image", value_name = "path")]
        images: Vec<PathBuf>,
    },
    /// Change price or text on one of your listings.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        contract: Option<String>,
    },
    /// Delete one of your listings.
    Delete { id: String },
    /// Posting quota for the signed-in user.
    Limits,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
    },
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Vehicle,
    Battery,
}

impl From<Kind> for ListingKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Vehicle => ListingKind::Vehicle,
            Kind::Battery => ListingKind::Battery,
        }
    }
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got `{raw}`"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in `{raw}`"));
    }
    Ok((field.to_string(), value.to_string()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    tracing::debug!(api_base = %config.api_base, session = %config.session_file.display(), "starting");

    let session = Session::load(FileStore::new(&config.session_file))
        .with_context(|| format!("read session from {}", config.session_file.display()))?;
    let client = ApiClient::new(&config.api_base, Arc::new(session));
    let service = ListingService::new(client, UreqTransport::new());

    commands::run(&service, &config, cli.command)
}

fn resolve_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("read environment")?;
    if let Some(api_base) = &cli.api_base {
        config.api_base.clone_from(api_base);
    }
    if let Some(path) = &cli.session_file {
        config.session_file.clone_from(path);
    }
    if let Some(size) = cli.page_size.filter(|s| *s > 0) {
        config.page_size = size;
    }
    Ok(config)
}
