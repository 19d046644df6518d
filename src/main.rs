use anyhow::{bail, Result};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use tree_stats::config::{self, AppConfig};
use tree_stats::core::{FileStore, TreeGenerator};
use tree_stats::utils::format::{format_file_count, format_size};

const DEFAULT_LOG_FILTER: &str = "info";

/// Scan files and folders, keep the ones with allowed extensions, and report sizes.
#[derive(Parser, Debug)]
#[command(name = "tree-stats", version, about)]
struct Cli {
    /// Files or folders to scan. Falls back to the last session's roots when
    /// `restore_last_paths` is enabled in the config.
    paths: Vec<PathBuf>,

    /// Comma-separated allow-list overriding the configured one (e.g. `png,jpg`)
    #[arg(long, value_delimiter = ',')]
    ext: Vec<String>,

    /// Path to a config file instead of the platform default
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the result as JSON instead of a tree
    #[arg(long)]
    json: bool,

    /// Descend into symbolic links
    #[arg(long)]
    follow_symlinks: bool,

    /// Maximum number of concurrent filesystem calls
    #[arg(long)]
    max_concurrent_io: Option<usize>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match config::settings::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Could not load config ({}), using defaults", e);
            AppConfig::default()
        }
    };

    if !cli.ext.is_empty() {
        config.allowed_extensions = cli.ext.clone();
        config = config.normalized();
    }
    if cli.follow_symlinks {
        config.follow_symlinks = true;
    }
    if cli.max_concurrent_io.is_some() {
        config.max_concurrent_io = cli.max_concurrent_io;
    }

    let paths = if !cli.paths.is_empty() {
        cli.paths.clone()
    } else if config.restore_last_paths {
        config.last_paths.clone()
    } else {
        Vec::new()
    };
    if paths.is_empty() {
        bail!("no paths given");
    }
    if config.allowed_extensions.is_empty() {
        bail!("the extension allow-list is empty");
    }

    let builder = config.tree_builder()?;
    let mut store = FileStore::new();
    store.add_items_from_paths(&builder, &paths).await;

    if cli.json {
        let report = json!({
            "items": store.items(),
            "totalSize": store.total_size(),
            "totalItems": store.total_items(),
            "sourcePaths": store.source_paths(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if store.is_empty() {
        println!(
            "No files with extensions [{}] found.",
            config.allowed_extensions.join(", ")
        );
        return Ok(());
    }

    print!("{}", TreeGenerator::generate_tree(store.items()));
    println!(
        "\nTotal: {} in {}",
        format_size(store.total_size()),
        format_file_count(store.total_items())
    );
    Ok(())
}
