//! Site-Distill main entry point
//!
//! This is the command-line interface for the Site-Distill content extractor.

use clap::Parser;
use site_distill::config::{load_config_with_hash, Config};
use site_distill::crawler::crawl;
use site_distill::output::print_summary;
use site_distill::storage::{ContentStore, JsonStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site-Distill: turns a page-builder site into local content records
///
/// Site-Distill reads the site's sitemaps, mirrors every origin asset once, separates
/// the site-wide header and footer from page content, and writes one JSON record per
/// page that references only local paths.
#[derive(Parser, Debug)]
#[command(name = "site-distill")]
#[command(version = "1.0.0")]
#[command(about = "Extracts a page-builder site into a local content model", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be extracted without fetching anything
    #[arg(long, conflicts_with = "routes")]
    dry_run: bool,

    /// List the routes of an existing output directory and exit
    #[arg(long, conflicts_with = "dry_run")]
    routes: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.routes {
        handle_routes(&config)?;
    } else {
        handle_run(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_distill=info,warn"),
            1 => EnvFilter::new("site_distill=debug,info"),
            2 => EnvFilter::new("site_distill=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the resolved settings
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Site-Distill Dry Run ===\n");

    println!("Site:");
    println!("  Origin: {}", config.site.origin);
    println!(
        "  Reference page: {}",
        config.site.reference_page.as_deref().unwrap_or("/")
    );

    println!("\nSitemaps ({}):", config.site.sitemaps.len());
    for sitemap in &config.site.sitemaps {
        println!("  - {}", sitemap);
    }

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nOutput:");
    println!("  Data directory: {}", config.output.data_dir);
    println!("  Public directory: {}", config.output.public_dir);

    println!("\nAssets:");
    println!(
        "  {} -> {}",
        config.assets.uploads_prefix, config.assets.images_prefix
    );
    println!("  Static root: {}", config.assets.static_root);
    println!(
        "  Max concurrent downloads: {}",
        config.assets.max_concurrent_downloads
    );
    println!("  Max redirects: {}", config.assets.max_redirects);
    println!("  Timeout: {}s", config.assets.timeout_secs);

    println!("\nFragments:");
    for marker in [&config.header, &config.footer] {
        println!("  - {}: {}", marker.name, marker.selector);
        println!("    style marker: {}", marker.style_marker);
        println!("    stylesheets: {}", marker.css_files.join(", "));
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would read {} sitemaps from {}",
        config.site.sitemaps.len(),
        config.site.origin
    );

    Ok(())
}

/// Handles the --routes mode: lists routes from the existing output
fn handle_routes(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Data directory: {}\n", config.output.data_dir);

    let store = JsonStore::new(&config.output.data_dir);
    let routes = store.list_routes()?;

    println!("Routes ({}):", routes.len());
    for route in &routes {
        println!("  {} -> pages/{}.json", route.path, route.slug);
    }

    Ok(())
}

/// Handles the main run
async fn handle_run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Origin: {}, Sitemaps: {}",
        config.site.origin,
        config.site.sitemaps.len()
    );

    match crawl(config).await {
        Ok(summary) => {
            tracing::info!("Run completed successfully");
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}
