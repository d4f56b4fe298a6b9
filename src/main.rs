use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use embed_registry::archive::ArchiveSource;
use embed_registry::config::Config;
use embed_registry::registry::{Registry, UploadRequest};
use embed_registry::storage::Database;

#[derive(Parser)]
#[command(name = "embed-registry")]
#[command(author, version, about = "Registry for embeddable static web asset bundles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List all projects, newest first
    List,

    /// Upload a project archive (create, or replace with --force)
    Upload {
        /// Project slug (lowercase letters, digits, and hyphens)
        slug: String,
        /// Path to a zip archive of the project's assets
        archive: PathBuf,
        /// Display name (defaults to the slug)
        #[arg(long)]
        name: Option<String>,
        /// Embed shortcode (defaults to the slug)
        #[arg(long)]
        shortcode: Option<String>,
        /// Version recorded for this upload
        #[arg(long, default_value = "1.0.0")]
        version: String,
        /// Replace an existing project under the same slug
        #[arg(short, long)]
        force: bool,
    },

    /// Show a project's metadata and current asset summary
    Info { slug: String },

    /// Delete a project and its extracted assets
    Delete {
        slug: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = Cli::parse();

    let config = Config::load()?;
    let db = Database::open(&config.data_dir)?;
    let registry = Registry::new(&config, db)?;
    info!(tenant = %registry.tenant_id(), "Registry opened");

    match cli.command {
        Commands::List => cmd_list(&registry, cli.format, cli.quiet),

        Commands::Upload {
            slug,
            archive,
            name,
            shortcode,
            version,
            force,
        } => {
            // Transport-level size limit; missing files fall through to the
            // validator so they fail with the proper error kind.
            if let Ok(metadata) = std::fs::metadata(&archive) {
                if metadata.len() > config.max_upload_size {
                    anyhow::bail!(
                        "archive exceeds maximum upload size of {} bytes",
                        config.max_upload_size
                    );
                }
            }

            let request = UploadRequest {
                slug,
                name,
                shortcode,
                version,
                source: ArchiveSource::from_path(archive),
                force,
            };
            cmd_upload(&registry, request, cli.format, cli.quiet).await
        }

        Commands::Info { slug } => cmd_info(&registry, &slug, cli.format),

        Commands::Delete { slug, yes } => cmd_delete(&registry, &slug, yes, cli.quiet).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

fn cmd_list(registry: &Registry, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let projects = registry.list()?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
        return Ok(());
    }

    if projects.is_empty() {
        if !quiet {
            println!("No projects found.");
            println!("\nUpload one with: embed-registry upload <slug> <archive.zip>");
        }
        return Ok(());
    }

    if !quiet {
        println!("Projects:");
    }
    for p in projects {
        println!(
            "  {}  v{}  [{}]  {}",
            p.slug,
            p.version,
            p.shortcode,
            p.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

async fn cmd_upload(
    registry: &Registry,
    request: UploadRequest,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let outcome = registry.upload(request).await?;

    if let Some(warning) = &outcome.warning {
        eprintln!("warning: {warning}");
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if !quiet {
        // A replace refreshes updated_at; a fresh upload leaves them equal.
        let verb = if outcome.project.updated_at == outcome.project.created_at {
            "created"
        } else {
            "replaced"
        };
        println!("Project '{}' {verb}.", outcome.project.slug);
        println!("  Name: {}", outcome.project.project_name);
        println!("  Shortcode: {}", outcome.project.shortcode);
        println!("  Version: {}", outcome.project.version);
        println!(
            "  Assets: {} files ({} js, {} css, {} other), {} bytes",
            outcome.assets.file_count(),
            outcome.assets.js_count,
            outcome.assets.css_count,
            outcome.assets.other_count,
            outcome.assets.total_bytes
        );
        println!("  Path: {}", outcome.project.file_path.display());
    }
    Ok(())
}

fn cmd_info(registry: &Registry, slug: &str, format: OutputFormat) -> anyhow::Result<()> {
    let info = registry.info(slug)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Project: {}", info.project.project_name);
    println!("  Slug: {}", info.project.slug);
    println!("  Shortcode: {}", info.project.shortcode);
    println!("  Version: {}", info.project.version);
    println!(
        "  Assets: {} files ({} js, {} css, {} other), {} bytes",
        info.assets.file_count(),
        info.assets.js_count,
        info.assets.css_count,
        info.assets.other_count,
        info.assets.total_bytes
    );
    println!("  Path: {}", info.project.file_path.display());
    println!(
        "  Created: {}",
        info.project.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated: {}",
        info.project.updated_at.format("%Y-%m-%d %H:%M:%S")
    );
    Ok(())
}

async fn cmd_delete(
    registry: &Registry,
    slug: &str,
    yes: bool,
    quiet: bool,
) -> anyhow::Result<()> {
    if !yes {
        print!("Permanently delete project '{slug}' and its assets? [y/N] ");
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        let answer = answer.trim().to_ascii_lowercase();
        if answer != "y" && answer != "yes" {
            if !quiet {
                println!("Aborted.");
            }
            return Ok(());
        }
    }

    let outcome = registry.delete(slug).await?;

    if let Some(warning) = &outcome.warning {
        eprintln!("warning: {warning}");
    }

    if !quiet {
        println!("Project '{slug}' deleted.");
    }
    Ok(())
}
