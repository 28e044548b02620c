//! Skylift CLI - Command line interface for drive operations.
//!
//! Reads OAuth2 credentials from the environment, then exposes token
//! fetching, chunked upload with a progress readout, and root listing.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use skylift_common::RemotePath;
use skylift_onedrive::{Credentials, OneDriveClient, ProgressHandler};

#[derive(Parser)]
#[command(name = "skylift")]
#[command(about = "Skylift - OneDrive uploads and listings")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch an access token and print it.
    Token,

    /// Upload a file in 20 MiB chunks.
    Upload {
        /// Source file to upload.
        source: PathBuf,

        /// Destination folder inside the drive (default: root).
        #[arg(short, long)]
        dest: Option<String>,

        /// Name to store the file under (default: source file name).
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List the children of the drive root.
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let credentials =
        Credentials::from_env().context("Failed to load credentials from environment")?;
    let client = OneDriveClient::new(credentials).context("Failed to build client")?;

    match cli.command {
        Commands::Token => cmd_token(&client).await,

        Commands::Upload { source, dest, name } => {
            cmd_upload(&client, &source, dest.as_deref(), name.as_deref()).await
        }

        Commands::List => cmd_list(&client).await,
    }
}

/// Fetch and print a bearer token.
async fn cmd_token(client: &OneDriveClient) -> Result<()> {
    let token = client.access_token().await?;
    println!("{token}");
    Ok(())
}

/// Upload a file, printing progress percentages in place.
async fn cmd_upload(
    client: &OneDriveClient,
    source: &Path,
    dest: Option<&str>,
    name: Option<&str>,
) -> Result<()> {
    let dest = dest
        .map(RemotePath::parse)
        .transpose()
        .context("Invalid destination path")?;

    info!("Uploading {}", source.display());

    let progress: ProgressHandler = Arc::new(|percent| {
        print!("\rUploading... {percent}%");
        let _ = std::io::stdout().flush();
    });

    let outcome = client
        .upload_file(source, dest.as_ref(), name, Some(progress))
        .await?;

    println!();
    println!("{}", outcome.message);
    Ok(())
}

/// List root children with their download links.
async fn cmd_list(client: &OneDriveClient) -> Result<()> {
    let items = client.list_children().await?;

    for item in &items {
        let link = item.download_url.as_deref().unwrap_or("-");
        println!("{}  {}  {}", item.id, item.name, link);
    }
    println!("{} item(s)", items.len());

    Ok(())
}
