//! toolkit demo applications

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use toolkit::{config::ToolkitConfig, observability};
use toolkit_cli::{DownloadCommand, JsonCommand, SlugCommand, UploadCommand};

#[derive(Parser)]
#[command(name = "toolkit-demo")]
#[command(version)]
#[command(about = "Demo servers for the toolkit crate", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the standard search path)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the multipart upload endpoints
    Upload {
        /// Port to listen on (default 8080)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Serve the JSON exchange endpoints
    Json {
        /// Port to listen on (default 8081)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Serve the single-file download endpoint
    Download {
        /// Port to listen on (default 8080)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the slug of a piece of text
    Slug {
        /// Text to slugify
        text: Option<String>,
    },
}

impl Commands {
    const fn service_name(&self) -> &'static str {
        match self {
            Self::Upload { .. } => "upload",
            Self::Json { .. } => "json",
            Self::Download { .. } => "download",
            Self::Slug { .. } => "slug",
        }
    }
}

fn load_config(path: Option<PathBuf>, service: &str) -> Result<ToolkitConfig> {
    path.map_or_else(
        || ToolkitConfig::load_for_service(service),
        ToolkitConfig::load_from,
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let service = cli.command.service_name();

    let mut config = load_config(cli.config, service)?;
    config.logging.service_name = service.to_string();
    observability::init_with(&config.logging)?;

    match cli.command {
        Commands::Upload { port } => UploadCommand::new(config, port).execute().await?,
        Commands::Json { port } => JsonCommand::new(config, port).execute().await?,
        Commands::Download { port } => DownloadCommand::new(config, port).execute().await?,
        Commands::Slug { text } => SlugCommand::new(text).execute()?,
    }

    Ok(())
}
