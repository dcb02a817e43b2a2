use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dataverse_harvester::clean::{Cleaner, PassthroughCleaner};
use dataverse_harvester::harvest::{DatasetWriter, Harvester, DEFAULT_SEARCH_TERMS};
use dataverse_harvester::{DataverseClient, DataverseConfig};

#[derive(Parser, Debug)]
#[command(name = "dataverse-harvester", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the catalog and write flattened codebooks per dataset
    Harvest {
        /// Title search terms (defaults to the built-in list)
        terms: Vec<String>,
        #[arg(long, default_value = "data")]
        data_root: PathBuf,
    },
    /// Clean data.csv in every numbered dataset directory
    Clean {
        #[arg(long, default_value = "data")]
        data_root: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Harvest { terms, data_root } => {
            let cfg = DataverseConfig::from_env()?;
            tracing::info!(?cfg, root = %data_root.display(), "Starting harvest");

            let terms = if terms.is_empty() {
                DEFAULT_SEARCH_TERMS.iter().map(|t| t.to_string()).collect()
            } else {
                terms
            };

            let harvester = Harvester::new(DataverseClient::new(cfg)?, DatasetWriter::new(data_root));
            harvester.run(&terms).await?;
        }
        Command::Clean { data_root } => {
            Cleaner::new(PassthroughCleaner).run(&data_root)?;
        }
    }

    Ok(())
}
