use clap::{Parser, Subcommand};
use cli::{collect_inputs, process_batch, ChannelSource, CliConfig};
use color_eyre::eyre::Result;
use regions::Pipeline;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Binarize images and measure their regions
    Process {
        /// Image file or directory of images
        #[arg(short, long)]
        input: PathBuf,
        /// Directory receiving one sub-directory of artifacts per image
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
        /// Path to a TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Images processed concurrently (defaults to the number of CPUs)
        #[arg(short, long)]
        jobs: Option<usize>,
        /// Channel fed to the pipeline, overrides the configuration file
        #[arg(long, value_enum)]
        channel: Option<ChannelSource>,
    },
    /// Write the default configuration to a .toml or .json file
    Init {
        /// Path to save the generated configuration
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the JSON schema of the configuration file
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            config,
            jobs,
            channel,
        } => {
            process_images(&input, &output, config.as_deref(), jobs, channel).await?;
        }
        Commands::Init { output } => {
            CliConfig::default().to_file(&output)?;
            info!("Default configuration saved to: {:?}", output);
        }
        Commands::Schema => {
            println!("{}", CliConfig::schema_json()?);
        }
    }

    Ok(())
}

async fn process_images(
    input: &Path,
    output: &Path,
    config_path: Option<&Path>,
    jobs: Option<usize>,
    channel: Option<ChannelSource>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => CliConfig::from_file(path)?,
        None => CliConfig::default(),
    };
    if let Some(source) = channel {
        config.channel.source = source;
    }

    let images = collect_inputs(input)?;
    if images.is_empty() {
        warn!("No images found in {:?}", input);
        return Ok(());
    }

    let pipeline = Arc::new(Pipeline::new(config.pipeline.clone())?);
    let channel = Arc::new(config.channel.clone());
    let jobs = jobs
        .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
        .unwrap_or(1)
        .max(1);

    std::fs::create_dir_all(output)?;
    info!(images = images.len(), jobs, "{}", pipeline.info());

    let summary = process_batch(images, output, pipeline, channel, jobs).await;
    info!(
        processed = summary.processed.len(),
        failed = summary.failed.len(),
        "Results written to {:?}",
        output
    );
    Ok(())
}
