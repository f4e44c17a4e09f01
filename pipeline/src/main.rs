use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use image_pipeline::discover::ImageDiscoverer;
use image_pipeline::{ImagePipeline, Orchestrator, PipelineConfig, Report};

#[derive(Parser)]
#[command(name = "image-pipeline")]
#[command(about = "Search, validate, download and describe images for a query")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (default: ~/.config/image-pipeline/config.toml)
    #[arg(long, env = "IMAGE_PIPELINE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: text search, images, combined analysis
    Run {
        /// Search query
        query: String,
    },
    /// List candidate image URLs for a query
    Discover {
        /// Search query
        query: String,
        /// Maximum number of candidates (default: from config)
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// Probe a URL and report whether it is an admissible image
    Validate {
        /// Image URL
        url: String,
    },
    /// Download and normalize an image, saving it as JPEG
    Download {
        /// Image URL
        url: String,
        /// Where to write the JPEG
        #[arg(long, short)]
        output: PathBuf,
        /// Attempt budget (default: from config)
        #[arg(long)]
        attempts: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    image_pipeline::init_tracing("image_pipeline")?;

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load_at(path)?,
        None => PipelineConfig::load()?,
    };

    match cli.command {
        Commands::Run { query } => {
            // Only a full run needs text search and the result store
            let orchestrator = Orchestrator::from_config(&config)?;
            let report = orchestrator.run(&query).await?;
            print_report(&report, cli.json)?;
        }
        Commands::Discover { query, limit } => {
            let limit = limit.unwrap_or(config.discovery.limit);
            let images = ImagePipeline::with_ollama(&config)?;
            let discovery = images.discoverer().discover(&query, limit).await;
            if let Some(error) = &discovery.error {
                eprintln!("Error scraping images: {}", error);
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&discovery.candidates)?);
            } else {
                for url in &discovery.candidates {
                    println!("{}", url);
                }
            }
        }
        Commands::Validate { url } => {
            let images = ImagePipeline::with_ollama(&config)?;
            let result = images.validator().inspect(&url).await;
            if cli.json {
                let value = match &result {
                    Ok(info) => serde_json::json!({ "valid": true, "info": info }),
                    Err(rejection) => {
                        serde_json::json!({ "valid": false, "reason": rejection.to_string() })
                    }
                };
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                match &result {
                    Ok(info) => println!(
                        "valid: {} {}x{} ({})",
                        info.format, info.width, info.height, info.content_type
                    ),
                    Err(rejection) => println!("rejected: {}", rejection),
                }
            }
        }
        Commands::Download {
            url,
            output,
            attempts,
        } => {
            let images = ImagePipeline::with_ollama(&config)?;
            let downloader = images.processor().downloader();
            let attempts = attempts.unwrap_or(downloader.max_attempts());
            let resource = downloader.download_with_attempts(&url, attempts).await?;
            let saved = resource
                .persist(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("{}", saved.display());
        }
    }

    Ok(())
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
        return Ok(());
    }

    println!("== Text Analysis ==\n{}\n", report.text_results);
    if let Some(warning) = &report.storage_warning {
        eprintln!("Warning: {}", warning);
    }
    if let Some(error) = &report.images.discovery.error {
        eprintln!("Error scraping images: {}", error);
    }

    println!("== Image Analysis ==");
    for analysis in &report.images.analyses {
        println!("[{}] {}\n{}\n", analysis.index + 1, analysis.url, analysis.outcome);
    }

    println!("== Combined Analysis ==");
    match &report.synthesis {
        Ok(text) => println!("{}", text),
        Err(reason) => eprintln!("Error: {}", reason),
    }
    Ok(())
}
