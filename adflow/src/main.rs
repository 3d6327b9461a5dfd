//! Adflow CLI: runs the content pipeline once and prints the run summary.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use adflow::collaborators::Collaborators;
use adflow::config::{AppConfig, RunFilters, RunFlags};
use adflow::events::LoggingEventSink;
use adflow::observability::{init_tracing, LogFormat};
use adflow::pipeline::{Orchestrator, RunResult};

/// Generate ad copy, UGC scripts and UGC videos for a product catalog.
#[derive(Debug, Parser)]
#[command(name = "adflow", version, about)]
struct Cli {
    /// Directory holding brand.json, platforms.json and tools.json
    #[arg(long, env = "ADFLOW_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Directory holding the artifact stores
    #[arg(long, env = "ADFLOW_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Product feed: a JSON or CSV file path, or an http(s) URL
    #[arg(long, env = "ADFLOW_FEED")]
    feed: Option<String>,

    /// Only process this product id
    #[arg(long)]
    product_id: Option<String>,

    /// Only generate ads for this platform
    #[arg(long)]
    platform: Option<String>,

    /// Only generate scripts and videos of this UGC type
    #[arg(long)]
    ugc_type: Option<String>,

    /// Skip image enhancement
    #[arg(long)]
    skip_images: bool,

    /// Skip background removal
    #[arg(long)]
    skip_backgrounds: bool,

    /// Skip lifestyle scene generation
    #[arg(long)]
    skip_lifestyle: bool,

    /// Skip video rendering
    #[arg(long)]
    skip_videos: bool,

    /// Count the videos that would be rendered without submitting any
    #[arg(long)]
    dry_run: bool,

    /// Only generate ad copy
    #[arg(long, conflicts_with_all = ["scripts_only", "export_only"])]
    ads_only: bool,

    /// Only generate UGC scripts
    #[arg(long, conflicts_with = "export_only")]
    scripts_only: bool,

    /// Only export what is already stored
    #[arg(long)]
    export_only: bool,

    /// Log output format (compact or json)
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,
}

impl Cli {
    fn flags(&self) -> RunFlags {
        RunFlags {
            skip_images: self.skip_images,
            skip_backgrounds: self.skip_backgrounds,
            skip_lifestyle: self.skip_lifestyle,
            skip_videos: self.skip_videos,
            dry_run: self.dry_run,
            ads_only: self.ads_only,
            scripts_only: self.scripts_only,
            export_only: self.export_only,
        }
    }

    fn filters(&self) -> RunFilters {
        RunFilters {
            product_id: self.product_id.clone(),
            platform: self.platform.clone(),
            ugc_type: self.ugc_type.clone(),
        }
    }

    fn config(&self) -> anyhow::Result<AppConfig> {
        let mut config = AppConfig::load(&self.config_dir, &self.data_dir)
            .with_context(|| format!("loading config from {}", self.config_dir.display()))?
            .with_flags(self.flags())
            .with_filters(self.filters());
        if let Some(feed) = &self.feed {
            config = config.with_feed(feed.clone());
        }
        Ok(config)
    }
}

async fn run(cli: &Cli) -> anyhow::Result<RunResult> {
    let config = cli.config()?;
    let collaborators = Collaborators::from_config(&config).context("setting up collaborators")?;
    tracing::debug!(?collaborators, "Collaborators ready");

    let orchestrator = Orchestrator::new(config, collaborators).with_events(Arc::new(LoggingEventSink::debug()));
    Ok(orchestrator.run().await)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.log_format) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run(&cli).await {
        Ok(result) => {
            println!("{}", result.render());
            if result.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
