mod config;

use std::collections::HashMap;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use iac_review_core::{
    llm, ArtifactSink, Console, Destination, LlmSettings, LocalSink, Palette, Pipeline, S3Sink,
    StorageSettings, TerrascanRunner,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(
    name = "iac-review",
    author,
    version,
    about = "Scan Terraform with Terrascan and publish an AI security review"
)]
struct Cli {
    /// S3 bucket for results; omit to write into the current directory
    #[arg(long, value_name = "NAME")]
    bucket: Option<String>,

    /// Optional configuration file (TOML, YAML, or JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let mut console = Console::new(io::stdout(), Palette::detect());
    match run(cli, &mut console).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            console.fatal(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, console: &mut Console<Stdout>) -> Result<u8> {
    let vars: HashMap<String, String> = std::env::vars().collect();
    let app_config = AppConfig::load(cli.config.as_deref())?;
    let settings = LlmSettings::from_map(&vars, &app_config.llm)?;
    let storage = StorageSettings::from_map(&vars, &app_config.storage)?;
    let workdir = std::env::current_dir().context("failed to resolve current directory")?;

    let runner = TerrascanRunner::new(app_config.scanner_program(&vars), &workdir);
    debug!(
        scanner = runner.program(),
        provider = %settings.provider,
        model = %settings.model,
        "configured review run"
    );
    let summarizer = llm::connect(&settings).await?;
    let sink: Box<dyn ArtifactSink> = match Destination::from_bucket(cli.bucket) {
        Destination::Local => Box::new(LocalSink::new(&workdir)),
        Destination::ObjectStore { bucket } => Box::new(
            S3Sink::connect(bucket, storage.region.as_deref(), storage.timeout).await,
        ),
    };

    let report = Pipeline::new(&runner, summarizer.as_ref(), sink.as_ref())
        .run(console)
        .await?;
    Ok(report.verdict.exit_code())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tokio=warn,aws_config=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();
}
