use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wikithread::cli::Cli;
use wikithread::pipeline;
use wikithread::wiki::WikiClient;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, out) = cli.into_parts();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_verbosity.as_directive()))
        .init();

    let source = WikiClient::new();
    let corpus = pipeline::get_corpus(&source, &config).await?;

    let json = serde_json::to_string_pretty(&corpus)?;
    match out {
        Some(path) => std::fs::write(&path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
