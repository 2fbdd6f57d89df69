mod config;
mod export;
mod fetch;
mod model;
mod parse;
mod pipeline;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

#[derive(Parser)]
#[command(name = "linesheet", about = "Rep firm line sheet scraper")]
struct Cli {
    /// Rep firm website URL
    url: String,

    /// Official rep firm name (derived from the URL host when omitted)
    #[arg(short, long)]
    name: Option<String>,

    /// Output spreadsheet path (firm name + timestamp when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let written = pipeline::scrape_rep_firm_line_sheet(
        &cli.url,
        cli.name.as_deref(),
        cli.output.as_deref(),
    )
    .await?;

    println!("Line sheet saved to {}", written.display());

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("Done in {:.1}s", elapsed.as_secs_f64());
    }
    Ok(())
}
