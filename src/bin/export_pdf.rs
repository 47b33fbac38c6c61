//! Render a previously saved summary JSON into a PDF without re-analyzing.

use anyhow::{anyhow, Result};
use clap::{Arg, Command};
use std::path::PathBuf;
use tracing::info;

use yt_summarizer::pdf::{export_filename, PdfRenderer};
use yt_summarizer::summary::SummaryData;
use yt_summarizer::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("yt_summarizer=info,warn")
        .init();

    let matches = Command::new("export-pdf")
        .version("0.1.0")
        .about("Render a saved summary JSON into a PDF")
        .arg(
            Arg::new("summary")
                .value_name("FILE")
                .help("Summary JSON produced by yt-summarizer")
                .required(true),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Output directory for the PDF"),
        )
        .get_matches();

    let summary_path = PathBuf::from(matches.get_one::<String>("summary").unwrap());
    let content = tokio::fs::read_to_string(&summary_path).await?;
    let data: SummaryData = serde_json::from_str(&content)?;

    let details = data
        .video_details
        .as_ref()
        .ok_or_else(|| anyhow!("summary file has no video details"))?;
    let summary = data
        .summary
        .as_ref()
        .ok_or_else(|| anyhow!("summary file has no summary content"))?;

    let config = Config::load_or_default();
    let output_dir = matches
        .get_one::<String>("output-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.output.output_dir.clone());

    let renderer = PdfRenderer::new(config.pdf.clone());
    let bytes = renderer.render(details, summary)?;

    tokio::fs::create_dir_all(&output_dir).await?;
    let pdf_path = output_dir.join(export_filename(&details.title));
    tokio::fs::write(&pdf_path, bytes).await?;
    info!("PDF written to {}", pdf_path.display());

    Ok(())
}
