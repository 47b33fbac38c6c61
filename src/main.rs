use anyhow::Result;
use clap::{Arg, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use yt_summarizer::pdf::{export_filename, PdfRenderer};
use yt_summarizer::pipeline::{AnalysisSession, SummaryPipeline};
use yt_summarizer::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("yt_summarizer=info,warn")
        .init();

    let matches = Command::new("YouTube Summarizer")
        .version("0.1.0")
        .about("Structured, exportable summaries for YouTube videos")
        .arg(
            Arg::new("url")
                .value_name("URL")
                .help("Video URL or bare 11-character video id")
                .required(true),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Output directory for summary artifacts"),
        )
        .arg(
            Arg::new("language")
                .short('l')
                .long("language")
                .value_name("LANG")
                .help("Preferred caption language"),
        )
        .arg(
            Arg::new("pdf")
                .long("pdf")
                .help("Export the summary as a PDF")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("image")
                .long("image")
                .value_name("FILE")
                .help("Attach a local image to the summary")
                .action(clap::ArgAction::Append),
        )
        .get_matches();

    let url = matches.get_one::<String>("url").unwrap();
    let export_pdf = matches.get_flag("pdf");

    let mut config = Config::load_or_default();
    if let Some(dir) = matches.get_one::<String>("output-dir") {
        config.output.output_dir = PathBuf::from(dir);
    }
    if let Some(language) = matches.get_one::<String>("language") {
        config.pipeline.language = Some(language.clone());
    }

    info!("Analyzing {}", url);
    let pipeline = Arc::new(SummaryPipeline::from_config(&config));
    let session = AnalysisSession::new(pipeline);

    let data = session.analyze(url).await;
    if let Some(message) = &data.error {
        error!("Analysis failed: {}", message);
        return Err(anyhow::anyhow!("analysis failed: {}", message));
    }

    if let Some(images) = matches.get_many::<String>("image") {
        // Uploads are append-only and independent; run them concurrently
        let attachments = futures::future::join_all(images.map(|image| {
            let session = &session;
            async move { (image, session.attach_image(Path::new(image)).await) }
        }))
        .await;

        for (image, token) in attachments {
            match token {
                Some(token) => info!("Attached image {} as {}", image, token),
                None => warn!("Could not attach image {}", image),
            }
        }
    }

    let data = session.current().await;
    let details = data
        .video_details
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("no video details in terminal state"))?;
    let summary = data
        .summary
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("no summary in terminal state"))?;

    info!("Title:      {}", details.title);
    info!("Channel:    {}", details.channel);
    info!("Key points: {}", summary.key_points.len());
    info!("Snippets:   {}", summary.code.len());

    tokio::fs::create_dir_all(&config.output.output_dir).await?;

    if config.output.write_json {
        let json_path = config
            .output
            .output_dir
            .join(format!("{}.json", details.video_id));
        tokio::fs::write(&json_path, serde_json::to_vec_pretty(&data)?).await?;
        info!("Summary written to {}", json_path.display());
    }

    if export_pdf {
        let renderer = PdfRenderer::new(config.pdf.clone());
        let bytes = renderer.render(details, summary)?;
        let pdf_path = config.output.output_dir.join(export_filename(&details.title));
        tokio::fs::write(&pdf_path, bytes).await?;
        info!("PDF written to {}", pdf_path.display());
    }

    Ok(())
}
