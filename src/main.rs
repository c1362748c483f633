//! websec-surface: collect a web application's client-visible attack surface
//! and annotate it with LLM security commentary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use websec_surface::{
    Analyzer, ChromiumProbe, CrawlReport, OllamaBackend, ScanConfig, ScanSession, UploadReport,
    UploadedFile,
};

#[derive(Parser)]
#[command(name = "websec-surface")]
#[command(about = "Collect a web application's attack surface for security review")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a target URL and capture its API traffic
    Scan {
        /// URL of the web application
        url: String,

        /// Extra files to analyse alongside the crawl
        #[arg(short, long = "upload")]
        uploads: Vec<PathBuf>,

        /// Skip the browser-driven traffic capture
        #[arg(long)]
        no_traffic: bool,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Analyse local files without crawling
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        report: ReportArgs,
    },
}

#[derive(clap::Args)]
struct ReportArgs {
    /// Do not contact the analysis backend
    #[arg(long)]
    no_analysis: bool,

    /// Produce a deep dive for the artifact at this position (repeatable)
    #[arg(long = "deep-dive", value_name = "N")]
    deep_dive: Vec<usize>,

    /// Copy every collected artifact into this directory
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => ScanConfig::from_json_file(path)?,
        None => ScanConfig::builder().with_env_overrides().build()?,
    };

    let mut session = ScanSession::new(config.clone())?;

    let report = match cli.command {
        Commands::Scan {
            url,
            uploads,
            no_traffic,
            report,
        } => {
            if !uploads.is_empty() {
                print_upload_report(&session.add_uploads(read_uploads(&uploads).await?).await);
            }

            let result = if no_traffic {
                session.crawl_static(&url).await
            } else {
                let probe = ChromiumProbe::new(config.clone());
                session.crawl_target(&url, &probe).await
            };
            match result {
                Ok(crawl) => print_crawl_report(&crawl),
                Err(e) => eprintln!("Crawl failed: {e}"),
            }
            report
        }
        Commands::Upload { files, report } => {
            print_upload_report(&session.add_uploads(read_uploads(&files).await?).await);
            report
        }
    };

    if session.collection().is_empty() {
        println!("Provide a URL or upload files to start.");
        return Ok(());
    }

    let mut deep_dives = Vec::new();
    if !report.no_analysis {
        let backend = OllamaBackend::new(config.analysis())?;
        let analyzer = Analyzer::new(backend, config.analysis().clone());

        let written = session.summarize_pending(&analyzer).await;
        info!("Wrote {written} summaries");

        for position in report.deep_dive {
            match session.deep_dive(position, &analyzer).await {
                Some(details) => deep_dives.push((position, details.to_string())),
                None => warn!("No deep dive for artifact {position}: missing or binary"),
            }
        }
    }

    print_artifacts(&session, &deep_dives);

    if let Some(dir) = report.export {
        let written = session.export_to(&dir).await?;
        println!("\nExported {} artifacts to {}", written.len(), dir.display());
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("websec_surface={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn read_uploads(paths: &[PathBuf]) -> Result<Vec<UploadedFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(
            UploadedFile::from_path(path)
                .await
                .with_context(|| format!("Cannot upload {}", path.display()))?,
        );
    }
    Ok(files)
}

fn print_crawl_report(report: &CrawlReport) {
    println!("Collected {} artifacts", report.added);
    if report.discarded > 0 {
        println!("Ignored {} non-text exchanges", report.discarded);
    }
    for skipped in &report.skipped {
        println!("  warning: {skipped}");
    }
    for rejected in &report.rejected {
        println!("  warning: {rejected}");
    }
}

fn print_upload_report(report: &UploadReport) {
    println!("Stored {} uploads", report.added);
    for failure in &report.failed {
        println!("  warning: {}: {}", failure.name, failure.reason);
    }
}

fn print_artifacts(session: &ScanSession, deep_dives: &[(usize, String)]) {
    println!("\nCollected Artifacts");
    for view in session.collection().views() {
        println!("\n{}", view.label());
        if let Some(origin) = view.origin {
            println!("  source: {origin}");
        }
        println!("  captured: {}", view.captured_at.format("%Y-%m-%d %H:%M:%S UTC"));

        match (view.summary, view.analyzable) {
            (Some(summary), _) => println!("\n{summary}"),
            (None, false) => println!("\n  Binary content, no summary"),
            (None, true) => {}
        }

        if let Some((_, details)) = deep_dives.iter().find(|(position, _)| *position == view.position) {
            println!("\n--- Deep dive ---\n{details}");
        }
    }
}
