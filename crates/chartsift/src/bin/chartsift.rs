// ABOUTME: CLI binary for the chartsift song extraction engine.
// ABOUTME: Reads HTML or text from a file, stdin, or the network and prints the extracted song list.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use chartsift::{load_registry_from_path, ExtractionResult, Extractor, PageContent};
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USER_AGENT: &str = concat!("chartsift/", env!("CARGO_PKG_VERSION"));

#[derive(Parser, Debug)]
#[command(name = "chartsift")]
#[command(about = "Extract ranked song lists from music pages")]
#[command(group(ArgGroup::new("input").required(true).args(["html", "text", "fetch"])))]
struct Args {
    /// Page URL; selects the extraction profile and is fetched with --fetch
    #[arg(long = "url")]
    url: String,

    /// HTML file to parse ("-" for stdin)
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// Plain text file to parse ("-" for stdin)
    #[arg(long = "text")]
    text: Option<PathBuf>,

    /// Fetch the URL over HTTP instead of reading a file
    #[arg(long = "fetch")]
    fetch: bool,

    /// Number of songs the page is expected to list
    #[arg(long = "expected")]
    expected: Option<usize>,

    /// Fraction of --expected needed for success (default 0.7)
    #[arg(long = "threshold")]
    threshold: Option<f64>,

    /// Profile registry JSON replacing the builtin profiles
    #[arg(long = "profiles")]
    profiles: Option<PathBuf>,

    /// Output the full result as JSON
    #[arg(long = "json")]
    json_output: bool,

    /// Single-line JSON (with --json)
    #[arg(long = "compact")]
    compact: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("error reading stdin")?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("error reading file {:?}", path))
}

fn fetch_page(url: &str) -> Result<PageContent> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .context("failed to build HTTP client")?;
    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("error fetching {}", url))?;
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response
        .bytes()
        .with_context(|| format!("error reading body of {}", url))?;
    debug!(url, bytes = body.len(), content_type = ?content_type, "fetched page");
    Ok(PageContent::from_bytes(&body, content_type.as_deref()))
}

fn format_output(result: &ExtractionResult, json_output: bool, compact: bool) -> Result<String> {
    if !json_output {
        return Ok(result.format_text());
    }
    let json = if compact {
        serde_json::to_string(result)?
    } else {
        serde_json::to_string_pretty(result)?
    };
    Ok(json)
}

fn run(args: &Args) -> Result<()> {
    let mut builder = Extractor::builder();
    if let Some(path) = &args.profiles {
        let registry = load_registry_from_path(path)
            .with_context(|| format!("error loading profiles from {:?}", path))?;
        builder = builder.registry(registry);
    }
    if let Some(threshold) = args.threshold {
        builder = builder.success_threshold(threshold);
    }
    let extractor = builder.build();

    let content = if let Some(path) = &args.html {
        PageContent::from_html(&read_input(path)?)
    } else if let Some(path) = &args.text {
        PageContent::from_text(&read_input(path)?)
    } else {
        fetch_page(&args.url)?
    };

    let result = extractor.extract(&args.url, &content, args.expected);
    println!("{}", format_output(&result, args.json_output, args.compact)?);
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "chartsift=warn",
        1 => "chartsift=info",
        2 => "chartsift=debug",
        _ => "chartsift=trace",
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}
