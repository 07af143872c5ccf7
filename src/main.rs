//! Resona CLI - Speaker Test Harness
//!
//! Command-line interface for running diagnostic speaker tests and
//! browsing scoring-service data.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use resona::api::{ApiClient, ExportFormat};
use resona::progress::ProgressSink;
use resona::tone::{capture_tone, AudioOutput};
use resona::view::{render_analytics, render_devices, render_recommendations, ConsolePane, Dashboard};
use resona::{Config, RunOutcome, TestKind, TestRunner, TestSession, ToneTest};

#[derive(Parser)]
#[command(name = "resona-cli", version, about = "Speaker test harness")]
struct Cli {
    /// Scoring-service base URL (overrides RESONA_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one diagnostic test and submit the result for scoring
    Test {
        /// Test kind: frequency-response, bass-response or distortion
        kind: String,
        /// Speaker model under test
        #[arg(long, default_value = "Unknown")]
        speaker: String,
        /// Skip the audio output probe and run silently
        #[arg(long)]
        silent: bool,
    },
    /// Submit a 1-5 star rating for the speaker
    Rate {
        rating: u8,
        #[arg(long, default_value = "Unknown")]
        speaker: String,
    },
    /// Show testing analytics
    Analytics,
    /// Show speaker recommendations
    Recommendations {
        #[arg(long)]
        user_id: Option<String>,
        /// Comma-separated test types to weight
        #[arg(long)]
        test_types: Option<String>,
    },
    /// Fetch the comparison document for one speaker model
    Compare {
        #[arg(long)]
        speaker: String,
    },
    /// Download test results as a file
    Export {
        /// csv, excel or json
        #[arg(long, default_value = "csv")]
        format: String,
        #[arg(long)]
        speaker: Option<String>,
        /// Output path (defaults to the server-provided filename)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Query the detected output devices
    Detect,
    /// Start a backend user session
    Session {
        #[arg(long)]
        name: Option<String>,
    },
    /// Render a test tone to a WAV file without running a test
    Capture {
        kind: String,
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("Resona Speaker Test Harness v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_env();
    if let Some(url) = cli.api_url {
        config = config.with_base_url(url);
    }

    handle_command(cli.command, config).await
}

async fn handle_command(command: Commands, config: Config) -> anyhow::Result<()> {
    match command {
        Commands::Test {
            kind,
            speaker,
            silent,
        } => run_test(&kind, &speaker, silent, config).await,
        Commands::Rate { rating, speaker } => submit_rating(rating, &speaker, config).await,
        Commands::Analytics => show_analytics(config).await,
        Commands::Recommendations {
            user_id,
            test_types,
        } => show_recommendations(user_id.as_deref(), test_types.as_deref(), config).await,
        Commands::Compare { speaker } => compare(&speaker, config).await,
        Commands::Export {
            format,
            speaker,
            out,
        } => export(&format, speaker.as_deref(), out, config).await,
        Commands::Detect => detect(config).await,
        Commands::Session { name } => start_session(name.as_deref(), config).await,
        Commands::Capture { kind, out } => capture(&kind, &out, config),
    }
}

fn parse_kind(kind: &str) -> anyhow::Result<TestKind> {
    TestKind::from_str(kind).ok_or_else(|| {
        anyhow!("unknown test kind '{kind}'; expected frequency-response, bass-response or distortion")
    })
}

/// Progress sink that prints every 10% step
fn console_progress() -> ProgressSink {
    let last_decile = Arc::new(AtomicU32::new(0));
    Arc::new(move |fraction| {
        let decile = (fraction * 10.0) as u32;
        if decile > last_decile.swap(decile, Ordering::Relaxed) {
            println!("  progress: {}%", decile * 10);
        }
    })
}

async fn run_test(kind: &str, speaker: &str, silent: bool, config: Config) -> anyhow::Result<()> {
    let kind = parse_kind(kind)?;
    let client = ApiClient::new(&config)?;
    let session = TestSession::new();

    let mut runner = TestRunner::new(&client, &session, config);
    if silent {
        runner = runner.with_output(AudioOutput::disabled());
    }

    let mut pane = ConsolePane;
    let outcome = runner
        .run_test(kind, speaker, &mut pane, console_progress())
        .await;

    match outcome {
        RunOutcome::Completed(report) => {
            println!("Recorded as test #{}", report.test_id);
            Ok(())
        }
        RunOutcome::Rejected(reason) | RunOutcome::Failed(reason) => {
            Err(anyhow!("test did not complete: {reason}"))
        }
    }
}

async fn submit_rating(rating: u8, speaker: &str, config: Config) -> anyhow::Result<()> {
    let client = ApiClient::new(&config)?;
    let session = TestSession::new();
    session.set_rating(rating)?;

    let ack = session.submit_rating(&client, speaker).await?;
    if ack.is_success() {
        println!(
            "{}",
            ack.message.unwrap_or_else(|| "Rating submitted".to_string())
        );
        Ok(())
    } else {
        Err(anyhow!(
            "rating rejected: {}",
            ack.message.unwrap_or_else(|| ack.status.clone())
        ))
    }
}

async fn show_analytics(config: Config) -> anyhow::Result<()> {
    let client = ApiClient::new(&config)?;
    let summary = client.analytics().await?;
    let mut dashboard = Dashboard::new();
    print!("{}", render_analytics(&summary, &mut dashboard));
    Ok(())
}

async fn show_recommendations(
    user_id: Option<&str>,
    test_types: Option<&str>,
    config: Config,
) -> anyhow::Result<()> {
    let client = ApiClient::new(&config)?;
    let types: Vec<&str> = test_types
        .map(|raw| raw.split(',').map(str::trim).collect())
        .unwrap_or_default();
    let recommendations = client.recommendations(user_id, &types).await?;
    print!("{}", render_recommendations(&recommendations));
    Ok(())
}

async fn compare(speaker: &str, config: Config) -> anyhow::Result<()> {
    let client = ApiClient::new(&config)?;
    let document = client.compare(speaker).await?;
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

async fn export(
    format: &str,
    speaker: Option<&str>,
    out: Option<PathBuf>,
    config: Config,
) -> anyhow::Result<()> {
    let format = ExportFormat::from_str(format)
        .ok_or_else(|| anyhow!("unknown export format '{format}'; expected csv, excel or json"))?;
    let client = ApiClient::new(&config)?;
    let download = client.export_results(format, speaker).await?;

    let path = out.unwrap_or_else(|| PathBuf::from(&download.filename));
    std::fs::write(&path, &download.data)
        .with_context(|| format!("writing export to {}", path.display()))?;
    println!("Saved {} bytes to {}", download.data.len(), path.display());
    Ok(())
}

async fn detect(config: Config) -> anyhow::Result<()> {
    let client = ApiClient::new(&config)?;
    let inventory = client.detect_speakers().await?;
    print!("{}", render_devices(&inventory));
    Ok(())
}

async fn start_session(name: Option<&str>, config: Config) -> anyhow::Result<()> {
    let client = ApiClient::new(&config)?;
    let ack = client.start_session(name).await?;
    println!("Session started for {} ({})", ack.user_name, ack.user_id);
    Ok(())
}

fn capture(kind: &str, out: &Path, config: Config) -> anyhow::Result<()> {
    let kind = parse_kind(kind)?;
    let plan = ToneTest::for_kind(kind);
    capture_tone(&plan, config.sample_rate, out)
        .with_context(|| format!("capturing {} tone", kind.as_str()))?;
    println!("Captured {} tone to {}", kind.as_str(), out.display());
    Ok(())
}
