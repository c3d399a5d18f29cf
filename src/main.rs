use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use bindly::io::{read_transcript_file, to_json_string, write_json};
use bindly::stages::SelectionConfig;
use bindly::{
    AnalysisConfig, AnalysisServices, ChatClient, ChatConfig, ChunkConfig, FeedbackConfig,
    FeedbackServices, FeedbackStyle, RenderPolicy, ServiceConfig, SpeakerCode, UploadGuard,
    analyze_transcript, debug_sentiment, generate_feedback, normalize_transcript,
};

#[derive(Parser)]
#[command(name = "bindly")]
#[command(author, version, about = "Chat transcript relationship analysis and feedback", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Anonymize and normalize a chat export without calling any model
    Normalize {
        /// Input chat export (text)
        #[arg(short, long)]
        input: PathBuf,

        /// How anonymized messages are rendered
        #[arg(long, value_enum, default_value_t = RenderPolicy::PerMessage)]
        render: RenderPolicy,

        /// Output file (JSON); printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Predict the relationship and intimacy score of a chat export
    Analyze {
        /// Input chat export (text)
        #[arg(short, long)]
        input: PathBuf,

        /// Delete the input file once it has been read
        #[arg(long)]
        remove_input: bool,

        /// How anonymized messages are rendered
        #[arg(long, value_enum, default_value_t = RenderPolicy::PerMessage)]
        render: RenderPolicy,

        /// Maximum tokens per chunk
        #[arg(long, default_value = "512")]
        max_tokens: usize,

        /// Tokens shared between consecutive chunks
        #[arg(long, default_value = "50")]
        overlap: usize,

        /// Output file (JSON); printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Suggest rewrites for the most negative sentences of one speaker
    Feedback {
        /// Normalized transcript (`u1: ...` lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Speaker code, e.g. u1
        #[arg(short, long)]
        speaker: SpeakerCode,

        /// Feedback style: empathetic or blunt
        #[arg(long, default_value = "empathetic")]
        style: FeedbackStyle,

        /// Minimum negativity for a sentence to be selected
        #[arg(long, default_value = "0.5")]
        threshold: f64,

        /// Maximum number of sentences to rewrite
        #[arg(long, default_value = "3")]
        top_k: usize,

        /// Output file (JSON); printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the sentiment model output for every line
    DebugSentiment {
        /// Normalized transcript (`u1: ...` lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (JSON); printed to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize {
            input,
            render,
            output,
            verbose,
        } => {
            setup_logging(verbose);
            run_normalize(&input, render, output.as_deref())
        }
        Commands::Analyze {
            input,
            remove_input,
            render,
            max_tokens,
            overlap,
            output,
            verbose,
        } => {
            setup_logging(verbose);
            let chunks = ChunkConfig::new(max_tokens, overlap);
            run_analyze(&input, remove_input, render, chunks, output.as_deref()).await
        }
        Commands::Feedback {
            input,
            speaker,
            style,
            threshold,
            top_k,
            output,
            verbose,
        } => {
            setup_logging(verbose);
            let selection = SelectionConfig {
                threshold,
                top_k,
                ..Default::default()
            };
            run_feedback(&input, speaker, style, selection, output.as_deref()).await
        }
        Commands::DebugSentiment {
            input,
            output,
            verbose,
        } => {
            setup_logging(verbose);
            run_debug_sentiment(&input, output.as_deref()).await
        }
    }
}

/// Log to stderr; RUST_LOG takes precedence over the verbose flag
fn setup_logging(verbose: bool) {
    let default = if verbose { "bindly=debug" } else { "bindly=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn emit<T: Serialize>(report: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            write_json(report, path)?;
            info!("Output written to {:?}", path);
        }
        None => println!("{}", to_json_string(report)?),
    }
    Ok(())
}

fn run_normalize(input: &Path, render: RenderPolicy, output: Option<&Path>) -> Result<()> {
    info!("Normalizing {:?}", input);
    let text = read_transcript_file(input)?;
    let result = normalize_transcript(&text, render);
    emit(&result, output)
}

async fn run_analyze(
    input: &Path,
    remove_input: bool,
    render: RenderPolicy,
    chunks: ChunkConfig,
    output: Option<&Path>,
) -> Result<()> {
    info!("Loading chat export from {:?}", input);
    let text = if remove_input {
        let guard = UploadGuard::new(input);
        guard.read_to_string()?
    } else {
        read_transcript_file(input)?
    };

    let services = ServiceConfig::from_env().context("Invalid service configuration")?;
    let client = services.http_client()?;
    let tokenizer = services.tokenizer(&client);
    let classifier = services.relationship_classifier(&client);
    let regressor = services.intimacy_regressor(&client);

    let config = AnalysisConfig {
        render,
        classification_chunks: chunks,
        regression_chunks: chunks,
        gateway: services.gateway(),
        ..Default::default()
    };
    let report = analyze_transcript(
        &text,
        &AnalysisServices {
            tokenizer: &tokenizer,
            classifier: &classifier,
            regressor: &regressor,
        },
        &config,
    )
    .await;

    if report.is_degraded() {
        info!("Some model calls failed; see diagnostics in the report");
    }
    emit(&report, output)
}

async fn run_feedback(
    input: &Path,
    speaker: SpeakerCode,
    style: FeedbackStyle,
    selection: SelectionConfig,
    output: Option<&Path>,
) -> Result<()> {
    let text = read_transcript_file(input)?;

    let services = ServiceConfig::from_env().context("Invalid service configuration")?;
    let client = services.http_client()?;
    let sentiment = services.sentiment_scorer(&client);
    let rewriter = ChatClient::new(client.clone(), ChatConfig::from_env()?);

    let config = FeedbackConfig {
        selection,
        rewrite: bindly::stages::RewriteConfig { style },
        gateway: services.gateway(),
    };
    let outcome = generate_feedback(
        &text,
        speaker,
        &FeedbackServices {
            sentiment: &sentiment,
            rewriter: &rewriter,
        },
        &config,
    )
    .await;

    info!("Feedback for {}: {} items", speaker, outcome.items().len());
    emit(&outcome, output)
}

async fn run_debug_sentiment(input: &Path, output: Option<&Path>) -> Result<()> {
    let text = read_transcript_file(input)?;

    let services = ServiceConfig::from_env().context("Invalid service configuration")?;
    let client = services.http_client()?;
    let sentiment = services.sentiment_scorer(&client);

    let config = FeedbackConfig {
        gateway: services.gateway(),
        ..Default::default()
    };
    let report = debug_sentiment(&text, &sentiment, &config).await;
    emit(&report, output)
}
