pub mod config;
pub mod inference;
pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod stages;

pub use config::ServiceConfig;
pub use inference::{
    HttpTokenizer, InferenceError, InferenceGateway, RegressionEndpoint,
    TextClassificationEndpoint,
};
pub use io::{AnalysisReport, SentimentDebugReport, UploadGuard, parse_transcript};
pub use llm::{ChatClient, ChatConfig, RewriteService};
pub use models::{FeedbackOutcome, FeedbackStyle, NormalizationResult, RenderPolicy, SpeakerCode};
pub use pipeline::{
    AnalysisConfig, AnalysisServices, FeedbackConfig, FeedbackServices, analyze_transcript,
    debug_sentiment, generate_feedback,
};
pub use stages::{ChunkConfig, Chunker, normalize_transcript};
