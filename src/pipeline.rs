use tracing::{Instrument, info, info_span, warn};

use crate::inference::{
    GatewayConfig, IntimacyEndpoint, InferenceGateway, LabelEndpoint, Tokenizer,
};
use crate::io::{AnalysisReport, SentimentDebugReport};
use crate::llm::RewriteService;
use crate::models::{
    Chunk, ChunkStream, ClassificationSummary, FeedbackOutcome, RegressionSummary, RenderPolicy,
    SelectionOutcome, SpeakerCode,
};
use crate::stages::{
    AggregationConfig, ChunkConfig, Chunker, NegativeSentenceSelector, RewriteConfig,
    RewriteOrchestrator, ScoreAggregator, SelectionConfig, normalize_transcript,
};

/// Collaborators used by the analysis flow
pub struct AnalysisServices<'a> {
    pub tokenizer: &'a dyn Tokenizer,
    pub classifier: &'a LabelEndpoint,
    pub regressor: &'a IntimacyEndpoint,
}

/// Configuration for the analysis flow
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub render: RenderPolicy,
    pub classification_chunks: ChunkConfig,
    pub regression_chunks: ChunkConfig,
    pub gateway: GatewayConfig,
    pub aggregation: AggregationConfig,
}

/// Collaborators used by the feedback flow
pub struct FeedbackServices<'a> {
    pub sentiment: &'a LabelEndpoint,
    pub rewriter: &'a dyn RewriteService,
}

/// Configuration for the feedback flow
#[derive(Debug, Clone, Default)]
pub struct FeedbackConfig {
    pub selection: SelectionConfig,
    pub rewrite: RewriteConfig,
    pub gateway: GatewayConfig,
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Normalize a chat export, then classify the relationship and score intimacy.
///
/// Never fails: collaborator failures degrade the affected stream and are
/// reported in the diagnostics.
pub async fn analyze_transcript(
    text: &str,
    services: &AnalysisServices<'_>,
    config: &AnalysisConfig,
) -> AnalysisReport {
    let request_id = new_request_id();
    let span = info_span!("analysis", request_id = %request_id);

    async {
        let normalization = normalize_transcript(text, config.render);
        let normalized = normalization.normalized_text.as_str();

        let gateway = InferenceGateway::new(config.gateway.clone());
        let aggregator = ScoreAggregator::new(config.aggregation.clone());
        let chunker = Chunker::new(services.tokenizer);

        // Both streams read the same normalized text and run side by side
        let (classification, regression) = tokio::join!(
            classify_stream(&chunker, &gateway, &aggregator, services.classifier, normalized, config),
            regress_stream(&chunker, &gateway, &aggregator, services.regressor, normalized, config),
        );

        info!(
            "Analysis complete: relationship {:?}, scaled intimacy {:.4}",
            classification.relationship, regression.scaled_score
        );
        AnalysisReport::new(request_id.clone(), normalization, classification, regression)
    }
    .instrument(span)
    .await
}

/// Chunk one stream; a tokenizer failure yields no chunks and a failed flag
async fn chunk_or_degrade(
    chunker: &Chunker<'_>,
    text: &str,
    config: &ChunkConfig,
    stream: ChunkStream,
) -> (Vec<Chunk>, bool) {
    match chunker.chunk_stream(text, config, stream).await {
        Ok(chunks) => (chunks, false),
        Err(e) => {
            warn!("Chunking the {} stream failed: {}", stream.as_str(), e);
            (Vec::new(), true)
        }
    }
}

async fn classify_stream(
    chunker: &Chunker<'_>,
    gateway: &InferenceGateway,
    aggregator: &ScoreAggregator,
    classifier: &LabelEndpoint,
    text: &str,
    config: &AnalysisConfig,
) -> ClassificationSummary {
    let (chunks, stream_failed) = chunk_or_degrade(
        chunker,
        text,
        &config.classification_chunks,
        ChunkStream::Classification,
    )
    .await;
    let outcomes = gateway.fan_out_chunks(classifier, &chunks).await;
    aggregator.classify(&outcomes, stream_failed)
}

async fn regress_stream(
    chunker: &Chunker<'_>,
    gateway: &InferenceGateway,
    aggregator: &ScoreAggregator,
    regressor: &IntimacyEndpoint,
    text: &str,
    config: &AnalysisConfig,
) -> RegressionSummary {
    let (chunks, stream_failed) =
        chunk_or_degrade(chunker, text, &config.regression_chunks, ChunkStream::Regression).await;
    let outcomes = gateway.fan_out_chunks(regressor, &chunks).await;
    aggregator.average(&outcomes, stream_failed)
}

/// Pick the most negative sentences of `speaker` and ask for styled rewrites
pub async fn generate_feedback(
    normalized_text: &str,
    speaker: SpeakerCode,
    services: &FeedbackServices<'_>,
    config: &FeedbackConfig,
) -> FeedbackOutcome {
    let span = info_span!("feedback", request_id = %new_request_id(), speaker = %speaker);

    async {
        let gateway = InferenceGateway::new(config.gateway.clone());
        let selector =
            NegativeSentenceSelector::new(services.sentiment, &gateway, config.selection.clone());

        match selector.select(normalized_text, speaker).await {
            SelectionOutcome::NoSpeakerSentences => FeedbackOutcome::no_speaker_sentences(speaker),
            SelectionOutcome::NoNegativeSentences => {
                FeedbackOutcome::no_negative_sentences(speaker)
            }
            SelectionOutcome::Selected(selected) => {
                let orchestrator =
                    RewriteOrchestrator::new(services.rewriter, config.rewrite.clone());
                FeedbackOutcome::Feedback {
                    feedback: orchestrator.rewrite_all(&selected).await,
                }
            }
        }
    }
    .instrument(span)
    .await
}

/// Score every line of a normalized transcript for threshold tuning
pub async fn debug_sentiment(
    normalized_text: &str,
    sentiment: &LabelEndpoint,
    config: &FeedbackConfig,
) -> SentimentDebugReport {
    let span = info_span!("debug_sentiment", request_id = %new_request_id());

    async {
        let gateway = InferenceGateway::new(config.gateway.clone());
        let selector = NegativeSentenceSelector::new(sentiment, &gateway, config.selection.clone());
        SentimentDebugReport {
            debug: selector.debug_sentiment(normalized_text).await,
        }
    }
    .instrument(span)
    .await
}
