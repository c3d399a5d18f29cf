use futures_util::stream::{self, StreamExt};
use tracing::{debug, warn};

use super::InferenceEndpoint;
use crate::models::{Chunk, ChunkOutcome};

/// Configuration for fan-out calls
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Maximum number of requests in flight at once
    pub max_in_flight: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { max_in_flight: 8 }
    }
}

/// Fans inputs out to an endpoint concurrently and collects one outcome per input.
///
/// A failing input never cancels the others. Outcomes come back in input order
/// regardless of which call finished first.
#[derive(Debug, Clone, Default)]
pub struct InferenceGateway {
    config: GatewayConfig,
}

impl InferenceGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    pub async fn fan_out<E, S>(&self, endpoint: &E, inputs: &[S]) -> Vec<ChunkOutcome<E::Output>>
    where
        E: InferenceEndpoint + ?Sized,
        S: AsRef<str>,
    {
        debug!(
            "Fanning {} inputs out to {} ({} in flight)",
            inputs.len(),
            endpoint.name(),
            self.config.max_in_flight
        );

        stream::iter(inputs.iter().enumerate())
            .map(move |(index, input)| async move {
                let result = endpoint.infer(input.as_ref()).await;
                if let Err(e) = &result {
                    warn!(
                        "{} call {} failed (status {:?}): {}",
                        endpoint.name(),
                        index,
                        e.status(),
                        e
                    );
                }
                ChunkOutcome { index, result }
            })
            .buffered(self.config.max_in_flight.max(1))
            .collect()
            .await
    }

    pub async fn fan_out_chunks<E>(&self, endpoint: &E, chunks: &[Chunk]) -> Vec<ChunkOutcome<E::Output>>
    where
        E: InferenceEndpoint + ?Sized,
    {
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let mut outcomes = self.fan_out(endpoint, &texts).await;
        for outcome in &mut outcomes {
            if let Some(chunk) = chunks.get(outcome.index) {
                outcome.index = chunk.index;
            }
        }
        outcomes
    }
}
