//! Event processing: sequential transform chain plus opt-in enrichments.
//!
//! Every step is failure-isolated. A step that errors leaves the event
//! unchanged by that step; an enricher that errors leaves its field absent.
//! Batches run concurrently but results come back in input order.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::{stream, StreamExt};
use tracing::warn;

use newswire_common::{Config, EnrichedEvent, NormalizedEvent};

use crate::enrich::{
    Enricher, EnrichmentKind, EntityEnricher, KeywordEnricher, SentimentEnricher,
    SentimentScorer, SummaryEnricher,
};

/// A transform in the sequential processor chain. Takes the event by value
/// and returns the transformed event; on error the chain continues with the
/// input unchanged.
#[async_trait]
pub trait ProcessorStep: Send + Sync {
    fn name(&self) -> &str;
    async fn apply(&self, event: EnrichedEvent) -> Result<EnrichedEvent>;
}

pub struct Processor {
    steps: Vec<Box<dyn ProcessorStep>>,
    enrichers: HashMap<EnrichmentKind, Box<dyn Enricher>>,
    max_in_flight: usize,
}

impl Processor {
    pub fn new(config: &Config) -> Self {
        let mut enrichers: HashMap<EnrichmentKind, Box<dyn Enricher>> = HashMap::new();
        enrichers.insert(
            EnrichmentKind::Sentiment,
            Box::new(SentimentEnricher::new(None)),
        );
        enrichers.insert(EnrichmentKind::Entities, Box::new(EntityEnricher));
        enrichers.insert(EnrichmentKind::Summary, Box::new(SummaryEnricher));
        enrichers.insert(EnrichmentKind::Keywords, Box::new(KeywordEnricher));

        Self {
            steps: Vec::new(),
            enrichers,
            max_in_flight: config.max_in_flight,
        }
    }

    /// Wire an external sentiment collaborator. The built-in heuristic stays
    /// as the silent fallback.
    pub fn with_sentiment_scorer(mut self, scorer: Arc<dyn SentimentScorer>) -> Self {
        self.enrichers.insert(
            EnrichmentKind::Sentiment,
            Box::new(SentimentEnricher::new(Some(scorer))),
        );
        self
    }

    /// Append a transform to the sequential chain.
    pub fn add_processor(&mut self, step: Box<dyn ProcessorStep>) {
        self.steps.push(step);
    }

    /// Replace the enricher registered for a kind.
    pub fn add_enricher(&mut self, kind: EnrichmentKind, enricher: Box<dyn Enricher>) {
        self.enrichers.insert(kind, enricher);
    }

    /// Process one event: wrap, run the chain, apply requested enrichments.
    pub async fn process(
        &self,
        event: NormalizedEvent,
        enrichments: &[EnrichmentKind],
    ) -> EnrichedEvent {
        let mut enriched = EnrichedEvent::new(event);

        for step in &self.steps {
            match step.apply(enriched.clone()).await {
                Ok(next) => enriched = next,
                Err(e) => {
                    warn!(step = step.name(), event_id = %enriched.id(), error = %e,
                        "Processor step failed, continuing");
                }
            }
        }

        for kind in enrichments {
            if let Some(enricher) = self.enrichers.get(kind) {
                if let Err(e) = enricher.enrich(&mut enriched).await {
                    warn!(enrichment = %kind, event_id = %enriched.id(), error = %e,
                        "Enrichment failed, continuing");
                }
            }
        }

        enriched
    }

    /// Process a batch concurrently, bounded by the instance's in-flight
    /// limit. Output order matches input order regardless of completion
    /// order.
    pub async fn batch_process(
        &self,
        events: Vec<NormalizedEvent>,
        enrichments: &[EnrichmentKind],
    ) -> Vec<EnrichedEvent> {
        let mut indexed: Vec<(usize, EnrichedEvent)> = stream::iter(
            events
                .into_iter()
                .enumerate()
                .map(|(i, event)| async move { (i, self.process(event, enrichments).await) }),
        )
        .buffer_unordered(self.max_in_flight)
        .collect()
        .await;

        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, e)| e).collect()
    }
}
