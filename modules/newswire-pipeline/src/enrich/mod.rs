//! Named enrichment steps.
//!
//! A closed set of enrichment kinds, each implementing the same `Enricher`
//! capability. The processor builds its registry from these at construction;
//! callers opt in per event by kind.

pub mod entities;
pub mod keywords;
pub mod sentiment;
pub mod summary;

use anyhow::Result;
use async_trait::async_trait;

use newswire_common::EnrichedEvent;

pub use entities::EntityEnricher;
pub use keywords::KeywordEnricher;
pub use sentiment::{SentimentEnricher, SentimentLabel, SentimentScorer, SentimentVerdict};
pub use summary::SummaryEnricher;

/// The closed set of enrichment kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnrichmentKind {
    Sentiment,
    Entities,
    Summary,
    Keywords,
}

impl EnrichmentKind {
    pub const ALL: [EnrichmentKind; 4] = [
        EnrichmentKind::Sentiment,
        EnrichmentKind::Entities,
        EnrichmentKind::Summary,
        EnrichmentKind::Keywords,
    ];
}

impl std::fmt::Display for EnrichmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrichmentKind::Sentiment => write!(f, "sentiment"),
            EnrichmentKind::Entities => write!(f, "entities"),
            EnrichmentKind::Summary => write!(f, "summary"),
            EnrichmentKind::Keywords => write!(f, "keywords"),
        }
    }
}

/// An enrichment step. Sets its own derived field on the event; a failure
/// leaves the field absent and never aborts the pipeline.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, event: &mut EnrichedEvent) -> Result<()>;
}

/// Title and description joined for text analysis.
pub(crate) fn analysis_text(event: &EnrichedEvent) -> String {
    format!("{} {}", event.base.title, event.base.description)
}

/// Lowercase alphanumeric word tokens of a text.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}
