//! Summary enrichment: first sentence of the description, truncated.

use anyhow::Result;
use async_trait::async_trait;

use newswire_common::EnrichedEvent;

use super::Enricher;

const MAX_SUMMARY_CHARS: usize = 200;

#[derive(Debug, Default)]
pub struct SummaryEnricher;

impl SummaryEnricher {
    fn summarize(description: &str) -> String {
        // First sentence boundary wins; the terminator stays attached.
        let end = [". ", "! ", "? "]
            .iter()
            .filter_map(|sep| description.find(sep).map(|i| i + 1))
            .min();
        let sentence = match end {
            Some(i) => &description[..i],
            None => description,
        };

        if sentence.chars().count() > MAX_SUMMARY_CHARS {
            let truncated: String = sentence.chars().take(MAX_SUMMARY_CHARS).collect();
            format!("{truncated}...")
        } else {
            sentence.to_string()
        }
    }
}

#[async_trait]
impl Enricher for SummaryEnricher {
    async fn enrich(&self, event: &mut EnrichedEvent) -> Result<()> {
        event.summary = Some(Self::summarize(&event.base.description));
        Ok(())
    }
}
