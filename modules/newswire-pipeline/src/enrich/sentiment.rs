//! Sentiment enrichment.
//!
//! Prefers an external text-analysis collaborator when one is wired in;
//! absence or failure falls back to a keyword-count heuristic without
//! surfacing an error.

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use newswire_common::{EnrichedEvent, SentimentScores};

use super::{analysis_text, tokenize, Enricher};

const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "positive",
    "success",
    "win",
    "breakthrough",
    "growth",
    "improve",
    "hope",
    "celebrate",
    "benefit",
    "saves",
    "progress",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "crisis",
    "negative",
    "fail",
    "loss",
    "decline",
    "fear",
    "threat",
    "death",
    "crash",
    "war",
    "disaster",
    "risk",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

/// Verdict from an external text-analysis collaborator.
#[derive(Debug, Clone, Copy)]
pub struct SentimentVerdict {
    pub label: SentimentLabel,
    pub score: f64,
}

#[async_trait]
pub trait SentimentScorer: Send + Sync {
    async fn score(&self, text: &str) -> Result<SentimentVerdict>;
}

pub struct SentimentEnricher {
    external: Option<std::sync::Arc<dyn SentimentScorer>>,
}

impl SentimentEnricher {
    pub fn new(external: Option<std::sync::Arc<dyn SentimentScorer>>) -> Self {
        Self { external }
    }

    /// Keyword-count heuristic with add-one smoothing: each matched word
    /// contributes `1/(pos+neg+1)` to its side, the remainder goes to
    /// neutral, so the distribution always sums to 1.
    fn heuristic(text: &str) -> SentimentScores {
        let words = tokenize(text);
        let pos = words
            .iter()
            .filter(|w| POSITIVE_WORDS.contains(&w.as_str()))
            .count() as f64;
        let neg = words
            .iter()
            .filter(|w| NEGATIVE_WORDS.contains(&w.as_str()))
            .count() as f64;

        let denom = pos + neg + 1.0;
        SentimentScores {
            positive: pos / denom,
            negative: neg / denom,
            neutral: 1.0 / denom,
        }
    }

    fn from_verdict(verdict: SentimentVerdict) -> SentimentScores {
        let score = verdict.score.clamp(0.0, 1.0);
        match verdict.label {
            SentimentLabel::Positive => SentimentScores {
                positive: score,
                negative: 0.0,
                neutral: 1.0 - score,
            },
            SentimentLabel::Negative => SentimentScores {
                positive: 0.0,
                negative: score,
                neutral: 1.0 - score,
            },
            SentimentLabel::Neutral => SentimentScores {
                positive: 0.0,
                negative: 0.0,
                neutral: 1.0,
            },
        }
    }
}

#[async_trait]
impl Enricher for SentimentEnricher {
    async fn enrich(&self, event: &mut EnrichedEvent) -> Result<()> {
        let text = analysis_text(event);

        if let Some(scorer) = &self.external {
            match scorer.score(&text).await {
                Ok(verdict) => {
                    event.sentiment = Some(Self::from_verdict(verdict));
                    return Ok(());
                }
                Err(e) => {
                    debug!(error = %e, "External sentiment scorer failed, using heuristic");
                }
            }
        }

        event.sentiment = Some(Self::heuristic(&text));
        Ok(())
    }
}
