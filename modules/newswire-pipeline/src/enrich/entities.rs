//! Entity extraction heuristic.
//!
//! Capitalized words that are not at a sentence start are taken as entity
//! mentions, deduplicated by surface text and tagged `"unknown"`. No model,
//! no dictionary; downstream consumers treat the type as unresolved.

use anyhow::Result;
use async_trait::async_trait;

use newswire_common::{EnrichedEvent, Entity};

use super::Enricher;

#[derive(Debug, Default)]
pub struct EntityEnricher;

impl EntityEnricher {
    fn extract(text: &str) -> Vec<Entity> {
        let mut entities = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let mut sentence_start = true;

        for token in text.split_whitespace() {
            let word = token.trim_matches(|c: char| !c.is_alphanumeric());
            let starts_sentence = sentence_start;
            sentence_start = token.ends_with(['.', '!', '?']);

            if word.is_empty() || starts_sentence {
                continue;
            }
            let capitalized = word.chars().next().is_some_and(|c| c.is_uppercase());
            if capitalized && seen.insert(word.to_string()) {
                entities.push(Entity {
                    text: word.to_string(),
                    entity_type: "unknown".to_string(),
                });
            }
        }
        entities
    }
}

#[async_trait]
impl Enricher for EntityEnricher {
    async fn enrich(&self, event: &mut EnrichedEvent) -> Result<()> {
        let text = format!("{}. {}", event.base.title, event.base.description);
        event.entities = Some(Self::extract(&text));
        Ok(())
    }
}
