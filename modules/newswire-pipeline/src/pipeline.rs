//! Pipeline assembly.
//!
//! One explicit handle owning every stage; no globals, no ambient state.
//! Whoever constructs the `Pipeline` owns its lifecycle. Components are
//! public so callers can register handlers, filters, routes, subscriptions,
//! and channel senders before driving events through `run`.

use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use serde_json::Value;
use tracing::{debug, info};

use newswire_common::{
    Config, EnrichedEvent, EventSource, NotificationPriority, PriorityBucket,
};

use crate::classify::Classifier;
use crate::enrich::EnrichmentKind;
use crate::ingest::Ingestor;
use crate::notify::Notifier;
use crate::prioritize::Prioritizer;
use crate::process::Processor;
use crate::route::Router;
use crate::store::{EventStore, MemoryEventStore};

pub struct Pipeline {
    pub ingestor: Ingestor,
    pub classifier: Arc<Classifier>,
    pub prioritizer: Prioritizer,
    pub router: Router,
    pub processor: Processor,
    pub store: Arc<dyn EventStore>,
    pub notifier: Notifier,
}

impl Pipeline {
    /// Assemble a pipeline with the in-memory store.
    pub fn new(config: &Config) -> Self {
        Self::with_store(config, Arc::new(MemoryEventStore::new()))
    }

    /// Assemble a pipeline against an externally provided store.
    pub fn with_store(config: &Config, store: Arc<dyn EventStore>) -> Self {
        let classifier = Arc::new(Classifier::new());
        Self {
            ingestor: Ingestor::new(config),
            classifier: classifier.clone(),
            prioritizer: Prioritizer::new(classifier),
            router: Router::new(),
            processor: Processor::new(config),
            store,
            notifier: Notifier::new(),
        }
    }

    /// Drive one payload through the full pipeline: ingest, classify,
    /// prioritize, route, enrich, persist, notify.
    ///
    /// Returns `Ok(None)` when ingestion rejected or failed to normalize the
    /// payload; per-handler and per-enrichment failures are contained inside
    /// their stages. Only storage failures propagate.
    pub async fn run(
        &self,
        source: EventSource,
        payload: Value,
        metadata: Option<Value>,
    ) -> Result<Option<EnrichedEvent>> {
        let Some(mut event) = self.ingestor.ingest(source, payload, metadata).await else {
            return Ok(None);
        };

        // Fill a missing category from classification so routing, indexing,
        // and notification topics all agree.
        if event.category.is_none() && !self.classifier.classify(&event).is_empty() {
            event.category = Some(self.classifier.primary_category(&event).to_string());
        }

        let score = self.prioritizer.score(&event);
        let handled = self.router.route(&event, Some(score)).await;
        debug!(event_id = %event.id, score, handled, "Event routed");

        let mut enriched = self.processor.process(event, &EnrichmentKind::ALL).await;
        enriched.priority_score = Some(score);

        self.store
            .store(enriched.clone())
            .await
            .context("Failed to persist enriched event")?;

        let priority = NotificationPriority::from_bucket(PriorityBucket::from_score(score));
        let notifications = self.notifier.notify(&enriched, None, priority).await;
        info!(
            event_id = %enriched.id(),
            score,
            notifications = notifications.len(),
            "Event processed and persisted"
        );

        Ok(Some(enriched))
    }
}
