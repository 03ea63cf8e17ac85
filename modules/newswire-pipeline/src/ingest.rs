//! Event ingestion: rejection filters plus per-source normalization.
//!
//! Raw payloads arrive tagged with an `EventSource`. Filters may silently
//! reject them; accepted payloads are normalized by a registered handler (or
//! a default field-mapping handler) and appended to the in-memory log.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use futures::{stream, StreamExt};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use newswire_common::{Config, EventSource, NewswireError, NormalizedEvent, RawEvent};

// --- Trait seams ---

/// Rejection predicate applied to raw events in registration order.
/// Returning false drops the event silently; this is a normal outcome,
/// not an error.
pub trait IngestFilter: Send + Sync {
    fn accept(&self, raw: &RawEvent) -> bool;
}

impl<F> IngestFilter for F
where
    F: Fn(&RawEvent) -> bool + Send + Sync,
{
    fn accept(&self, raw: &RawEvent) -> bool {
        self(raw)
    }
}

/// Partial normalized event produced by a source handler. The pipeline owns
/// `id` and `source`; a handler may supply a timestamp, otherwise ingestion
/// time is used.
#[derive(Debug, Clone, Default)]
pub struct NormalizedDraft {
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub url: Option<String>,
    pub content: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Pure payload-to-draft mapping for one event source.
pub trait SourceHandler: Send + Sync {
    fn normalize(&self, payload: &Value) -> Result<NormalizedDraft>;
}

// --- Built-in handlers ---

fn str_field(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}

fn tags_field(payload: &Value, key: &str) -> Vec<String> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Fallback normalization for sources without a registered handler.
/// Reads the canonical field names straight off the payload.
#[derive(Debug, Default)]
pub struct DefaultHandler;

impl SourceHandler for DefaultHandler {
    fn normalize(&self, payload: &Value) -> Result<NormalizedDraft> {
        Ok(NormalizedDraft {
            title: str_field(payload, "title").unwrap_or_else(|| "Untitled Event".to_string()),
            description: str_field(payload, "description").unwrap_or_default(),
            category: str_field(payload, "category"),
            tags: tags_field(payload, "tags"),
            url: str_field(payload, "url"),
            content: str_field(payload, "content"),
            timestamp: None,
        })
    }
}

/// Handler for RSS feed items. Feed parsers emit `link` rather than `url`
/// and often `summary` rather than `description`; `published` carries the
/// item's own timestamp when present.
#[derive(Debug, Default)]
pub struct RssFeedHandler;

impl SourceHandler for RssFeedHandler {
    fn normalize(&self, payload: &Value) -> Result<NormalizedDraft> {
        if !payload.is_object() {
            return Err(NewswireError::Normalization(
                "rss_feed payload must be a JSON object".to_string(),
            )
            .into());
        }
        let published = str_field(payload, "published")
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(NormalizedDraft {
            title: str_field(payload, "title").unwrap_or_else(|| "Untitled Event".to_string()),
            description: str_field(payload, "description")
                .or_else(|| str_field(payload, "summary"))
                .unwrap_or_default(),
            category: str_field(payload, "category"),
            tags: tags_field(payload, "tags"),
            url: str_field(payload, "link").or_else(|| str_field(payload, "url")),
            content: str_field(payload, "content"),
            timestamp: published,
        })
    }
}

// --- Ingestor ---

type LogKey = (DateTime<Utc>, u64);

#[derive(Default)]
struct EventLog {
    /// Append-only audit trail of accepted raw events.
    raw: Vec<RawEvent>,
    /// Normalized events keyed by (timestamp, insertion seq) so recency
    /// reads walk the map in reverse without sorting.
    normalized: BTreeMap<LogKey, NormalizedEvent>,
    next_seq: u64,
}

/// Ingestion stage. Filters, normalizes, and logs incoming events.
pub struct Ingestor {
    handlers: HashMap<EventSource, Arc<dyn SourceHandler>>,
    filters: Vec<Arc<dyn IngestFilter>>,
    default_handler: DefaultHandler,
    max_in_flight: usize,
    log: Mutex<EventLog>,
}

impl Ingestor {
    pub fn new(config: &Config) -> Self {
        let mut handlers: HashMap<EventSource, Arc<dyn SourceHandler>> = HashMap::new();
        handlers.insert(EventSource::RssFeed, Arc::new(RssFeedHandler));
        Self {
            handlers,
            filters: Vec::new(),
            default_handler: DefaultHandler,
            max_in_flight: config.max_in_flight,
            log: Mutex::new(EventLog::default()),
        }
    }

    /// Register a normalization handler for a source, replacing any existing
    /// one (including built-ins).
    pub fn register_source_handler(&mut self, source: EventSource, handler: Arc<dyn SourceHandler>) {
        self.handlers.insert(source, handler);
    }

    pub fn add_filter(&mut self, filter: Arc<dyn IngestFilter>) {
        self.filters.push(filter);
    }

    /// Ingest one raw payload. Returns the normalized event, or `None` when a
    /// filter rejected it or normalization failed. Handler failures are
    /// logged and never propagate.
    pub async fn ingest(
        &self,
        source: EventSource,
        payload: Value,
        metadata: Option<Value>,
    ) -> Option<NormalizedEvent> {
        let raw = RawEvent::new(source, payload, metadata);

        for filter in &self.filters {
            if !filter.accept(&raw) {
                debug!(source = %source, event_id = %raw.id, "Event rejected by ingest filter");
                return None;
            }
        }

        // Raw events are auditable even when normalization fails below.
        {
            let mut log = self.log.lock().await;
            log.raw.push(raw.clone());
        }

        let handler: &dyn SourceHandler = self
            .handlers
            .get(&source)
            .map(|h| h.as_ref())
            .unwrap_or(&self.default_handler);

        let draft = match handler.normalize(&raw.payload) {
            Ok(draft) => draft,
            Err(e) => {
                warn!(source = %source, error = %e, "Normalization failed, dropping event");
                return None;
            }
        };

        let mut event = NormalizedEvent {
            id: raw.id,
            source,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            tags: draft.tags,
            url: draft.url,
            content: draft.content,
            timestamp: draft.timestamp.unwrap_or(raw.received_at),
            metadata: raw.metadata,
        };
        event.dedup_tags();

        let mut log = self.log.lock().await;
        let seq = log.next_seq;
        log.next_seq += 1;
        log.normalized.insert((event.timestamp, seq), event.clone());
        Some(event)
    }

    /// Ingest a batch concurrently, bounded by this instance's in-flight
    /// limit. Returns accepted events only; relative order is unconstrained.
    pub async fn batch_ingest(
        &self,
        payloads: Vec<Value>,
        source: EventSource,
    ) -> Vec<NormalizedEvent> {
        let results: Vec<Option<NormalizedEvent>> = stream::iter(
            payloads
                .into_iter()
                .map(|payload| self.ingest(source, payload, None)),
        )
        .buffer_unordered(self.max_in_flight)
        .collect()
        .await;

        results.into_iter().flatten().collect()
    }

    /// Up to `limit` most-recent accepted events, newest first, optionally
    /// filtered by source. Walks the log in reverse; no per-call sort.
    pub async fn get_recent(
        &self,
        limit: usize,
        source: Option<EventSource>,
    ) -> Vec<NormalizedEvent> {
        let log = self.log.lock().await;
        log.normalized
            .values()
            .rev()
            .filter(|e| source.map_or(true, |s| e.source == s))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Drop normalized and raw entries older than `max_age`. Returns the
    /// number of normalized events removed.
    pub async fn prune_older_than(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut log = self.log.lock().await;

        let kept = log.normalized.split_off(&(cutoff, 0));
        let removed = log.normalized.len();
        log.normalized = kept;
        log.raw.retain(|r| r.received_at >= cutoff);
        removed
    }

    pub async fn accepted_count(&self) -> usize {
        self.log.lock().await.normalized.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_handler_fills_defaults() {
        let draft = DefaultHandler.normalize(&json!({})).unwrap();
        assert_eq!(draft.title, "Untitled Event");
        assert_eq!(draft.description, "");
        assert!(draft.category.is_none());
        assert!(draft.tags.is_empty());
    }

    #[test]
    fn rss_handler_maps_link_and_summary() {
        let draft = RssFeedHandler
            .normalize(&json!({
                "title": "Feed item",
                "summary": "Short summary.",
                "link": "https://example.com/item"
            }))
            .unwrap();
        assert_eq!(draft.description, "Short summary.");
        assert_eq!(draft.url.as_deref(), Some("https://example.com/item"));
    }

    #[test]
    fn rss_handler_rejects_non_object_payload() {
        assert!(RssFeedHandler.normalize(&json!("not an object")).is_err());
    }

    #[test]
    fn rss_handler_parses_published_timestamp() {
        let draft = RssFeedHandler
            .normalize(&json!({
                "title": "Dated item",
                "published": "2026-08-01T12:00:00Z"
            }))
            .unwrap();
        let ts = draft.timestamp.unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-08-01T12:00:00+00:00");
    }
}
