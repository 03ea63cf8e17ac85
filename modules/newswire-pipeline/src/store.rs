//! Enriched event storage.
//!
//! `EventStore` is the persistence seam: any backend able to upsert by id,
//! filter by category/source/tag/time, and substring-search can implement
//! it. `MemoryEventStore` is the in-process reference implementation and the
//! default the pipeline assembles with.
//!
//! Storage failures are the one error class the pipeline surfaces to its
//! caller; silent data loss is not acceptable.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use newswire_common::{EnrichedEvent, EventSource};

/// Storage counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub total_events: usize,
    pub categories: usize,
    pub sources: usize,
    pub tags: usize,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Upsert by id. Secondary indexes are appended on first insert only;
    /// updates overwrite fields without duplicating index entries.
    async fn store(&self, event: EnrichedEvent) -> Result<()>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<EnrichedEvent>>;

    async fn by_category(&self, category: &str, limit: usize) -> Result<Vec<EnrichedEvent>>;

    async fn by_source(&self, source: EventSource, limit: usize) -> Result<Vec<EnrichedEvent>>;

    async fn by_tag(&self, tag: &str, limit: usize) -> Result<Vec<EnrichedEvent>>;

    /// Events within the last `within_hours`, newest first.
    async fn recent(&self, limit: usize, within_hours: i64) -> Result<Vec<EnrichedEvent>>;

    /// Case-insensitive substring search over title and description.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<EnrichedEvent>>;

    /// Delete events older than `days`, dropping their index entries too.
    /// Returns the number deleted.
    async fn delete_older_than(&self, days: i64) -> Result<usize>;

    async fn stats(&self) -> Result<StoreStats>;
}

#[derive(Default)]
struct StoreInner {
    events: HashMap<Uuid, EnrichedEvent>,
    by_category: HashMap<String, Vec<Uuid>>,
    by_source: HashMap<EventSource, Vec<Uuid>>,
    by_tag: HashMap<String, Vec<Uuid>>,
}

impl StoreInner {
    fn collect(&self, ids: &[Uuid]) -> Vec<EnrichedEvent> {
        ids.iter().filter_map(|id| self.events.get(id)).cloned().collect()
    }

    /// Drop index entries whose event no longer exists, and empty keys.
    fn sweep_indexes(&mut self) {
        let events = &self.events;
        self.by_category.retain(|_, ids| {
            ids.retain(|id| events.contains_key(id));
            !ids.is_empty()
        });
        self.by_source.retain(|_, ids| {
            ids.retain(|id| events.contains_key(id));
            !ids.is_empty()
        });
        self.by_tag.retain(|_, ids| {
            ids.retain(|id| events.contains_key(id));
            !ids.is_empty()
        });
    }
}

/// In-memory store guarded by a read-write lock: index mutation is
/// serialized, reads proceed concurrently.
#[derive(Default)]
pub struct MemoryEventStore {
    inner: RwLock<StoreInner>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_capped(mut events: Vec<EnrichedEvent>, limit: usize) -> Vec<EnrichedEvent> {
    events.sort_by(|a, b| b.base.timestamp.cmp(&a.base.timestamp));
    events.truncate(limit);
    events
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn store(&self, event: EnrichedEvent) -> Result<()> {
        let mut inner = self.inner.write().await;
        let id = event.id();

        // Last write wins on duplicate ids; indexes already carry the id.
        if !inner.events.contains_key(&id) {
            if let Some(category) = &event.base.category {
                inner.by_category.entry(category.clone()).or_default().push(id);
            }
            inner.by_source.entry(event.base.source).or_default().push(id);
            for tag in &event.base.tags {
                inner.by_tag.entry(tag.clone()).or_default().push(id);
            }
        }
        inner.events.insert(id, event);
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<EnrichedEvent>> {
        Ok(self.inner.read().await.events.get(&id).cloned())
    }

    async fn by_category(&self, category: &str, limit: usize) -> Result<Vec<EnrichedEvent>> {
        let inner = self.inner.read().await;
        let ids = inner.by_category.get(category).cloned().unwrap_or_default();
        Ok(sorted_capped(inner.collect(&ids), limit))
    }

    async fn by_source(&self, source: EventSource, limit: usize) -> Result<Vec<EnrichedEvent>> {
        let inner = self.inner.read().await;
        let ids = inner.by_source.get(&source).cloned().unwrap_or_default();
        Ok(sorted_capped(inner.collect(&ids), limit))
    }

    async fn by_tag(&self, tag: &str, limit: usize) -> Result<Vec<EnrichedEvent>> {
        let inner = self.inner.read().await;
        let ids = inner.by_tag.get(tag).cloned().unwrap_or_default();
        Ok(sorted_capped(inner.collect(&ids), limit))
    }

    async fn recent(&self, limit: usize, within_hours: i64) -> Result<Vec<EnrichedEvent>> {
        let cutoff = Utc::now() - Duration::hours(within_hours);
        let inner = self.inner.read().await;
        let matching: Vec<EnrichedEvent> = inner
            .events
            .values()
            .filter(|e| e.base.timestamp > cutoff)
            .cloned()
            .collect();
        Ok(sorted_capped(matching, limit))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<EnrichedEvent>> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;
        let matching: Vec<EnrichedEvent> = inner
            .events
            .values()
            .filter(|e| {
                e.base.title.to_lowercase().contains(&needle)
                    || e.base.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        Ok(sorted_capped(matching, limit))
    }

    async fn delete_older_than(&self, days: i64) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(days);
        let mut inner = self.inner.write().await;

        let stale: Vec<Uuid> = inner
            .events
            .iter()
            .filter(|(_, e)| e.base.timestamp < cutoff)
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            inner.events.remove(id);
        }
        inner.sweep_indexes();
        Ok(stale.len())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let inner = self.inner.read().await;
        Ok(StoreStats {
            total_events: inner.events.len(),
            categories: inner.by_category.len(),
            sources: inner.by_source.len(),
            tags: inner.by_tag.len(),
        })
    }
}
