//! Event routing: fan-out to registered handlers.
//!
//! A handler may be registered under any mix of category, source, tag, and
//! priority-bucket keys plus the broadcast set; it runs at most once per
//! event. Handler failures are isolated so one bad handler never blocks the
//! rest.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use newswire_common::{EventSource, NormalizedEvent, PriorityBucket};

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &str;
    async fn handle(&self, event: &NormalizedEvent) -> Result<()>;
}

/// Counts of registered routes, by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteStats {
    pub category_routes: usize,
    pub priority_routes: usize,
    pub source_routes: usize,
    pub tag_routes: usize,
    pub broadcast_handlers: usize,
}

#[derive(Default)]
pub struct Router {
    by_category: HashMap<String, Vec<Arc<dyn EventHandler>>>,
    by_source: HashMap<EventSource, Vec<Arc<dyn EventHandler>>>,
    by_tag: HashMap<String, Vec<Arc<dyn EventHandler>>>,
    by_priority: HashMap<PriorityBucket, Vec<Arc<dyn EventHandler>>>,
    broadcast: Vec<Arc<dyn EventHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_category_route(&mut self, category: impl Into<String>, handler: Arc<dyn EventHandler>) {
        self.by_category.entry(category.into()).or_default().push(handler);
    }

    pub fn add_source_route(&mut self, source: EventSource, handler: Arc<dyn EventHandler>) {
        self.by_source.entry(source).or_default().push(handler);
    }

    pub fn add_tag_route(&mut self, tag: impl Into<String>, handler: Arc<dyn EventHandler>) {
        self.by_tag.entry(tag.into()).or_default().push(handler);
    }

    pub fn add_priority_route(&mut self, bucket: PriorityBucket, handler: Arc<dyn EventHandler>) {
        self.by_priority.entry(bucket).or_default().push(handler);
    }

    /// Register a handler that receives every event.
    pub fn add_broadcast_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.broadcast.push(handler);
    }

    /// Route an event to every matching handler. Returns the number of
    /// distinct handlers invoked; a handler matched through several keys runs
    /// exactly once.
    pub async fn route(&self, event: &NormalizedEvent, priority_score: Option<f64>) -> usize {
        let matched = self.matched_handlers(event, priority_score);

        for handler in &matched {
            if let Err(e) = handler.handle(event).await {
                warn!(
                    handler = handler.name(),
                    event_id = %event.id,
                    error = %e,
                    "Event handler failed"
                );
            }
        }
        matched.len()
    }

    fn matched_handlers(
        &self,
        event: &NormalizedEvent,
        priority_score: Option<f64>,
    ) -> Vec<Arc<dyn EventHandler>> {
        let mut candidates: Vec<&Arc<dyn EventHandler>> = Vec::new();

        if let Some(category) = &event.category {
            if let Some(handlers) = self.by_category.get(category) {
                candidates.extend(handlers);
            }
        }
        if let Some(handlers) = self.by_source.get(&event.source) {
            candidates.extend(handlers);
        }
        for tag in &event.tags {
            if let Some(handlers) = self.by_tag.get(tag) {
                candidates.extend(handlers);
            }
        }
        if let Some(score) = priority_score {
            if let Some(handlers) = self.by_priority.get(&PriorityBucket::from_score(score)) {
                candidates.extend(handlers);
            }
        }
        candidates.extend(&self.broadcast);

        // Deduplicate by handler identity (Arc pointer).
        let mut seen = HashSet::new();
        let mut matched = Vec::new();
        for handler in candidates {
            let identity = Arc::as_ptr(handler).cast::<()>() as usize;
            if seen.insert(identity) {
                matched.push(handler.clone());
            }
        }
        matched
    }

    pub fn route_stats(&self) -> RouteStats {
        RouteStats {
            category_routes: self.by_category.len(),
            priority_routes: self.by_priority.len(),
            source_routes: self.by_source.len(),
            tag_routes: self.by_tag.len(),
            broadcast_handlers: self.broadcast.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct CountingHandler {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        fn name(&self) -> &str {
            "counting"
        }

        async fn handle(&self, _event: &NormalizedEvent) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("handler exploded");
            }
            Ok(())
        }
    }

    fn event() -> NormalizedEvent {
        NormalizedEvent {
            id: Uuid::new_v4(),
            source: EventSource::Api,
            title: "t".into(),
            description: String::new(),
            category: Some("technology".into()),
            tags: vec!["ai".into()],
            url: None,
            content: None,
            timestamp: Utc::now(),
            metadata: json!({}),
        }
    }

    #[tokio::test]
    async fn handler_under_multiple_matching_keys_runs_once() {
        let handler = CountingHandler::new();
        let mut router = Router::new();
        router.add_category_route("technology", handler.clone());
        router.add_tag_route("ai", handler.clone());
        router.add_source_route(EventSource::Api, handler.clone());

        let invoked = router.route(&event(), None).await;
        assert_eq!(invoked, 1);
        assert_eq!(handler.calls(), 1);
    }

    #[tokio::test]
    async fn failing_handler_does_not_block_others() {
        let bad = CountingHandler::failing();
        let good = CountingHandler::new();
        let mut router = Router::new();
        router.add_broadcast_handler(bad.clone());
        router.add_broadcast_handler(good.clone());

        let invoked = router.route(&event(), None).await;
        assert_eq!(invoked, 2);
        assert_eq!(bad.calls(), 1);
        assert_eq!(good.calls(), 1);
    }

    #[tokio::test]
    async fn priority_bucket_routing() {
        let high = CountingHandler::new();
        let low = CountingHandler::new();
        let mut router = Router::new();
        router.add_priority_route(PriorityBucket::High, high.clone());
        router.add_priority_route(PriorityBucket::Low, low.clone());

        router.route(&event(), Some(2.5)).await;
        assert_eq!(high.calls(), 1);
        assert_eq!(low.calls(), 0);

        router.route(&event(), Some(0.5)).await;
        assert_eq!(low.calls(), 1);
    }

    #[tokio::test]
    async fn broadcast_only_event_counts_broadcast_handlers() {
        let broadcast = CountingHandler::new();
        let mut router = Router::new();
        router.add_broadcast_handler(broadcast.clone());
        router.add_category_route("sports", CountingHandler::new());

        let mut e = event();
        e.category = None;
        e.tags.clear();
        let invoked = router.route(&e, None).await;
        assert_eq!(invoked, 1);
    }

    #[tokio::test]
    async fn route_stats_counts_keys() {
        let mut router = Router::new();
        router.add_category_route("technology", CountingHandler::new());
        router.add_category_route("technology", CountingHandler::new());
        router.add_tag_route("ai", CountingHandler::new());
        router.add_broadcast_handler(CountingHandler::new());

        let stats = router.route_stats();
        assert_eq!(stats.category_routes, 1);
        assert_eq!(stats.tag_routes, 1);
        assert_eq!(stats.broadcast_handlers, 1);
        assert_eq!(stats.source_routes, 0);
    }
}
