//! Notification fan-out and delivery.
//!
//! Subscriptions are keyed `(user, topic) -> channel set`; re-subscribing
//! replaces the set. Fan-out creates one notification per subscriber and
//! channel and queues it; delivery is best-effort, failed notifications stay
//! queued until the next `process_queue` pass.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use newswire_common::{
    EnrichedEvent, Notification, NotificationChannel, NotificationPriority,
};

/// Per-channel delivery collaborator. Must tolerate repeated invocation for
/// the same notification; idempotency is the channel's responsibility.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}

/// Notification counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotifyStats {
    pub queued: usize,
    pub sent: usize,
    pub subscribers: usize,
}

#[derive(Default)]
struct NotifierInner {
    /// user -> topic -> channels
    subscriptions: HashMap<String, HashMap<String, Vec<NotificationChannel>>>,
    queue: VecDeque<Notification>,
    sent: Vec<Notification>,
}

#[derive(Default)]
pub struct Notifier {
    handlers: HashMap<NotificationChannel, Arc<dyn ChannelSender>>,
    inner: Mutex<NotifierInner>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_channel(&mut self, channel: NotificationChannel, sender: Arc<dyn ChannelSender>) {
        self.handlers.insert(channel, sender);
    }

    /// Subscribe a user to a topic. Replaces any existing channel set for
    /// that `(user, topic)` pair.
    pub async fn subscribe(
        &self,
        user_id: impl Into<String>,
        topic: impl Into<String>,
        channels: Vec<NotificationChannel>,
    ) {
        let mut inner = self.inner.lock().await;
        inner
            .subscriptions
            .entry(user_id.into())
            .or_default()
            .insert(topic.into(), channels);
    }

    pub async fn unsubscribe(&self, user_id: &str, topic: &str) {
        let mut inner = self.inner.lock().await;
        if let Some(topics) = inner.subscriptions.get_mut(user_id) {
            topics.remove(topic);
        }
    }

    /// Create and queue notifications for an event. The topic defaults to the
    /// event's category, else `"general"`. Returns the created notifications.
    pub async fn notify(
        &self,
        event: &EnrichedEvent,
        topic: Option<&str>,
        priority: NotificationPriority,
    ) -> Vec<Notification> {
        let topic = topic
            .map(str::to_string)
            .or_else(|| event.base.category.clone())
            .unwrap_or_else(|| "general".to_string());

        let message = event
            .summary
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| event.base.description.chars().take(100).collect());

        let mut created = Vec::new();
        let mut inner = self.inner.lock().await;
        for (user_id, topics) in &inner.subscriptions {
            let Some(channels) = topics.get(&topic) else {
                continue;
            };
            for channel in channels {
                created.push(Notification::new(
                    event.id(),
                    *channel,
                    priority,
                    user_id.clone(),
                    event.base.title.clone(),
                    message.clone(),
                    serde_json::to_value(event).ok(),
                ));
            }
        }
        inner.queue.extend(created.iter().cloned());
        debug!(topic, count = created.len(), "Queued notifications");
        created
    }

    /// Attempt delivery for one notification. A missing channel handler or a
    /// delivery error returns false and leaves the notification unsent.
    pub async fn send(&self, notification: &mut Notification) -> bool {
        let Some(handler) = self.handlers.get(&notification.channel) else {
            warn!(channel = %notification.channel, "No handler for notification channel");
            return false;
        };

        match handler.deliver(notification).await {
            Ok(()) => {
                notification.mark_sent();
                self.inner.lock().await.sent.push(notification.clone());
                true
            }
            Err(e) => {
                warn!(
                    channel = %notification.channel,
                    notification_id = %notification.id,
                    error = %e,
                    "Notification delivery failed"
                );
                false
            }
        }
    }

    /// One delivery attempt for every queued notification. Failures go back
    /// on the queue; returns the number sent.
    pub async fn process_queue(&self) -> usize {
        let pending: Vec<Notification> = {
            let mut inner = self.inner.lock().await;
            inner.queue.drain(..).collect()
        };

        let mut sent_count = 0;
        let mut failed = Vec::new();
        for mut notification in pending {
            if self.send(&mut notification).await {
                sent_count += 1;
            } else {
                failed.push(notification);
            }
        }

        if !failed.is_empty() {
            let mut inner = self.inner.lock().await;
            inner.queue.extend(failed);
        }
        sent_count
    }

    /// All topic subscriptions for a user.
    pub async fn subscriptions_for(&self, user_id: &str) -> HashMap<String, Vec<NotificationChannel>> {
        self.inner
            .lock()
            .await
            .subscriptions
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn stats(&self) -> NotifyStats {
        let inner = self.inner.lock().await;
        NotifyStats {
            queued: inner.queue.len(),
            sent: inner.sent.len(),
            subscribers: inner.subscriptions.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use newswire_common::{EventSource, NormalizedEvent};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct RecordingSender {
        deliveries: AtomicUsize,
        fail: bool,
    }

    impl RecordingSender {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                deliveries: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl ChannelSender for RecordingSender {
        async fn deliver(&self, _notification: &Notification) -> Result<()> {
            self.deliveries.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("channel down");
            }
            Ok(())
        }
    }

    fn enriched(category: Option<&str>) -> EnrichedEvent {
        let mut e = EnrichedEvent::new(NormalizedEvent {
            id: Uuid::new_v4(),
            source: EventSource::NewsApi,
            title: "Title".into(),
            description: "A description that runs on for a while.".into(),
            category: category.map(str::to_string),
            tags: vec![],
            url: None,
            content: None,
            timestamp: Utc::now(),
            metadata: json!({}),
        });
        e.summary = Some("A description.".into());
        e
    }

    #[tokio::test]
    async fn notify_fans_out_per_subscriber_and_channel() {
        let notifier = Notifier::new();
        notifier
            .subscribe(
                "user1",
                "technology",
                vec![NotificationChannel::Email, NotificationChannel::Push],
            )
            .await;
        notifier
            .subscribe("user2", "technology", vec![NotificationChannel::InApp])
            .await;
        notifier
            .subscribe("user3", "sports", vec![NotificationChannel::Email])
            .await;

        let created = notifier
            .notify(
                &enriched(Some("technology")),
                None,
                NotificationPriority::Medium,
            )
            .await;
        assert_eq!(created.len(), 3);
        assert!(created.iter().all(|n| !n.sent));
        assert_eq!(notifier.stats().await.queued, 3);
    }

    #[tokio::test]
    async fn topic_defaults_to_general_without_category() {
        let notifier = Notifier::new();
        notifier
            .subscribe("user1", "general", vec![NotificationChannel::Email])
            .await;

        let created = notifier
            .notify(&enriched(None), None, NotificationPriority::Low)
            .await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].message, "A description.");
    }

    #[tokio::test]
    async fn resubscribe_replaces_channel_set() {
        let notifier = Notifier::new();
        notifier
            .subscribe("user1", "news", vec![NotificationChannel::Email, NotificationChannel::Sms])
            .await;
        notifier
            .subscribe("user1", "news", vec![NotificationChannel::Push])
            .await;

        let subs = notifier.subscriptions_for("user1").await;
        assert_eq!(subs.get("news"), Some(&vec![NotificationChannel::Push]));
    }

    #[tokio::test]
    async fn process_queue_retains_failures_and_is_idempotent() {
        let mut notifier = Notifier::new();
        let good = RecordingSender::new(false);
        let bad = RecordingSender::new(true);
        notifier.register_channel(NotificationChannel::Email, good.clone());
        notifier.register_channel(NotificationChannel::Sms, bad.clone());

        notifier
            .subscribe(
                "user1",
                "technology",
                vec![NotificationChannel::Email, NotificationChannel::Sms],
            )
            .await;
        notifier
            .notify(
                &enriched(Some("technology")),
                None,
                NotificationPriority::High,
            )
            .await;

        let sent = notifier.process_queue().await;
        assert_eq!(sent, 1);
        let stats = notifier.stats().await;
        assert_eq!(stats.sent, 1);
        assert_eq!(stats.queued, 1);

        // Failed sms stays queued and is retried; still fails, still queued.
        let sent_again = notifier.process_queue().await;
        assert_eq!(sent_again, 0);
        assert_eq!(notifier.stats().await.queued, 1);
        assert_eq!(bad.deliveries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn send_without_handler_fails_quietly() {
        let notifier = Notifier::new();
        let mut n = Notification::new(
            Uuid::new_v4(),
            NotificationChannel::Webhook,
            NotificationPriority::Low,
            "user1",
            "t",
            "m",
            None,
        );
        assert!(!notifier.send(&mut n).await);
        assert!(!n.sent);
    }

    #[tokio::test]
    async fn unsubscribe_stops_notifications() {
        let notifier = Notifier::new();
        notifier
            .subscribe("user1", "news", vec![NotificationChannel::Email])
            .await;
        notifier.unsubscribe("user1", "news").await;

        let created = notifier
            .notify(&enriched(Some("news")), None, NotificationPriority::Low)
            .await;
        assert!(created.is_empty());
    }
}
