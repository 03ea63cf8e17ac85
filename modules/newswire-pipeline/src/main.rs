use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use newswire_common::{Config, Notification, NotificationChannel};
use newswire_pipeline::notify::ChannelSender;
use newswire_pipeline::Pipeline;

/// Demo channel that just logs deliveries.
struct LogSender;

#[async_trait]
impl ChannelSender for LogSender {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        info!(
            recipient = notification.recipient.as_str(),
            title = notification.title.as_str(),
            "Delivering notification"
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("newswire=info".parse()?))
        .init();

    info!("Newswire pipeline starting...");

    let config = Config::from_env();
    let mut pipeline = Pipeline::new(&config);
    pipeline
        .notifier
        .register_channel(NotificationChannel::InApp, Arc::new(LogSender));
    pipeline
        .notifier
        .subscribe("demo-user", "technology", vec![NotificationChannel::InApp])
        .await;

    let samples = vec![
        json!({
            "title": "New AI Model Released",
            "description": "A lab releases a new language model. Benchmarks follow.",
            "link": "https://example.com/ai",
            "tags": ["AI", "Tech"]
        }),
        json!({
            "title": "BREAKING: Markets tumble",
            "description": "Stock indexes fall sharply as trade talks stall."
        }),
    ];

    for payload in samples {
        if let Some(event) = pipeline
            .run(newswire_common::EventSource::RssFeed, payload, None)
            .await?
        {
            info!(
                event_id = %event.id(),
                category = event.base.category.as_deref().unwrap_or("-"),
                priority = event.priority_score.unwrap_or_default(),
                "Ingested"
            );
        }
    }

    let sent = pipeline.notifier.process_queue().await;
    let recent = pipeline.store.recent(10, config.recent_window_hours).await?;
    let swept = pipeline.store.delete_older_than(config.retention_days).await?;
    let store_stats = pipeline.store.stats().await?;
    info!(
        sent,
        recent = recent.len(),
        swept,
        stored = store_stats.total_events,
        "Pipeline run complete"
    );
    Ok(())
}
