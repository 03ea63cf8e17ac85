use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// --- Enums ---

/// Origin of an event. Determines which normalization handler applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    RssFeed,
    Api,
    Webhook,
    SocialMedia,
    NewsApi,
    UserSubmission,
    Blockchain,
    Internal,
}

impl std::fmt::Display for EventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventSource::RssFeed => write!(f, "rss_feed"),
            EventSource::Api => write!(f, "api"),
            EventSource::Webhook => write!(f, "webhook"),
            EventSource::SocialMedia => write!(f, "social_media"),
            EventSource::NewsApi => write!(f, "news_api"),
            EventSource::UserSubmission => write!(f, "user_submission"),
            EventSource::Blockchain => write!(f, "blockchain"),
            EventSource::Internal => write!(f, "internal"),
        }
    }
}

impl EventSource {
    pub fn from_str_loose(s: &str) -> Self {
        match s {
            "rss_feed" | "rss" => Self::RssFeed,
            "webhook" => Self::Webhook,
            "social_media" => Self::SocialMedia,
            "news_api" => Self::NewsApi,
            "user_submission" => Self::UserSubmission,
            "blockchain" => Self::Blockchain,
            "internal" => Self::Internal,
            _ => Self::Api,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Politics,
    Economics,
    Technology,
    Science,
    Entertainment,
    Sports,
    Health,
    Environment,
    International,
    BreakingNews,
    Other,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Politics => write!(f, "politics"),
            EventCategory::Economics => write!(f, "economics"),
            EventCategory::Technology => write!(f, "technology"),
            EventCategory::Science => write!(f, "science"),
            EventCategory::Entertainment => write!(f, "entertainment"),
            EventCategory::Sports => write!(f, "sports"),
            EventCategory::Health => write!(f, "health"),
            EventCategory::Environment => write!(f, "environment"),
            EventCategory::International => write!(f, "international"),
            EventCategory::BreakingNews => write!(f, "breaking_news"),
            EventCategory::Other => write!(f, "other"),
        }
    }
}

impl EventCategory {
    pub fn from_str_loose(s: &str) -> Self {
        match s {
            "politics" => Self::Politics,
            "economics" => Self::Economics,
            "technology" => Self::Technology,
            "science" => Self::Science,
            "entertainment" => Self::Entertainment,
            "sports" => Self::Sports,
            "health" => Self::Health,
            "environment" => Self::Environment,
            "international" => Self::International,
            "breaking_news" => Self::BreakingNews,
            _ => Self::Other,
        }
    }
}

/// Priority bucket derived from a prioritizer score, used for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityBucket {
    High,
    Medium,
    Low,
}

impl PriorityBucket {
    pub fn from_score(score: f64) -> Self {
        if score > 2.0 {
            Self::High
        } else if score > 1.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for PriorityBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorityBucket::High => write!(f, "high"),
            PriorityBucket::Medium => write!(f, "medium"),
            PriorityBucket::Low => write!(f, "low"),
        }
    }
}

// --- Event Types ---

/// A raw event exactly as it arrived. Immutable once created; lives only in
/// the ingestion audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: Uuid,
    pub source: EventSource,
    pub payload: Value,
    pub received_at: DateTime<Utc>,
    pub metadata: Value,
}

impl RawEvent {
    pub fn new(source: EventSource, payload: Value, metadata: Option<Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            payload,
            received_at: Utc::now(),
            metadata: metadata.unwrap_or_else(|| Value::Object(Default::default())),
        }
    }
}

/// Canonical event shape after normalization. Identity is `id`, assigned once
/// at ingestion and never reassigned downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub id: Uuid,
    pub source: EventSource,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub url: Option<String>,
    pub content: Option<String>,
    /// Logical occurrence time. Defaults to ingestion time when the source
    /// handler does not supply one.
    pub timestamp: DateTime<Utc>,
    pub metadata: Value,
}

impl NormalizedEvent {
    /// Deduplicate tags while preserving first-seen order.
    pub fn dedup_tags(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.tags.retain(|t| seen.insert(t.clone()));
    }
}

/// Three-way sentiment distribution. Scores sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

/// A surface-text entity mention extracted from an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub entity_type: String,
}

/// A normalized event plus derived enrichment fields. Composition, not
/// inheritance: the base event is embedded whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedEvent {
    pub base: NormalizedEvent,
    pub sentiment: Option<SentimentScores>,
    pub entities: Option<Vec<Entity>>,
    pub summary: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub priority_score: Option<f64>,
    /// Set exactly once, at enrichment-pipeline entry. Never recomputed.
    pub processed_at: DateTime<Utc>,
}

impl EnrichedEvent {
    pub fn new(base: NormalizedEvent) -> Self {
        Self {
            base,
            sentiment: None,
            entities: None,
            summary: None,
            keywords: None,
            priority_score: None,
            processed_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.base.id
    }
}

// --- Notification Types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Websocket,
    Email,
    Push,
    Sms,
    Webhook,
    InApp,
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationChannel::Websocket => write!(f, "websocket"),
            NotificationChannel::Email => write!(f, "email"),
            NotificationChannel::Push => write!(f, "push"),
            NotificationChannel::Sms => write!(f, "sms"),
            NotificationChannel::Webhook => write!(f, "webhook"),
            NotificationChannel::InApp => write!(f, "in_app"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl NotificationPriority {
    pub fn from_bucket(bucket: PriorityBucket) -> Self {
        match bucket {
            PriorityBucket::High => Self::High,
            PriorityBucket::Medium => Self::Medium,
            PriorityBucket::Low => Self::Low,
        }
    }
}

/// A single per-channel notification. Created unsent; transitions to sent
/// exactly once and never reverts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub event_id: Uuid,
    pub channel: NotificationChannel,
    pub priority: NotificationPriority,
    pub recipient: String,
    pub title: String,
    pub message: String,
    pub data: Option<Value>,
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        event_id: Uuid,
        channel: NotificationChannel,
        priority: NotificationPriority,
        recipient: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            channel,
            priority,
            recipient: recipient.into(),
            title: title.into(),
            message: message.into(),
            data,
            sent: false,
            sent_at: None,
            created_at: Utc::now(),
        }
    }

    /// Mark delivered. Idempotent: a notification that is already sent keeps
    /// its original `sent_at`.
    pub fn mark_sent(&mut self) {
        if !self.sent {
            self.sent = true;
            self.sent_at = Some(Utc::now());
        }
    }
}
