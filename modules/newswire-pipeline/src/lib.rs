//! Newswire event pipeline.
//!
//! Seven cooperating stages move an event from raw payload to delivered
//! notification: ingest → classify → prioritize → route → process/enrich →
//! store → notify. Classifier and prioritizer are pure scorers; everything
//! stateful lives behind an explicit `Pipeline` handle.

pub mod classify;
pub mod enrich;
pub mod ingest;
pub mod notify;
pub mod pipeline;
pub mod prioritize;
pub mod process;
pub mod route;
pub mod store;

pub use pipeline::Pipeline;
