//! Stabilizer registry: one stabilizer per voice stream
//!
//! Each independent voice stream (a microphone, a user session) gets its own
//! stickiness state. Requests on the same stream serialize on that stream's
//! stabilizer; requests on different streams never contend beyond the brief
//! map lookup.

use crate::stabilizer::Stabilizer;
use moodify_common::config::StabilizerConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Stream id used when a request names no stream
pub const DEFAULT_STREAM: &str = "default";

/// Map from stream id to its stabilizer
#[derive(Debug, Clone)]
pub struct StabilizerRegistry {
    config: StabilizerConfig,
    streams: Arc<RwLock<HashMap<String, Arc<Stabilizer>>>>,
}

impl StabilizerRegistry {
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            config,
            streams: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Stabilizer for `stream_id`, created on first use
    pub async fn stream(&self, stream_id: &str) -> Arc<Stabilizer> {
        if let Some(existing) = self.streams.read().await.get(stream_id) {
            return Arc::clone(existing);
        }

        let mut streams = self.streams.write().await;
        // Another task may have created it between the two locks
        let stabilizer = streams.entry(stream_id.to_string()).or_insert_with(|| {
            debug!(stream_id, "Creating stabilizer for new voice stream");
            Arc::new(Stabilizer::new(self.config.clone()))
        });
        Arc::clone(stabilizer)
    }

    /// Drop a stream's state; returns whether the stream existed
    pub async fn reset(&self, stream_id: &str) -> bool {
        self.streams.write().await.remove(stream_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.streams.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.streams.read().await.is_empty()
    }

    /// Known stream ids, sorted
    pub async fn stream_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.streams.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for StabilizerRegistry {
    fn default() -> Self {
        Self::new(StabilizerConfig::default())
    }
}
