use crate::{Error, Result};
use chrono::{DateTime, Utc};
use common::Event;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An event waiting to be re-delivered on the next dispatch
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeferredEvent {
    pub event: Event,
    /// First time this event was deferred
    pub deferred_at: DateTime<Utc>,
    /// How many times it has been handled and deferred again
    pub attempts: u32,
}

#[derive(Serialize, Deserialize, Default, Debug)]
struct StoreFile {
    deferred: Vec<DeferredEvent>,
}

/// File-backed FIFO of deferred events
#[derive(Debug)]
pub struct DeferredStore {
    path: PathBuf,
    events: Vec<DeferredEvent>,
}

impl DeferredStore {
    pub async fn load(path: &Path) -> Result<Self> {
        let events = match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let file: StoreFile = serde_json::from_str(&content).map_err(Error::SerializationError)?;
                file.deferred
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(Error::Stdio(e)),
        };
        Ok(Self {
            path: path.to_path_buf(),
            events,
        })
    }

    pub fn events(&self) -> &[DeferredEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Removes every queued event, oldest first
    pub fn take(&mut self) -> Vec<DeferredEvent> {
        std::mem::take(&mut self.events)
    }

    /// Queues `event` unless it is already waiting; `attempts` only grows
    pub fn defer(&mut self, event: &Event, attempts: u32) {
        if let Some(queued) = self.events.iter_mut().find(|d| &d.event == event) {
            queued.attempts = queued.attempts.max(attempts);
            return;
        }
        self.events.push(DeferredEvent {
            event: event.clone(),
            deferred_at: Utc::now(),
            attempts,
        });
    }

    /// Same as [`defer`](Self::defer) but keeps the original timestamp
    pub fn requeue(&mut self, deferred: DeferredEvent) {
        if let Some(queued) = self.events.iter_mut().find(|d| d.event == deferred.event) {
            queued.attempts = queued.attempts.max(deferred.attempts);
            queued.deferred_at = queued.deferred_at.min(deferred.deferred_at);
            return;
        }
        self.events.push(deferred);
    }

    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(Error::Stdio)?;
        }
        let file = StoreFile {
            deferred: self.events.clone(),
        };
        let content = serde_json::to_string_pretty(&file).map_err(Error::SerializationError)?;
        tokio::fs::write(&self.path, content).await.map_err(Error::Stdio)
    }
}
