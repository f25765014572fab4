//! Runtime for story sessions
//!
//! Each session is owned by a [`StoryController`] behind its own async
//! mutex, so operations on one story are serialized while different
//! stories proceed independently.

mod controller;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use controller::{Collaborators, StoryController, StoryError};
pub use traits::*;

use crate::config::StoryConfig;
use crate::state_machine::SessionMode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How often the idle sweep looks for abandoned stories
pub const IDLE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared handle to one story
pub type StoryHandle = Arc<Mutex<StoryController>>;

/// Listing entry for a story. Stories busy with a generation report only
/// their id and creation time.
#[derive(Debug, Clone, Serialize)]
pub struct StorySummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub busy: bool,
    pub title: Option<String>,
    pub mode: Option<SessionMode>,
    pub turn_count: Option<u32>,
}

struct StoryEntry {
    created_at: DateTime<Utc>,
    last_active: Instant,
    handle: StoryHandle,
}

/// Manager for all live story sessions
pub struct SessionManager {
    collaborators: Collaborators,
    config: StoryConfig,
    stories: RwLock<HashMap<String, StoryEntry>>,
}

impl SessionManager {
    pub fn new(collaborators: Collaborators, config: StoryConfig) -> Self {
        Self {
            collaborators,
            config,
            stories: RwLock::new(HashMap::new()),
        }
    }

    /// Create an empty story awaiting its parameters
    pub async fn create(&self) -> (String, StoryHandle) {
        let id = uuid::Uuid::new_v4().to_string();
        let controller = StoryController::new(id.clone(), self.config, self.collaborators.clone());
        let created_at = controller.created_at();
        let handle = Arc::new(Mutex::new(controller));

        let entry = StoryEntry {
            created_at,
            last_active: Instant::now(),
            handle: handle.clone(),
        };
        self.stories.write().await.insert(id.clone(), entry);
        tracing::info!(session_id = %id, "Story created");
        (id, handle)
    }

    /// Look up a story and mark it active
    pub async fn get(&self, id: &str) -> Option<StoryHandle> {
        let mut stories = self.stories.write().await;
        let entry = stories.get_mut(id)?;
        entry.last_active = Instant::now();
        Some(entry.handle.clone())
    }

    /// Drop a story; returns false if it did not exist
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.stories.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Story discarded");
        }
        removed
    }

    /// All stories, newest first
    pub async fn list(&self) -> Vec<StorySummary> {
        let stories = self.stories.read().await;
        let mut summaries: Vec<StorySummary> = stories
            .iter()
            .map(|(id, entry)| match entry.handle.try_lock() {
                Ok(controller) => StorySummary {
                    id: id.clone(),
                    created_at: entry.created_at,
                    busy: false,
                    title: controller.title().map(str::to_string),
                    mode: Some(controller.session().mode()),
                    turn_count: Some(controller.session().turn_count()),
                },
                Err(_) => StorySummary {
                    id: id.clone(),
                    created_at: entry.created_at,
                    busy: true,
                    title: None,
                    mode: None,
                    turn_count: None,
                },
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        summaries
    }

    /// Drop stories untouched for longer than `max_idle`; busy stories stay
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut stories = self.stories.write().await;
        let before = stories.len();
        stories.retain(|id, entry| {
            let idle = entry.last_active.elapsed();
            if idle < max_idle || entry.handle.try_lock().is_err() {
                return true;
            }
            tracing::info!(session_id = %id, idle_secs = idle.as_secs(), "Evicting idle story");
            false
        });
        before - stories.len()
    }

    /// Periodically evict stories idle for longer than the configured timeout
    pub fn spawn_idle_sweep(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(IDLE_SWEEP_INTERVAL);
            loop {
                ticker.tick().await;
                let evicted = manager.evict_idle(manager.config.idle_timeout).await;
                if evicted > 0 {
                    tracing::info!(evicted, "Idle sweep finished");
                }
            }
        })
    }
}
