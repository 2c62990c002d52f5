//! Asset loading with observable progress.
//!
//! Each loader wraps one storage lookup (audio or animation) and keeps a
//! shared [`LoadStatus`] the list renderer can poll.

use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;

use dance_types::{AssetKind, LoadStatus};

use crate::error::FetchError;
use crate::events::EventBus;

/// Storage/catalog backend that turns source references into playable
/// locations.
#[async_trait]
pub trait AssetStorage: Send + Sync {
    /// Resolve the audio track for a dance.
    async fn resolve_audio_url(
        &self,
        dance_id: &str,
        source_ref: &str,
        progress: &ProgressReporter,
    ) -> anyhow::Result<String>;
    /// Resolve the animation clip for a dance.
    async fn resolve_animation_url(
        &self,
        dance_id: &str,
        source_ref: &str,
        progress: &ProgressReporter,
    ) -> anyhow::Result<String>;
}

/// Progress sink handed to storage while one asset resolves.
#[derive(Clone)]
pub struct ProgressReporter {
    dance_id: String,
    kind: AssetKind,
    status: Arc<Mutex<LoadStatus>>,
    events: EventBus,
}

impl ProgressReporter {
    pub fn dance_id(&self) -> &str {
        &self.dance_id
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Record a new percent. Values are clamped to 100 and never move
    /// backwards within a fetch.
    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        let advanced = match self.status.lock() {
            Ok(mut s) if percent > s.percent => {
                s.percent = percent;
                true
            }
            _ => false,
        };
        if advanced {
            tracing::debug!(
                dance_id = %self.dance_id,
                kind = %self.kind,
                percent,
                "asset fetch progress"
            );
            self.events.progress(&self.dance_id, self.kind, percent);
        }
    }

    /// Record progress from byte counts; ignored when the total is unknown.
    pub fn report_bytes(&self, done: u64, total: u64) {
        if total == 0 {
            return;
        }
        let percent = done.saturating_mul(100) / total;
        self.report(percent.min(100) as u8);
    }
}

/// Fetches one kind of asset and tracks its progress.
#[derive(Clone)]
pub struct AssetLoader {
    kind: AssetKind,
    storage: Arc<dyn AssetStorage>,
    status: Arc<Mutex<LoadStatus>>,
    events: EventBus,
}

impl AssetLoader {
    pub fn new(kind: AssetKind, storage: Arc<dyn AssetStorage>, events: EventBus) -> Self {
        Self {
            kind,
            storage,
            status: Arc::new(Mutex::new(LoadStatus::default())),
            events,
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Snapshot of the current fetch status.
    pub fn status(&self) -> LoadStatus {
        self.status.lock().map(|s| *s).unwrap_or_default()
    }

    /// Clear a stale percent left behind by a failed fetch.
    pub fn reset(&self) {
        if let Ok(mut s) = self.status.lock() {
            *s = LoadStatus::default();
        }
    }

    /// Resolve `source_ref` into a playable location.
    ///
    /// Overlapping calls share this loader's status; the latest progress
    /// report wins. On failure the percent is left at its last value.
    pub async fn fetch_url(&self, dance_id: &str, source_ref: &str) -> Result<String, FetchError> {
        self.begin();
        tracing::debug!(dance_id, kind = %self.kind, source_ref, "asset fetch started");

        let result = if source_ref.trim().is_empty() {
            Err(anyhow!("{} source is missing", self.kind))
        } else {
            let reporter = ProgressReporter {
                dance_id: dance_id.to_string(),
                kind: self.kind,
                status: self.status.clone(),
                events: self.events.clone(),
            };
            let resolved = match self.kind {
                AssetKind::Audio => {
                    self.storage
                        .resolve_audio_url(dance_id, source_ref, &reporter)
                        .await
                }
                AssetKind::Animation => {
                    self.storage
                        .resolve_animation_url(dance_id, source_ref, &reporter)
                        .await
                }
            };
            if resolved.is_ok() {
                reporter.report(100);
            }
            resolved
        };

        self.set_in_flight(false);
        match result {
            Ok(location) => {
                tracing::debug!(dance_id, kind = %self.kind, %location, "asset fetch resolved");
                Ok(location)
            }
            Err(cause) => {
                tracing::warn!(dance_id, kind = %self.kind, error = %format!("{cause:#}"), "asset fetch failed");
                self.events.fetch_failed(dance_id, self.kind);
                Err(FetchError {
                    dance_id: dance_id.to_string(),
                    kind: self.kind,
                    cause,
                })
            }
        }
    }

    fn begin(&self) {
        if let Ok(mut s) = self.status.lock() {
            s.in_flight = true;
            s.percent = 0;
        }
    }

    fn set_in_flight(&self, value: bool) {
        if let Ok(mut s) = self.status.lock() {
            s.in_flight = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::events::DanceEvent;
    use crate::testing::{FakeStorage, Script};

    fn loader(kind: AssetKind, storage: &Arc<FakeStorage>) -> AssetLoader {
        AssetLoader::new(kind, storage.clone(), EventBus::new())
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_reaches_full_percent_and_clears_in_flight() {
        let storage = Arc::new(FakeStorage::default());
        storage.script("a.mp3", Script::new(400, 4));
        let loader = loader(AssetKind::Audio, &storage);

        let location = loader.fetch_url("a", "a.mp3").await.unwrap();

        assert_eq!(location, "mem://a.mp3");
        assert_eq!(
            loader.status(),
            LoadStatus {
                in_flight: false,
                percent: 100
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn status_is_in_flight_while_resolving() {
        let storage = Arc::new(FakeStorage::default());
        storage.script("a.vmd", Script::new(1000, 4));
        let loader = loader(AssetKind::Animation, &storage);

        let observer = async {
            tokio::time::sleep(Duration::from_millis(600)).await;
            loader.status()
        };
        let (result, mid) = tokio::join!(loader.fetch_url("a", "a.vmd"), observer);

        assert!(result.is_ok());
        assert!(mid.in_flight);
        assert_eq!(mid.percent, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_last_percent() {
        let storage = Arc::new(FakeStorage::default());
        storage.script("a.mp3", Script::new(400, 4).failing("connection reset"));
        let loader = loader(AssetKind::Audio, &storage);

        let err = loader.fetch_url("a", "a.mp3").await.unwrap_err();

        assert_eq!(err.dance_id, "a");
        assert_eq!(err.kind, AssetKind::Audio);
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(
            loader.status(),
            LoadStatus {
                in_flight: false,
                percent: 75
            }
        );

        loader.reset();
        assert_eq!(loader.status(), LoadStatus::default());
    }

    #[tokio::test]
    async fn missing_source_fails_without_calling_storage() {
        let storage = Arc::new(FakeStorage::default());
        let loader = loader(AssetKind::Animation, &storage);

        let err = loader.fetch_url("a", "  ").await.unwrap_err();

        assert_eq!(err.kind, AssetKind::Animation);
        assert!(storage.calls().is_empty());
        assert!(!loader.status().in_flight);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_events_are_published_in_order() {
        let storage = Arc::new(FakeStorage::default());
        storage.script("a.mp3", Script::new(300, 3));
        let events = EventBus::new();
        let mut receiver = events.subscribe();
        let loader = AssetLoader::new(AssetKind::Audio, storage.clone(), events);

        loader.fetch_url("a", "a.mp3").await.unwrap();

        let mut percents = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            if let DanceEvent::Progress { percent, .. } = event {
                percents.push(percent);
            }
        }
        assert_eq!(percents, vec![33, 66, 100]);
    }

    #[test]
    fn reporter_ignores_regressions_and_clamps() {
        let status = Arc::new(Mutex::new(LoadStatus {
            in_flight: true,
            percent: 0,
        }));
        let reporter = ProgressReporter {
            dance_id: "a".to_string(),
            kind: AssetKind::Audio,
            status: status.clone(),
            events: EventBus::new(),
        };

        reporter.report(60);
        reporter.report(30);
        assert_eq!(status.lock().unwrap().percent, 60);

        reporter.report(250);
        assert_eq!(status.lock().unwrap().percent, 100);
    }

    #[test]
    fn reporter_converts_byte_counts() {
        let status = Arc::new(Mutex::new(LoadStatus::default()));
        let reporter = ProgressReporter {
            dance_id: "a".to_string(),
            kind: AssetKind::Animation,
            status: status.clone(),
            events: EventBus::new(),
        };

        reporter.report_bytes(10, 0);
        assert_eq!(status.lock().unwrap().percent, 0);

        reporter.report_bytes(512, 2048);
        assert_eq!(status.lock().unwrap().percent, 25);
    }
}
