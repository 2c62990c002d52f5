//! Headless viewer that plays each dance for a fixed duration.

use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

use dance_core::{PlaybackCompletion, Viewer};

pub struct TimedViewer {
    playback: Duration,
    current: Mutex<Option<JoinHandle<()>>>,
}

impl TimedViewer {
    pub fn new(playback: Duration) -> Self {
        Self {
            playback,
            current: Mutex::new(None),
        }
    }

    /// `true` while a dance timer is still running.
    #[cfg(test)]
    fn is_dancing(&self) -> bool {
        self.current
            .lock()
            .map(|guard| guard.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }
}

impl Viewer for TimedViewer {
    fn play(&self, animation: String, audio: String, completion: PlaybackCompletion) {
        let dance_id = completion.dance_id().to_string();
        tracing::info!(%dance_id, %animation, %audio, "viewer dancing");
        let playback = self.playback;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(playback).await;
            tracing::info!(%dance_id, "viewer finished dance");
            completion.complete();
        });
        let previous = self
            .current
            .lock()
            .ok()
            .and_then(|mut guard| guard.replace(handle));
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn reset_to_idle(&self) {
        let current = self.current.lock().ok().and_then(|mut guard| guard.take());
        if let Some(handle) = current {
            handle.abort();
        }
        tracing::info!("viewer reset to idle");
    }
}
