//! Fake collaborators shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::time::Instant;

use dance_types::DanceItem;

use crate::coordinator::{PlaybackCompletion, Viewer};
use crate::loader::{AssetStorage, ProgressReporter};

/// Timing and outcome of one fake fetch.
#[derive(Clone, Debug)]
pub(crate) struct Script {
    duration_ms: u64,
    steps: u32,
    failure: Option<String>,
}

impl Script {
    pub(crate) fn new(duration_ms: u64, steps: u32) -> Self {
        Self {
            duration_ms,
            steps,
            failure: None,
        }
    }

    pub(crate) fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::new(100, 1)
    }
}

/// Storage that sleeps through scripted steps and resolves to `mem://<ref>`.
#[derive(Default)]
pub(crate) struct FakeStorage {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<String>>,
}

impl FakeStorage {
    pub(crate) fn script(&self, source_ref: &str, script: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert(source_ref.to_string(), script);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn run(&self, source_ref: &str, progress: &ProgressReporter) -> anyhow::Result<String> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(source_ref)
            .cloned()
            .unwrap_or_default();
        self.calls.lock().unwrap().push(source_ref.to_string());

        let steps = script.steps.max(1);
        let step = Duration::from_millis(script.duration_ms / u64::from(steps));
        for i in 1..=steps {
            tokio::time::sleep(step).await;
            if i < steps {
                progress.report((i * 100 / steps) as u8);
            }
        }
        match script.failure {
            Some(message) => Err(anyhow!(message)),
            None => Ok(format!("mem://{source_ref}")),
        }
    }
}

#[async_trait]
impl AssetStorage for FakeStorage {
    async fn resolve_audio_url(
        &self,
        _dance_id: &str,
        source_ref: &str,
        progress: &ProgressReporter,
    ) -> anyhow::Result<String> {
        self.run(source_ref, progress).await
    }

    async fn resolve_animation_url(
        &self,
        _dance_id: &str,
        source_ref: &str,
        progress: &ProgressReporter,
    ) -> anyhow::Result<String> {
        self.run(source_ref, progress).await
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PlayCall {
    pub(crate) dance_id: String,
    pub(crate) animation: String,
    pub(crate) audio: String,
    pub(crate) at: Instant,
}

/// Viewer that records commands and holds completions until a test fires them.
#[derive(Default)]
pub(crate) struct RecordingViewer {
    plays: Mutex<Vec<PlayCall>>,
    resets: Mutex<usize>,
    pending: Mutex<Vec<PlaybackCompletion>>,
}

impl RecordingViewer {
    pub(crate) fn plays(&self) -> Vec<PlayCall> {
        self.plays.lock().unwrap().clone()
    }

    pub(crate) fn played_ids(&self) -> Vec<String> {
        self.plays().into_iter().map(|call| call.dance_id).collect()
    }

    pub(crate) fn resets(&self) -> usize {
        *self.resets.lock().unwrap()
    }

    /// Fire the held completion for `dance_id`; returns false if none is held.
    pub(crate) fn finish(&self, dance_id: &str) -> bool {
        let completion = {
            let mut pending = self.pending.lock().unwrap();
            let idx = pending.iter().position(|c| c.dance_id() == dance_id);
            idx.map(|idx| pending.remove(idx))
        };
        match completion {
            Some(completion) => {
                completion.complete();
                true
            }
            None => false,
        }
    }
}

impl Viewer for RecordingViewer {
    fn play(&self, animation: String, audio: String, completion: PlaybackCompletion) {
        self.plays.lock().unwrap().push(PlayCall {
            dance_id: completion.dance_id().to_string(),
            animation,
            audio,
            at: Instant::now(),
        });
        self.pending.lock().unwrap().push(completion);
    }

    fn reset_to_idle(&self) {
        *self.resets.lock().unwrap() += 1;
    }
}

pub(crate) fn dance(id: &str) -> DanceItem {
    DanceItem {
        dance_id: id.to_string(),
        name: format!("Dance {id}"),
        author: "tester".to_string(),
        thumb: String::new(),
        src: format!("{id}.vmd"),
        audio: format!("{id}.mp3"),
    }
}
