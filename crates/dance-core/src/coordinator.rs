//! Single-active playback coordination.
//!
//! The coordinator owns [`PlaybackState`] and is the only writer. Every play
//! request receives a [`PlayTicket`]; effects that land after a suspension
//! point (fetch results, viewer completions) are committed only while their
//! ticket is still current.

use std::fmt;
use std::sync::{Arc, Mutex};

use dance_types::{PlaybackPhase, PlaybackState};

use crate::events::EventBus;

/// External 3D viewer surface.
///
/// The coordinator never issues a second `play` while a previous one is
/// still engaged; it calls `reset_to_idle` first.
pub trait Viewer: Send + Sync {
    /// Start dancing; `completion` must be fired once at natural end.
    fn play(&self, animation: String, audio: String, completion: PlaybackCompletion);
    /// Stop any dance and return the model to its idle pose.
    fn reset_to_idle(&self);
}

/// Identifies one play request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayTicket {
    dance_id: String,
    generation: u64,
}

impl PlayTicket {
    pub fn dance_id(&self) -> &str {
        &self.dance_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of [`PlaybackCoordinator::begin_request`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayRequest {
    /// The dance was already playing and has been paused.
    Paused,
    /// A new request is now current; fetches should start.
    Started(PlayTicket),
}

#[derive(Debug, Default)]
struct CoordinatorState {
    active_id: Option<String>,
    is_playing: bool,
    phase: PlaybackPhase,
    generation: u64,
    /// Generation whose viewer `play` has not completed or been reset.
    viewer_engaged: Option<u64>,
}

impl CoordinatorState {
    fn is_current(&self, ticket: &PlayTicket) -> bool {
        self.is_playing && self.generation == ticket.generation
    }

    fn set_idle(&mut self) {
        self.active_id = None;
        self.is_playing = false;
        self.phase = PlaybackPhase::Idle;
    }
}

/// Process-wide authority on which dance is playing.
#[derive(Clone)]
pub struct PlaybackCoordinator {
    inner: Arc<Mutex<CoordinatorState>>,
    viewer: Arc<dyn Viewer>,
    events: EventBus,
}

impl PlaybackCoordinator {
    pub fn new(viewer: Arc<dyn Viewer>, events: EventBus) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CoordinatorState::default())),
            viewer,
            events,
        }
    }

    /// Snapshot of the externally observable flags.
    pub fn state(&self) -> PlaybackState {
        self.inner
            .lock()
            .map(|s| PlaybackState {
                active_id: s.active_id.clone(),
                is_playing: s.is_playing,
            })
            .unwrap_or_default()
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.inner.lock().map(|s| s.phase).unwrap_or_default()
    }

    /// `true` while `ticket` is the latest request and playback was not stopped.
    pub fn is_current(&self, ticket: &PlayTicket) -> bool {
        self.inner
            .lock()
            .map(|s| s.is_current(ticket))
            .unwrap_or(false)
    }

    /// Toggle playback for `dance_id`.
    ///
    /// Pauses (and resets the viewer) when `dance_id` is already playing;
    /// otherwise marks it active optimistically and issues a new ticket.
    pub fn begin_request(&self, dance_id: &str) -> PlayRequest {
        let request = {
            let mut s = self.inner.lock().unwrap_or_else(|err| err.into_inner());
            if s.is_playing && s.active_id.as_deref() == Some(dance_id) {
                s.set_idle();
                s.viewer_engaged = None;
                PlayRequest::Paused
            } else {
                s.generation += 1;
                s.active_id = Some(dance_id.to_string());
                s.is_playing = true;
                s.phase = PlaybackPhase::Requesting;
                PlayRequest::Started(PlayTicket {
                    dance_id: dance_id.to_string(),
                    generation: s.generation,
                })
            }
        };

        match &request {
            PlayRequest::Paused => {
                tracing::info!(dance_id, "dance paused");
                self.viewer.reset_to_idle();
            }
            PlayRequest::Started(ticket) => {
                tracing::info!(dance_id, generation = ticket.generation, "dance requested");
            }
        }
        self.events.playback_changed();
        request
    }

    /// Stop whatever is playing. Returns false when already idle.
    pub fn pause(&self) -> bool {
        let stopped = {
            let mut s = self.inner.lock().unwrap_or_else(|err| err.into_inner());
            if !s.is_playing {
                return false;
            }
            let stopped = s.active_id.take();
            s.set_idle();
            s.viewer_engaged = None;
            stopped
        };
        tracing::info!(dance_id = ?stopped, "playback paused");
        self.viewer.reset_to_idle();
        self.events.playback_changed();
        true
    }

    /// Hand resolved assets to the viewer if `ticket` is still current.
    ///
    /// Returns false (and drops the locations) for a stale ticket.
    pub fn commit_play(&self, ticket: &PlayTicket, animation: String, audio: String) -> bool {
        let previous = {
            let mut s = self.inner.lock().unwrap_or_else(|err| err.into_inner());
            if !s.is_current(ticket) {
                None
            } else {
                s.phase = PlaybackPhase::Playing;
                Some(s.viewer_engaged.replace(ticket.generation))
            }
        };

        let Some(previous) = previous else {
            tracing::debug!(
                dance_id = %ticket.dance_id,
                generation = ticket.generation,
                "stale fetch result ignored"
            );
            self.events.stale_result_ignored(&ticket.dance_id);
            return false;
        };

        if previous.is_some() {
            self.viewer.reset_to_idle();
        }
        tracing::info!(dance_id = %ticket.dance_id, %animation, %audio, "dance started");
        self.viewer.play(
            animation,
            audio,
            PlaybackCompletion {
                coordinator: self.clone(),
                ticket: ticket.clone(),
            },
        );
        self.events.playback_changed();
        true
    }

    /// Revert to idle after a failed fetch, if `ticket` is still current.
    ///
    /// A dance still engaged in the viewer from an earlier request is reset
    /// so the viewer matches the idle state.
    pub fn abort(&self, ticket: &PlayTicket) -> bool {
        let reverted = {
            let mut s = self.inner.lock().unwrap_or_else(|err| err.into_inner());
            if s.is_current(ticket) {
                s.set_idle();
                Some(s.viewer_engaged.take().is_some())
            } else {
                None
            }
        };
        let Some(was_engaged) = reverted else {
            return false;
        };
        tracing::info!(dance_id = %ticket.dance_id, "dance request aborted");
        if was_engaged {
            self.viewer.reset_to_idle();
        }
        self.events.playback_changed();
        true
    }

    fn finish(&self, ticket: &PlayTicket) {
        let finished = {
            let mut s = self.inner.lock().unwrap_or_else(|err| err.into_inner());
            if s.viewer_engaged == Some(ticket.generation) {
                s.viewer_engaged = None;
            }
            if s.is_current(ticket) {
                s.set_idle();
                true
            } else {
                false
            }
        };
        if finished {
            tracing::info!(dance_id = %ticket.dance_id, "dance finished");
            self.events.playback_changed();
        } else {
            tracing::debug!(
                dance_id = %ticket.dance_id,
                generation = ticket.generation,
                "stale completion ignored"
            );
        }
    }
}

/// One-shot continuation handed to the viewer with each `play`.
#[must_use = "the viewer must fire the completion when the dance ends"]
pub struct PlaybackCompletion {
    coordinator: PlaybackCoordinator,
    ticket: PlayTicket,
}

impl PlaybackCompletion {
    pub fn dance_id(&self) -> &str {
        &self.ticket.dance_id
    }

    /// Signal the natural end of the dance.
    pub fn complete(self) {
        self.coordinator.finish(&self.ticket);
    }
}

impl fmt::Debug for PlaybackCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackCompletion")
            .field("ticket", &self.ticket)
            .finish()
    }
}
