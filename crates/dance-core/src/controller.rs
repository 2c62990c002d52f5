//! Per-item play orchestration.
//!
//! A controller fetches an item's audio and animation concurrently, then
//! hands both locations to the viewer through the coordinator.

use std::sync::Arc;

use dance_types::{AssetKind, DanceItem, DanceItemView, PlayAction, combined_percent};

use crate::coordinator::{PlayRequest, PlaybackCoordinator};
use crate::error::FetchError;
use crate::events::EventBus;
use crate::loader::{AssetLoader, AssetStorage};
use crate::selection::SelectionStore;

/// How a play request ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Both assets resolved and the viewer was commanded to play.
    Started,
    /// The item was already playing and has been paused.
    Paused,
    /// A newer request took over before both assets resolved.
    Superseded,
}

#[derive(Clone)]
pub struct PlaybackController {
    item: Arc<DanceItem>,
    coordinator: PlaybackCoordinator,
    selection: SelectionStore,
    audio: AssetLoader,
    animation: AssetLoader,
}

impl PlaybackController {
    pub fn new(
        item: Arc<DanceItem>,
        coordinator: PlaybackCoordinator,
        selection: SelectionStore,
        storage: Arc<dyn AssetStorage>,
        events: EventBus,
    ) -> Self {
        Self {
            item,
            coordinator,
            selection,
            audio: AssetLoader::new(AssetKind::Audio, storage.clone(), events.clone()),
            animation: AssetLoader::new(AssetKind::Animation, storage, events),
        }
    }

    pub fn item(&self) -> &DanceItem {
        &self.item
    }

    pub fn audio_loader(&self) -> &AssetLoader {
        &self.audio
    }

    pub fn animation_loader(&self) -> &AssetLoader {
        &self.animation
    }

    /// Play, or pause when this item is already playing.
    ///
    /// A failed fetch reverts playback to idle (unless superseded) and is
    /// returned to the caller; the other asset's location is discarded.
    pub async fn request_play(&self) -> Result<PlayOutcome, FetchError> {
        let dance_id = self.item.dance_id.as_str();
        let ticket = match self.coordinator.begin_request(dance_id) {
            PlayRequest::Paused => return Ok(PlayOutcome::Paused),
            PlayRequest::Started(ticket) => ticket,
        };

        let (audio, animation) = tokio::join!(
            self.audio.fetch_url(dance_id, &self.item.audio),
            self.animation.fetch_url(dance_id, &self.item.src),
        );

        let (audio, animation) = match (audio, animation) {
            (Ok(audio), Ok(animation)) => (audio, animation),
            (Err(err), _) | (_, Err(err)) => {
                if !self.coordinator.abort(&ticket) {
                    tracing::debug!(dance_id, "fetch failed for superseded request");
                }
                return Err(err);
            }
        };

        if self.coordinator.commit_play(&ticket, animation, audio) {
            Ok(PlayOutcome::Started)
        } else {
            Ok(PlayOutcome::Superseded)
        }
    }

    /// Single click: highlight without playing.
    pub fn select(&self) {
        self.selection.select(&self.item.dance_id);
    }

    /// `true` while either asset is downloading.
    pub fn is_loading(&self) -> bool {
        self.audio.status().in_flight || self.animation.status().in_flight
    }

    /// Combined download percent of both assets.
    pub fn progress(&self) -> u8 {
        combined_percent(self.audio.status().percent, self.animation.status().percent)
    }

    pub fn view(&self) -> DanceItemView {
        let dance_id = self.item.dance_id.clone();
        let playback = self.coordinator.state();
        let is_current_play = playback.is_active(&dance_id);
        let is_playing = playback.is_playing(&dance_id);
        DanceItemView {
            is_current_play,
            is_playing,
            is_selected: self.selection.is_selected(&dance_id),
            show_progress: self.is_loading(),
            progress: self.progress(),
            action: if is_playing {
                PlayAction::Pause
            } else {
                PlayAction::Play
            },
            dance_id,
        }
    }
}
