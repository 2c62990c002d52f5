use std::fmt;

use serde::{Deserialize, Serialize};

/// The two remote assets every dance needs before it can play.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Music track played alongside the motion.
    Audio,
    /// Motion clip driven on the viewer model.
    Animation,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Audio => "audio",
            AssetKind::Animation => "animation",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog entry pairing an animation clip with an audio track.
///
/// Field names follow the catalog JSON (`danceId`, `src`, ...).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DanceItem {
    /// Stable unique identifier.
    pub dance_id: String,
    /// Display name.
    pub name: String,
    /// Author credit.
    #[serde(default)]
    pub author: String,
    /// Thumbnail reference.
    #[serde(default)]
    pub thumb: String,
    /// Animation source reference, opaque to the core.
    pub src: String,
    /// Audio source reference, opaque to the core.
    pub audio: String,
}

/// Progress of a single asset fetch.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadStatus {
    /// `true` while the fetch has not resolved or failed.
    pub in_flight: bool,
    /// Percent complete, 0–100.
    pub percent: u8,
}

/// Which dance owns playback and whether it is playing.
///
/// `is_playing` implies `active_id` is set.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaybackState {
    pub active_id: Option<String>,
    pub is_playing: bool,
}

impl PlaybackState {
    /// `true` when `dance_id` is the active dance, playing or not.
    pub fn is_active(&self, dance_id: &str) -> bool {
        self.active_id.as_deref() == Some(dance_id)
    }

    /// `true` when `dance_id` is the active dance and is playing.
    pub fn is_playing(&self, dance_id: &str) -> bool {
        self.is_playing && self.is_active(dance_id)
    }
}

/// Coordinator phase; `Requesting` and `Playing` share the same
/// [`PlaybackState`] flags.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    #[default]
    Idle,
    /// Play requested, assets still loading.
    Requesting,
    /// Viewer has been commanded to play.
    Playing,
}

/// Highlighted list entry. Selection never starts playback.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionState {
    pub selected_id: Option<String>,
}

/// Icon state of an item's play/pause button.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayAction {
    Play,
    Pause,
}

/// Read-only per-item snapshot consumed by the list renderer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DanceItemView {
    pub dance_id: String,
    /// This item is the coordinator's active dance.
    pub is_current_play: bool,
    /// Active and playing (or loading to play).
    pub is_playing: bool,
    /// Highlighted in the list.
    pub is_selected: bool,
    /// Either asset is still downloading.
    pub show_progress: bool,
    /// Combined download percent, 0–100.
    pub progress: u8,
    pub action: PlayAction,
}

/// Combined percent of two fetches: the average, rounded up.
pub fn combined_percent(audio: u8, animation: u8) -> u8 {
    let sum = u16::from(audio.min(100)) + u16::from(animation.min(100));
    sum.div_ceil(2) as u8
}
