//! In-process event bus for library updates.
//!
//! Provides a lightweight broadcast channel for UI subscriptions.

use tokio::sync::broadcast;

use dance_types::AssetKind;

/// Event payloads published by the playback core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DanceEvent {
    PlaybackChanged,
    SelectionChanged,
    Progress {
        dance_id: String,
        kind: AssetKind,
        percent: u8,
    },
    FetchFailed {
        dance_id: String,
        kind: AssetKind,
    },
    /// A superseded request resolved and its result was dropped.
    StaleResultIgnored { dance_id: String },
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DanceEvent>,
}

impl EventBus {
    /// Create a new event bus with a bounded broadcast channel.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<DanceEvent> {
        self.sender.subscribe()
    }

    /// Notify subscribers that playback state has changed.
    pub fn playback_changed(&self) {
        let _ = self.sender.send(DanceEvent::PlaybackChanged);
    }

    /// Notify subscribers that the highlighted item has changed.
    pub fn selection_changed(&self) {
        let _ = self.sender.send(DanceEvent::SelectionChanged);
    }

    /// Notify subscribers about fetch progress for one asset.
    pub fn progress(&self, dance_id: &str, kind: AssetKind, percent: u8) {
        let _ = self.sender.send(DanceEvent::Progress {
            dance_id: dance_id.to_string(),
            kind,
            percent,
        });
    }

    pub fn fetch_failed(&self, dance_id: &str, kind: AssetKind) {
        let _ = self.sender.send(DanceEvent::FetchFailed {
            dance_id: dance_id.to_string(),
            kind,
        });
    }

    pub fn stale_result_ignored(&self, dance_id: &str) {
        let _ = self.sender.send(DanceEvent::StaleResultIgnored {
            dance_id: dance_id.to_string(),
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_published_events() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        bus.progress("a", AssetKind::Audio, 40);
        bus.playback_changed();

        assert_eq!(
            receiver.try_recv().unwrap(),
            DanceEvent::Progress {
                dance_id: "a".to_string(),
                kind: AssetKind::Audio,
                percent: 40,
            }
        );
        assert_eq!(receiver.try_recv().unwrap(), DanceEvent::PlaybackChanged);
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.selection_changed();
        bus.stale_result_ignored("a");
    }
}
