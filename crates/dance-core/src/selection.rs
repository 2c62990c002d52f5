//! Highlighted-item state, independent of playback.

use std::sync::{Arc, Mutex};

use dance_types::SelectionState;

use crate::events::EventBus;

#[derive(Clone)]
pub struct SelectionStore {
    inner: Arc<Mutex<SelectionState>>,
    events: EventBus,
}

impl SelectionStore {
    pub fn new(events: EventBus) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SelectionState::default())),
            events,
        }
    }

    pub fn snapshot(&self) -> SelectionState {
        self.inner.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn selected(&self) -> Option<String> {
        self.snapshot().selected_id
    }

    pub fn is_selected(&self, dance_id: &str) -> bool {
        self.inner
            .lock()
            .map(|s| s.selected_id.as_deref() == Some(dance_id))
            .unwrap_or(false)
    }

    /// Highlight `dance_id`. Never starts playback.
    pub fn select(&self, dance_id: &str) {
        let changed = match self.inner.lock() {
            Ok(mut s) if s.selected_id.as_deref() != Some(dance_id) => {
                s.selected_id = Some(dance_id.to_string());
                true
            }
            _ => false,
        };
        if changed {
            tracing::debug!(dance_id, "dance selected");
            self.events.selection_changed();
        }
    }

    pub fn clear(&self) {
        let changed = match self.inner.lock() {
            Ok(mut s) => s.selected_id.take().is_some(),
            Err(_) => false,
        };
        if changed {
            self.events.selection_changed();
        }
    }
}
