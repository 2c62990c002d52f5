//! Shared application context.
//!
//! Holds the catalog, the playback and selection stores, and one lazily
//! created controller per dance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dance_types::DanceItemView;

use crate::catalog::Catalog;
use crate::controller::PlaybackController;
use crate::coordinator::{PlaybackCoordinator, Viewer};
use crate::events::EventBus;
use crate::loader::AssetStorage;
use crate::selection::SelectionStore;

#[derive(Clone)]
pub struct DanceLibrary {
    catalog: Arc<Catalog>,
    storage: Arc<dyn AssetStorage>,
    coordinator: PlaybackCoordinator,
    selection: SelectionStore,
    events: EventBus,
    controllers: Arc<Mutex<HashMap<String, PlaybackController>>>,
}

impl DanceLibrary {
    pub fn new(catalog: Catalog, storage: Arc<dyn AssetStorage>, viewer: Arc<dyn Viewer>) -> Self {
        let events = EventBus::new();
        Self {
            catalog: Arc::new(catalog),
            storage,
            coordinator: PlaybackCoordinator::new(viewer, events.clone()),
            selection: SelectionStore::new(events.clone()),
            events,
            controllers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn coordinator(&self) -> &PlaybackCoordinator {
        &self.coordinator
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Controller for a catalog entry, created on first use.
    ///
    /// The same controller (and its loader status) is returned for repeated
    /// calls with the same id.
    pub fn controller(&self, dance_id: &str) -> Option<PlaybackController> {
        let item = self.catalog.get(dance_id)?;
        let mut controllers = self
            .controllers
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        let controller = controllers
            .entry(dance_id.to_string())
            .or_insert_with(|| {
                PlaybackController::new(
                    Arc::new(item.clone()),
                    self.coordinator.clone(),
                    self.selection.clone(),
                    self.storage.clone(),
                    self.events.clone(),
                )
            })
            .clone();
        Some(controller)
    }

    /// Views for every catalog entry, in catalog order.
    pub fn views(&self) -> Vec<DanceItemView> {
        self.catalog
            .items()
            .iter()
            .filter_map(|item| self.controller(&item.dance_id))
            .map(|controller| controller.view())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::PlayOutcome;
    use crate::testing::{FakeStorage, RecordingViewer, dance};

    fn make_library() -> (DanceLibrary, Arc<RecordingViewer>) {
        let catalog = Catalog::from_items(vec![dance("a"), dance("b")]).unwrap();
        let viewer = Arc::new(RecordingViewer::default());
        let library = DanceLibrary::new(catalog, Arc::new(FakeStorage::default()), viewer.clone());
        (library, viewer)
    }

    #[test]
    fn unknown_dance_has_no_controller() {
        let (library, _viewer) = make_library();
        assert!(library.controller("missing").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn controllers_are_reused_per_dance() {
        let (library, viewer) = make_library();
        let first = library.controller("a").unwrap();
        first.request_play().await.unwrap();

        let again = library.controller("a").unwrap();
        assert_eq!(again.audio_loader().status().percent, 100);

        assert_eq!(again.request_play().await.unwrap(), PlayOutcome::Paused);
        assert_eq!(viewer.resets(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn views_follow_catalog_order_and_flag_single_playing_item() {
        let (library, _viewer) = make_library();
        library.controller("b").unwrap().request_play().await.unwrap();
        library.controller("a").unwrap().select();

        let views = library.views();

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].dance_id, "a");
        assert!(views[0].is_selected);
        assert!(!views[0].is_playing);
        assert!(views[1].is_playing);
        assert!(!views[1].is_selected);
    }
}
