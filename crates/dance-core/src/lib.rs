//! Asset loading and single-active playback coordination for the dance
//! library browser.

pub mod catalog;
pub mod context;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod loader;
pub mod selection;

#[cfg(test)]
mod testing;

pub use catalog::Catalog;
pub use context::DanceLibrary;
pub use controller::{PlayOutcome, PlaybackController};
pub use coordinator::{PlayRequest, PlayTicket, PlaybackCompletion, PlaybackCoordinator, Viewer};
pub use error::{CatalogError, FetchError};
pub use events::{DanceEvent, EventBus};
pub use loader::{AssetLoader, AssetStorage, ProgressReporter};
pub use selection::SelectionStore;
