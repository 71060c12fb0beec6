//! Core of the character browser: the remote collection client, the pure
//! sort/filter engine, and the list controller with its runtime.

pub mod client;
pub mod controller;
pub mod error;
pub mod runtime;
pub mod view;

pub use client::{CollectionSource, RemoteCollectionClient, DEFAULT_COLLECTION_URL};
pub use controller::{
    FetchMode, FetchRequest, ListController, ListParams, Phase, Snapshot, UnknownFetchMode,
    LOAD_FAILED_MESSAGE,
};
pub use error::{NetworkError, RuntimeClosed};
pub use runtime::{spawn_controller, ControllerCommand, ControllerHandle, RuntimeOptions};
pub use view::{derive_view, paginate, LocalPage};
