//! Model module - session state and catalog data
//!
//! This module contains the data structures and state handling the
//! provider is built from. It is organized into submodules by
//! responsibility:
//!
//! - `types`: core type definitions (session phase, readiness, categories)
//! - `state`: the phase cell waiters block on
//! - `content`: flattened catalog records handed to consumers
//! - `cache`: single-slot cache over the last fetched page
//! - `backend`: the Ampache server collaborator seam

mod backend;
mod cache;
mod content;
mod state;
mod types;

// Re-export all public types for convenient access
pub use types::{Category, Readiness, SessionPhase};

pub use state::{StateGate, WaitTimeout};

pub use content::{BrowseItem, CatalogListing, CatalogPage, Track};

pub use cache::CatalogCache;

pub use backend::{
    AlbumInfo, AmpacheBackend, ArtistInfo, BackendError, BackendResult, GenreInfo, Handshake,
    PlaylistInfo, Song,
};
