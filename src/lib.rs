//! Readiness coordination and catalog browsing for an Ampache-style
//! media backend.
//!
//! The crate sits between a front end and a backend client: it drives
//! the login lifecycle through a broadcast state machine, serializes
//! logins so only one is ever in flight, remembers the last browsed
//! catalog page in a single-slot cache, and hands every fetch result to
//! exactly one consumer through a single-fire responder. The backend
//! itself stays behind the [`AmpacheBackend`] trait.

pub mod gate;
pub mod logging;
pub mod model;
pub mod profiles;
pub mod provider;
pub mod responder;

pub use model::{
    AlbumInfo, AmpacheBackend, ArtistInfo, BackendError, BackendResult, BrowseItem,
    CatalogListing, CatalogPage, Category, GenreInfo, Handshake, PlaylistInfo, Readiness,
    SessionPhase, Song, StateGate, Track, WaitTimeout,
};
pub use profiles::{ConnectionProfile, ProfileStore};
pub use provider::{ErrorCallback, MusicProvider, ProviderConfig};
pub use responder::{Disconnected, Responder, ResponderError, ResponseHandle};
