//! The backend collaborator seam for an Ampache-compatible server.
//!
//! The provider never talks HTTP itself; it issues calls against this
//! trait and leaves session handling, request signing and retries to the
//! implementation. Implementations keep their own credential state
//! across calls and are treated as opaque and stateful.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Raw song record as returned by the backend
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub album: String,
    pub artist: String,
    /// Playing time in whole seconds
    pub seconds: u64,
    pub track: u32,
    pub tags: Vec<String>,
    pub art_url: String,
    /// Streamable source location for this song
    pub url: String,
}

/// A playlist as listed by the backend
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaylistInfo {
    pub id: String,
    pub name: String,
    /// Playlist visibility ("public", "private", ...)
    pub kind: String,
}

/// A genre tag with its song count
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenreInfo {
    pub id: String,
    pub name: String,
    pub songs: u32,
}

/// An artist with their song count
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArtistInfo {
    pub id: String,
    pub name: String,
    pub songs: u32,
}

/// An album with its artist and cover art
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlbumInfo {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub art_url: String,
}

/// Result of a successful authentication handshake
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Handshake {
    /// When the established session expires, if the server reports it
    pub session_expire: Option<DateTime<Utc>>,
}

/// Errors surfaced by the backend collaborator
#[derive(Debug, Error)]
pub enum BackendError {
    /// Structured server-side error with a numeric code
    #[error("code: {code}, error: {message}")]
    Api { code: u32, message: String },

    /// Transport or client failure that carries a printable message
    #[error("{0}")]
    Transport(String),

    /// Failure with no usable message attached
    #[error("Undefined error")]
    Unknown,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Calls the provider issues against an Ampache-compatible server
#[async_trait]
pub trait AmpacheBackend: Send + Sync {
    /// Point the backend at a server and set the credentials for the
    /// next handshake.
    async fn init_user(&self, url: &str, login: &str, password: &str) -> BackendResult<()>;

    /// Authenticate and establish a session.
    async fn handshake(&self) -> BackendResult<Handshake>;

    /// Session keep-alive no-op.
    async fn ping(&self) -> BackendResult<()>;

    async fn get_songs(&self) -> BackendResult<Vec<Song>>;
    async fn get_playlists(&self) -> BackendResult<Vec<PlaylistInfo>>;
    async fn get_playlist_songs(&self, playlist_id: &str) -> BackendResult<Vec<Song>>;
    async fn get_genres(&self) -> BackendResult<Vec<GenreInfo>>;
    async fn get_genre_songs(&self, genre_id: &str) -> BackendResult<Vec<Song>>;
    async fn get_artists(&self) -> BackendResult<Vec<ArtistInfo>>;
    async fn get_albums(&self) -> BackendResult<Vec<AlbumInfo>>;
    async fn get_artist_albums(&self, artist_id: &str) -> BackendResult<Vec<AlbumInfo>>;
    async fn get_artist_songs(&self, artist_id: &str) -> BackendResult<Vec<Song>>;
    async fn get_album_songs(&self, album_id: &str) -> BackendResult<Vec<Song>>;
    async fn get_song(&self, song_id: &str) -> BackendResult<Song>;
    async fn search_songs(&self, query: &str) -> BackendResult<Vec<Song>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_errors_render_code_and_message() {
        let err = BackendError::Api {
            code: 401,
            message: "bad session".into(),
        };
        assert_eq!(err.to_string(), "code: 401, error: bad session");
    }

    #[test]
    fn bare_errors_render_the_undefined_message() {
        assert_eq!(BackendError::Unknown.to_string(), "Undefined error");
        assert_eq!(
            BackendError::Transport("connection reset".into()).to_string(),
            "connection reset"
        );
    }
}
