//! Category fetch, listing, search and track lookup calls.
//!
//! Every operation takes a [`Responder`] and completes it exactly once:
//! synchronously on a cache hit, otherwise after detaching and going
//! through the state machine and the backend. Failure paths deliver an
//! empty result and funnel the fault to the registered error callback.

use rand::seq::SliceRandom;

use super::{DEFAULT_SONGS_KEY, DEFAULT_SONGS_TITLE, MusicProvider};
use crate::gate;
use crate::model::{
    BackendResult, BrowseItem, CatalogListing, CatalogPage, Category, SessionPhase, Song, Track,
};
use crate::responder::Responder;

/// Turn a backend song list into the shuffled default page.
pub(crate) fn shuffled_page(songs: Vec<Song>) -> CatalogPage {
    let mut tracks: Vec<Track> = songs.into_iter().map(Track::from).collect();
    tracks.shuffle(&mut rand::thread_rng());
    CatalogPage::new(DEFAULT_SONGS_TITLE, tracks)
}

/// Why a fetch could not reach the backend
enum NotReady {
    Phase(SessionPhase),
    TimedOut,
}

#[derive(Clone, Copy)]
enum ListingKind {
    Playlists,
    Genres,
    Artists,
    Albums,
    ArtistAlbums,
}

impl ListingKind {
    fn operation(self) -> &'static str {
        match self {
            ListingKind::Playlists => "get_playlists",
            ListingKind::Genres => "get_genres",
            ListingKind::Artists => "get_artists",
            ListingKind::Albums => "get_albums",
            ListingKind::ArtistAlbums => "get_artist_albums",
        }
    }

    fn title(self) -> &'static str {
        match self {
            ListingKind::Playlists => "Playlists",
            ListingKind::Genres => "Genres",
            ListingKind::Artists => "Artists",
            ListingKind::Albums | ListingKind::ArtistAlbums => "Albums",
        }
    }
}

impl MusicProvider {
    /// Songs tagged with a genre, answered from the cache when the same
    /// genre was the last node browsed.
    pub async fn songs_by_genre(&self, genre_id: &str, responder: Responder<CatalogPage>) {
        crate::log_api_request!("get_genre_songs", genre_id = %genre_id);
        self.browse_songs(Category::Genre, genre_id.to_string(), "Genre", responder)
            .await;
    }

    /// Songs of a playlist, answered from the cache when possible.
    pub async fn songs_by_playlist(&self, playlist_id: &str, responder: Responder<CatalogPage>) {
        crate::log_api_request!("get_playlist_songs", playlist_id = %playlist_id);
        self.browse_songs(
            Category::Playlist,
            playlist_id.to_string(),
            "Playlist",
            responder,
        )
        .await;
    }

    /// All songs of an artist, answered from the cache when possible.
    pub async fn songs_by_artist(&self, artist_id: &str, responder: Responder<CatalogPage>) {
        crate::log_api_request!("get_artist_songs", artist_id = %artist_id);
        self.browse_songs(Category::Artist, artist_id.to_string(), "Artist", responder)
            .await;
    }

    /// Songs of an album, answered from the cache when possible.
    pub async fn songs_by_album(&self, album_id: &str, responder: Responder<CatalogPage>) {
        crate::log_api_request!("get_album_songs", album_id = %album_id);
        self.browse_songs(Category::Album, album_id.to_string(), "Album", responder)
            .await;
    }

    /// The whole library in shuffled order (the default browse node).
    pub async fn default_songs(&self, mut responder: Responder<CatalogPage>) {
        if let Some(page) = self
            .cache
            .lookup(Category::Songs, DEFAULT_SONGS_KEY)
            .await
        {
            tracing::debug!("catalog cache hit for the default song list");
            let _ = responder.deliver(page);
            return;
        }

        let _ = responder.detach();
        let provider = self.clone();
        gate::run_then(
            async move {
                if let Err(reason) = provider.await_ready().await {
                    provider.report_not_ready(reason).await;
                    return CatalogPage::empty(DEFAULT_SONGS_TITLE);
                }
                let result = provider.backend.get_songs().await;
                crate::log_api_result!("get_songs", result);
                match result {
                    Ok(songs) => {
                        let page = shuffled_page(songs);
                        provider
                            .cache
                            .store(Category::Songs, DEFAULT_SONGS_KEY, page.clone())
                            .await;
                        page
                    }
                    Err(err) => {
                        provider.state.advance(SessionPhase::Failure);
                        provider.report_backend(&err).await;
                        CatalogPage::empty(DEFAULT_SONGS_TITLE)
                    }
                }
            },
            move |outcome| {
                let _ = responder
                    .deliver(outcome.unwrap_or_else(|| CatalogPage::empty(DEFAULT_SONGS_TITLE)));
            },
        );
    }

    /// Songs matching a free-text query; the page title is the query
    /// itself. Search results are never cached.
    pub async fn search_songs(&self, query: &str, mut responder: Responder<CatalogPage>) {
        crate::log_api_request!("search_songs", query = %query);
        let _ = responder.detach();
        let query = query.to_string();
        let fallback = query.clone();
        let provider = self.clone();
        gate::run_then(
            async move {
                if let Err(reason) = provider.await_ready().await {
                    provider.report_not_ready(reason).await;
                    return CatalogPage::empty(query);
                }
                let result = provider.backend.search_songs(&query).await;
                crate::log_api_result!("search_songs", result);
                match result {
                    Ok(songs) => {
                        CatalogPage::new(query, songs.into_iter().map(Track::from).collect())
                    }
                    Err(err) => {
                        provider.state.advance(SessionPhase::Failure);
                        provider.report_backend(&err).await;
                        CatalogPage::empty(query)
                    }
                }
            },
            move |outcome| {
                let _ = responder.deliver(outcome.unwrap_or_else(|| CatalogPage::empty(fallback)));
            },
        );
    }

    /// The playlists available to the logged-in user.
    pub async fn playlists(&self, responder: Responder<CatalogListing>) {
        self.browse_listing(ListingKind::Playlists, String::new(), responder)
            .await;
    }

    /// The genre tags of the catalog, with song counts as subtitles.
    pub async fn genres(&self, responder: Responder<CatalogListing>) {
        self.browse_listing(ListingKind::Genres, String::new(), responder)
            .await;
    }

    /// The artists of the catalog, with song counts as subtitles.
    pub async fn artists(&self, responder: Responder<CatalogListing>) {
        self.browse_listing(ListingKind::Artists, String::new(), responder)
            .await;
    }

    /// The albums of the catalog, with artist names as subtitles.
    pub async fn albums(&self, responder: Responder<CatalogListing>) {
        self.browse_listing(ListingKind::Albums, String::new(), responder)
            .await;
    }

    /// The albums of one artist.
    pub async fn artist_albums(&self, artist_id: &str, responder: Responder<CatalogListing>) {
        crate::log_api_request!("get_artist_albums", artist_id = %artist_id);
        self.browse_listing(ListingKind::ArtistAlbums, artist_id.to_string(), responder)
            .await;
    }

    /// A single track by id, answered from the index over the cached
    /// page when possible.
    pub async fn track(&self, track_id: &str, mut responder: Responder<Option<Track>>) {
        if let Some(track) = self.cache.track(track_id).await {
            let _ = responder.deliver(Some(track));
            return;
        }

        crate::log_api_request!("get_song", track_id = %track_id);
        let _ = responder.detach();
        let track_id = track_id.to_string();
        let provider = self.clone();
        gate::run_then(
            async move {
                let result = provider.backend.get_song(&track_id).await;
                crate::log_api_result!("get_song", result);
                match result {
                    Ok(song) => {
                        let track = Track::from(song);
                        provider.cache.remember(track.clone()).await;
                        Some(track)
                    }
                    Err(err) => {
                        provider.state.advance(SessionPhase::Failure);
                        provider.report_backend(&err).await;
                        None
                    }
                }
            },
            move |outcome| {
                let _ = responder.deliver(outcome.flatten());
            },
        );
    }

    /// Shared flow for the four cached song categories.
    async fn browse_songs(
        &self,
        category: Category,
        value: String,
        title: &'static str,
        mut responder: Responder<CatalogPage>,
    ) {
        if let Some(page) = self.cache.lookup(category, &value).await {
            tracing::debug!(?category, value = %value, "catalog cache hit");
            let _ = responder.deliver(page);
            return;
        }

        let _ = responder.detach();
        let provider = self.clone();
        gate::run_then(
            async move {
                if let Err(reason) = provider.await_ready().await {
                    provider.report_not_ready(reason).await;
                    return CatalogPage::empty(title);
                }
                let result = provider.fetch_songs(category, &value).await;
                crate::log_api_result!(song_operation(category), result);
                match result {
                    Ok(songs) => {
                        let page =
                            CatalogPage::new(title, songs.into_iter().map(Track::from).collect());
                        provider.cache.store(category, &value, page.clone()).await;
                        page
                    }
                    Err(err) => {
                        provider.state.advance(SessionPhase::Failure);
                        provider.report_backend(&err).await;
                        CatalogPage::empty(title)
                    }
                }
            },
            move |outcome| {
                let _ = responder.deliver(outcome.unwrap_or_else(|| CatalogPage::empty(title)));
            },
        );
    }

    async fn browse_listing(
        &self,
        kind: ListingKind,
        value: String,
        mut responder: Responder<CatalogListing>,
    ) {
        let title = kind.title();
        let _ = responder.detach();
        let provider = self.clone();
        gate::run_then(
            async move {
                if let Err(reason) = provider.await_ready().await {
                    provider.report_not_ready(reason).await;
                    return CatalogListing::empty(title);
                }
                let result = provider.fetch_listing(kind, &value).await;
                crate::log_api_result!(kind.operation(), result);
                match result {
                    Ok(items) => CatalogListing::new(title, items),
                    Err(err) => {
                        provider.state.advance(SessionPhase::Failure);
                        provider.report_backend(&err).await;
                        CatalogListing::empty(title)
                    }
                }
            },
            move |outcome| {
                let _ =
                    responder.deliver(outcome.unwrap_or_else(|| CatalogListing::empty(title)));
            },
        );
    }

    async fn fetch_songs(&self, category: Category, value: &str) -> BackendResult<Vec<Song>> {
        match category {
            Category::Songs => self.backend.get_songs().await,
            Category::Genre => self.backend.get_genre_songs(value).await,
            Category::Playlist => self.backend.get_playlist_songs(value).await,
            Category::Artist => self.backend.get_artist_songs(value).await,
            Category::Album => self.backend.get_album_songs(value).await,
        }
    }

    async fn fetch_listing(&self, kind: ListingKind, value: &str) -> BackendResult<Vec<BrowseItem>> {
        Ok(match kind {
            ListingKind::Playlists => self
                .backend
                .get_playlists()
                .await?
                .into_iter()
                .map(BrowseItem::from)
                .collect(),
            ListingKind::Genres => self
                .backend
                .get_genres()
                .await?
                .into_iter()
                .map(BrowseItem::from)
                .collect(),
            ListingKind::Artists => self
                .backend
                .get_artists()
                .await?
                .into_iter()
                .map(BrowseItem::from)
                .collect(),
            ListingKind::Albums => self
                .backend
                .get_albums()
                .await?
                .into_iter()
                .map(BrowseItem::from)
                .collect(),
            ListingKind::ArtistAlbums => self
                .backend
                .get_artist_albums(value)
                .await?
                .into_iter()
                .map(BrowseItem::from)
                .collect(),
        })
    }

    /// Block until the session settles, then require it to be ready.
    async fn await_ready(&self) -> Result<(), NotReady> {
        match self.state.settled(self.config.wait_timeout).await {
            Ok(SessionPhase::Ready) => Ok(()),
            Ok(phase) => Err(NotReady::Phase(phase)),
            Err(_) => Err(NotReady::TimedOut),
        }
    }

    async fn report_not_ready(&self, reason: NotReady) {
        match reason {
            NotReady::Phase(phase) => {
                tracing::warn!(?phase, "catalog request while not ready");
                self.report("Not ready", None).await;
            }
            NotReady::TimedOut => {
                self.report("Timed out waiting for the session to settle", None)
                    .await;
            }
        }
    }
}

fn song_operation(category: Category) -> &'static str {
    match category {
        Category::Songs => "get_songs",
        Category::Genre => "get_genre_songs",
        Category::Playlist => "get_playlist_songs",
        Category::Artist => "get_artist_songs",
        Category::Album => "get_album_songs",
    }
}
