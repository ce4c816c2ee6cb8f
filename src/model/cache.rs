//! Single-slot cache over the most recently fetched catalog page

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::content::{CatalogPage, Track};
use super::types::Category;

/// Remembers the last catalog page fetched, keyed by the browse node it
/// came from, plus a track-by-id index over that page.
///
/// Re-browsing the same node is answered without a network round trip;
/// browsing any other node evicts the slot wholesale. There is no TTL
/// and no size bound; writers are serialized behind the session state.
#[derive(Clone, Default)]
pub struct CatalogCache {
    inner: Arc<RwLock<Slot>>,
}

#[derive(Default)]
struct Slot {
    key: Option<(Category, String)>,
    page: CatalogPage,
    by_id: HashMap<String, Track>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached page, when `(category, value)` matches the last store.
    pub async fn lookup(&self, category: Category, value: &str) -> Option<CatalogPage> {
        let slot = self.inner.read().await;
        match &slot.key {
            Some((cached, cached_value)) if *cached == category && cached_value == value => {
                Some(slot.page.clone())
            }
            _ => None,
        }
    }

    /// Replace the slot with a freshly fetched page and rebuild the id
    /// index over its tracks.
    ///
    /// A page with no tracks is not retained: the next request for the
    /// same node goes back to the backend.
    pub async fn store(&self, category: Category, value: &str, page: CatalogPage) {
        if page.tracks.is_empty() {
            tracing::debug!(?category, value, "empty page not cached");
            return;
        }
        let mut slot = self.inner.write().await;
        slot.by_id.clear();
        for track in &page.tracks {
            slot.by_id.insert(track.id.clone(), track.clone());
        }
        slot.key = Some((category, value.to_string()));
        slot.page = page;
    }

    /// Look a single track up in the index built over the current slot.
    pub async fn track(&self, id: &str) -> Option<Track> {
        self.inner.read().await.by_id.get(id).cloned()
    }

    /// Remember one track fetched outside a full page, so repeated
    /// lookups for it are answered locally.
    pub async fn remember(&self, track: Track) {
        self.inner
            .write()
            .await
            .by_id
            .insert(track.id.clone(), track);
    }

    /// Drop the slot and the index; called when a login cycle begins.
    pub async fn invalidate(&self) {
        let mut slot = self.inner.write().await;
        slot.key = None;
        slot.page = CatalogPage::default();
        slot.by_id.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_of(title: &str, ids: &[&str]) -> CatalogPage {
        CatalogPage::new(
            title,
            ids.iter()
                .map(|id| Track {
                    id: (*id).into(),
                    title: format!("track {id}"),
                    ..Track::default()
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn lookup_hits_only_the_exact_key() {
        let cache = CatalogCache::new();
        cache
            .store(Category::Genre, "rock", page_of("Genre", &["a", "b"]))
            .await;

        let hit = cache.lookup(Category::Genre, "rock").await.unwrap();
        assert_eq!(hit.title, "Genre");
        assert_eq!(hit.tracks.len(), 2);

        assert!(cache.lookup(Category::Genre, "jazz").await.is_none());
        assert!(cache.lookup(Category::Playlist, "rock").await.is_none());
    }

    #[tokio::test]
    async fn storing_a_new_key_evicts_the_old_entry_entirely() {
        let cache = CatalogCache::new();
        cache
            .store(Category::Genre, "rock", page_of("Genre", &["a"]))
            .await;
        cache
            .store(Category::Playlist, "42", page_of("Playlist", &["b"]))
            .await;

        assert!(cache.lookup(Category::Genre, "rock").await.is_none());
        assert!(cache.lookup(Category::Playlist, "42").await.is_some());

        // the id index follows the slot
        assert!(cache.track("a").await.is_none());
        assert!(cache.track("b").await.is_some());
    }

    #[tokio::test]
    async fn empty_pages_are_not_cached() {
        let cache = CatalogCache::new();
        cache
            .store(Category::Genre, "rock", CatalogPage::empty("Genre"))
            .await;
        assert!(cache.lookup(Category::Genre, "rock").await.is_none());
    }

    #[tokio::test]
    async fn an_empty_page_does_not_evict_the_previous_entry() {
        let cache = CatalogCache::new();
        cache
            .store(Category::Genre, "rock", page_of("Genre", &["a"]))
            .await;
        cache
            .store(Category::Genre, "jazz", CatalogPage::empty("Genre"))
            .await;

        assert!(cache.lookup(Category::Genre, "rock").await.is_some());
    }

    #[tokio::test]
    async fn remembered_tracks_are_found_by_id() {
        let cache = CatalogCache::new();
        cache
            .remember(Track {
                id: "solo".into(),
                ..Track::default()
            })
            .await;
        assert!(cache.track("solo").await.is_some());
    }

    #[tokio::test]
    async fn invalidate_clears_slot_and_index() {
        let cache = CatalogCache::new();
        cache
            .store(Category::Album, "a1", page_of("Album", &["x"]))
            .await;
        cache.invalidate().await;

        assert!(cache.lookup(Category::Album, "a1").await.is_none());
        assert!(cache.track("x").await.is_none());
    }
}
