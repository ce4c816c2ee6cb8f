//! Flattened catalog records handed to consumers, built from backend
//! responses

use super::backend::{AlbumInfo, ArtistInfo, GenreInfo, PlaylistInfo, Song};

/// A playable track flattened from a backend song record
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub album: String,
    pub artist: String,
    pub duration_ms: u64,
    pub track_number: u32,
    /// All genre tags of the song, space-joined
    pub genre: String,
    pub art_url: String,
    pub source_url: String,
}

impl From<Song> for Track {
    fn from(song: Song) -> Self {
        Self {
            id: song.id,
            title: song.title,
            album: song.album,
            artist: song.artist,
            duration_ms: song.seconds * 1000,
            track_number: song.track,
            genre: song.tags.join(" "),
            art_url: song.art_url,
            source_url: song.url,
        }
    }
}

/// A browsable catalog node (playlist, genre, artist or album)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BrowseItem {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub art_url: String,
}

impl From<PlaylistInfo> for BrowseItem {
    fn from(pl: PlaylistInfo) -> Self {
        Self {
            id: pl.id,
            title: pl.name,
            subtitle: pl.kind,
            art_url: String::new(),
        }
    }
}

impl From<GenreInfo> for BrowseItem {
    fn from(genre: GenreInfo) -> Self {
        Self {
            id: genre.id,
            title: genre.name,
            subtitle: genre.songs.to_string(),
            art_url: String::new(),
        }
    }
}

impl From<ArtistInfo> for BrowseItem {
    fn from(artist: ArtistInfo) -> Self {
        Self {
            id: artist.id,
            title: artist.name,
            subtitle: artist.songs.to_string(),
            art_url: String::new(),
        }
    }
}

impl From<AlbumInfo> for BrowseItem {
    fn from(album: AlbumInfo) -> Self {
        Self {
            id: album.id,
            title: album.name,
            subtitle: album.artist,
            art_url: album.art_url,
        }
    }
}

/// One fetched list of tracks with its display title
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogPage {
    pub title: String,
    pub tracks: Vec<Track>,
}

impl CatalogPage {
    pub fn new(title: impl Into<String>, tracks: Vec<Track>) -> Self {
        Self {
            title: title.into(),
            tracks,
        }
    }

    /// A completion signal with no items, used on every failure path.
    pub fn empty(title: impl Into<String>) -> Self {
        Self::new(title, Vec::new())
    }
}

/// One fetched list of browsable nodes with its display title
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogListing {
    pub title: String,
    pub items: Vec<BrowseItem>,
}

impl CatalogListing {
    pub fn new(title: impl Into<String>, items: Vec<BrowseItem>) -> Self {
        Self {
            title: title.into(),
            items,
        }
    }

    pub fn empty(title: impl Into<String>) -> Self {
        Self::new(title, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_flattening_joins_tags_and_scales_duration() {
        let song = Song {
            id: "s1".into(),
            title: "Song One".into(),
            album: "First".into(),
            artist: "Somebody".into(),
            seconds: 245,
            track: 3,
            tags: vec!["Rock".into(), "Indie".into()],
            art_url: "http://h/art/1".into(),
            url: "http://h/play/1".into(),
        };

        let track = Track::from(song);
        assert_eq!(track.duration_ms, 245_000);
        assert_eq!(track.genre, "Rock Indie");
        assert_eq!(track.track_number, 3);
        assert_eq!(track.source_url, "http://h/play/1");
    }

    #[test]
    fn track_with_no_tags_has_an_empty_genre() {
        let track = Track::from(Song {
            id: "s2".into(),
            ..Song::default()
        });
        assert_eq!(track.genre, "");
    }

    #[test]
    fn browse_items_carry_count_or_artist_subtitles() {
        let genre = BrowseItem::from(GenreInfo {
            id: "g1".into(),
            name: "Jazz".into(),
            songs: 42,
        });
        assert_eq!(genre.subtitle, "42");

        let album = BrowseItem::from(AlbumInfo {
            id: "a1".into(),
            name: "Blue".into(),
            artist: "Somebody".into(),
            art_url: "http://h/art/a1".into(),
        });
        assert_eq!(album.subtitle, "Somebody");
        assert_eq!(album.art_url, "http://h/art/a1");
    }
}
