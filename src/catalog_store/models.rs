//! Catalog entity models.
//!
//! Rows reference each other by integer id. Names and titles are the
//! natural keys used by forms to resolve those ids.

use chrono::NaiveDate;

pub const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub genre: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub track_count: i64,
    pub release_date: NaiveDate,
    pub label: String,
    pub artist_id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Song {
    pub id: i64,
    pub title: String,
    /// Free-form, e.g. "5:55".
    pub duration: String,
    pub artist_id: i64,
    pub album_id: i64,
}

/// Writable columns of an artist row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtistFields {
    pub name: String,
    pub genre: String,
    pub label: String,
}

/// Writable columns of an album row, with the artist already resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlbumFields {
    pub title: String,
    pub track_count: i64,
    pub release_date: NaiveDate,
    pub label: String,
    pub artist_id: i64,
}

/// Writable columns of a song row, with artist and album already resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongFields {
    pub title: String,
    pub duration: String,
    pub artist_id: i64,
    pub album_id: i64,
}

/// An album as listed, with its artist's name if the artist still exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlbumListing {
    pub album: Album,
    pub artist_name: Option<String>,
}

/// A song as listed. A `None` name means the reference is dangling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SongListing {
    pub song: Song,
    pub artist_name: Option<String>,
    pub album_title: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    pub artists: usize,
    pub albums: usize,
    pub songs: usize,
}

/// Dependent rows removed along with a deleted row (only non-zero under
/// `DeletePolicy::Cascade`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub cascaded_albums: usize,
    pub cascaded_songs: usize,
}

impl From<&Artist> for ArtistFields {
    fn from(artist: &Artist) -> Self {
        ArtistFields {
            name: artist.name.clone(),
            genre: artist.genre.clone(),
            label: artist.label.clone(),
        }
    }
}
