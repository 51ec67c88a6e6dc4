//! CatalogStore trait definition.

use super::models::*;
use crate::error::AppResult;

/// Persistence for artists, albums and songs.
///
/// Every mutation is atomic. Natural-key uniqueness is enforced by the
/// store itself, so a write that loses a race against a concurrent insert
/// fails with `AppError::DuplicateEntity` instead of persisting a duplicate.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Artists
    // =========================================================================

    fn get_artist(&self, id: i64) -> AppResult<Option<Artist>>;

    fn find_artist_by_name(&self, name: &str) -> AppResult<Option<Artist>>;

    /// All artists in id order.
    fn list_artists(&self) -> AppResult<Vec<Artist>>;

    fn insert_artist(&self, fields: &ArtistFields) -> AppResult<Artist>;

    /// Fails with `NotFound` if no artist has the given id.
    fn update_artist(&self, id: i64, fields: &ArtistFields) -> AppResult<Artist>;

    /// Applies the store's `DeletePolicy`. Fails with `NotFound` if absent.
    fn delete_artist(&self, id: i64) -> AppResult<DeleteOutcome>;

    // =========================================================================
    // Albums
    // =========================================================================

    fn get_album(&self, id: i64) -> AppResult<Option<Album>>;

    fn find_album_by_title(&self, title: &str) -> AppResult<Option<Album>>;

    fn list_albums(&self) -> AppResult<Vec<AlbumListing>>;

    fn insert_album(&self, fields: &AlbumFields) -> AppResult<Album>;

    fn update_album(&self, id: i64, fields: &AlbumFields) -> AppResult<Album>;

    fn delete_album(&self, id: i64) -> AppResult<DeleteOutcome>;

    // =========================================================================
    // Songs
    // =========================================================================

    fn get_song(&self, id: i64) -> AppResult<Option<Song>>;

    fn find_song_by_title(&self, title: &str) -> AppResult<Option<Song>>;

    fn list_songs(&self) -> AppResult<Vec<SongListing>>;

    fn insert_song(&self, fields: &SongFields) -> AppResult<Song>;

    fn update_song(&self, id: i64, fields: &SongFields) -> AppResult<Song>;

    fn delete_song(&self, id: i64) -> AppResult<DeleteOutcome>;

    // =========================================================================
    // Counts
    // =========================================================================

    fn get_counts(&self) -> AppResult<CatalogCounts>;
}
