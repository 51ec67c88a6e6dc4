//! Existence-check-then-mutate operations over the catalog store.

use super::inputs::{AlbumInput, ArtistInput, SongInput};
use crate::catalog_store::validation::{
    parse_release_date, parse_track_count, require_reference, validate_album, validate_artist,
    validate_song,
};
use crate::catalog_store::{
    Album, AlbumFields, AlbumListing, Artist, ArtistFields, CatalogCounts, CatalogStore,
    DeleteOutcome, Song, SongFields, SongListing,
};
use crate::error::{AppError, AppResult, EntityKind};
use std::sync::Arc;
use tracing::info;

pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

/// Fails with `DuplicateEntity` when `existing` is a row other than `own_id`.
fn ensure_unique(
    existing: Option<i64>,
    own_id: Option<i64>,
    entity: EntityKind,
    key: &str,
) -> AppResult<()> {
    match existing {
        Some(id) if Some(id) != own_id => Err(AppError::DuplicateEntity {
            entity,
            key: key.to_owned(),
        }),
        _ => Ok(()),
    }
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    fn resolve_artist(&self, name: &str) -> AppResult<Artist> {
        require_reference("artist_name", name)?;
        self.store
            .find_artist_by_name(name)?
            .ok_or_else(|| AppError::MissingReference {
                entity: EntityKind::Artist,
                key: name.to_owned(),
            })
    }

    fn resolve_album(&self, title: &str) -> AppResult<Album> {
        require_reference("album_title", title)?;
        self.store
            .find_album_by_title(title)?
            .ok_or_else(|| AppError::MissingReference {
                entity: EntityKind::Album,
                key: title.to_owned(),
            })
    }

    fn artist_fields(&self, input: &ArtistInput, own_id: Option<i64>) -> AppResult<ArtistFields> {
        let fields = ArtistFields {
            name: input.name.trim().to_owned(),
            genre: input.genre.trim().to_owned(),
            label: input.label.trim().to_owned(),
        };
        validate_artist(&fields)?;
        let existing = self.store.find_artist_by_name(&fields.name)?;
        ensure_unique(
            existing.map(|a| a.id),
            own_id,
            EntityKind::Artist,
            &fields.name,
        )?;
        Ok(fields)
    }

    fn album_fields(&self, input: &AlbumInput, own_id: Option<i64>) -> AppResult<AlbumFields> {
        let track_count = parse_track_count(&input.track_count)?;
        let release_date = parse_release_date(&input.release_date)?;
        let artist = self.resolve_artist(input.artist_name.trim())?;
        let fields = AlbumFields {
            title: input.title.trim().to_owned(),
            track_count,
            release_date,
            label: input.label.trim().to_owned(),
            artist_id: artist.id,
        };
        validate_album(&fields)?;
        let existing = self.store.find_album_by_title(&fields.title)?;
        ensure_unique(
            existing.map(|a| a.id),
            own_id,
            EntityKind::Album,
            &fields.title,
        )?;
        Ok(fields)
    }

    fn song_fields(&self, input: &SongInput, own_id: Option<i64>) -> AppResult<SongFields> {
        let artist = self.resolve_artist(input.artist_name.trim())?;
        let album = self.resolve_album(input.album_title.trim())?;
        let fields = SongFields {
            title: input.title.trim().to_owned(),
            duration: input.duration.trim().to_owned(),
            artist_id: artist.id,
            album_id: album.id,
        };
        validate_song(&fields)?;
        let existing = self.store.find_song_by_title(&fields.title)?;
        ensure_unique(
            existing.map(|s| s.id),
            own_id,
            EntityKind::Song,
            &fields.title,
        )?;
        Ok(fields)
    }

    // =========================================================================
    // Artists
    // =========================================================================

    pub fn create_artist(&self, input: &ArtistInput) -> AppResult<Artist> {
        let fields = self.artist_fields(input, None)?;
        let artist = self.store.insert_artist(&fields)?;
        info!("Created artist {} ({})", artist.name, artist.id);
        Ok(artist)
    }

    pub fn get_artist(&self, id: i64) -> AppResult<Artist> {
        self.store.get_artist(id)?.ok_or(AppError::NotFound {
            entity: EntityKind::Artist,
            id,
        })
    }

    pub fn list_artists(&self) -> AppResult<Vec<Artist>> {
        self.store.list_artists()
    }

    pub fn update_artist(&self, id: i64, input: &ArtistInput) -> AppResult<Artist> {
        self.get_artist(id)?;
        let fields = self.artist_fields(input, Some(id))?;
        let artist = self.store.update_artist(id, &fields)?;
        info!("Updated artist {}", id);
        Ok(artist)
    }

    pub fn delete_artist(&self, id: i64) -> AppResult<DeleteOutcome> {
        let outcome = self.store.delete_artist(id)?;
        info!(
            "Deleted artist {} ({} albums and {} songs cascaded)",
            id, outcome.cascaded_albums, outcome.cascaded_songs
        );
        Ok(outcome)
    }

    // =========================================================================
    // Albums
    // =========================================================================

    pub fn create_album(&self, input: &AlbumInput) -> AppResult<Album> {
        let fields = self.album_fields(input, None)?;
        let album = self.store.insert_album(&fields)?;
        info!("Created album {} ({})", album.title, album.id);
        Ok(album)
    }

    pub fn get_album(&self, id: i64) -> AppResult<Album> {
        self.store.get_album(id)?.ok_or(AppError::NotFound {
            entity: EntityKind::Album,
            id,
        })
    }

    pub fn list_albums(&self) -> AppResult<Vec<AlbumListing>> {
        self.store.list_albums()
    }

    pub fn update_album(&self, id: i64, input: &AlbumInput) -> AppResult<Album> {
        self.get_album(id)?;
        let fields = self.album_fields(input, Some(id))?;
        let album = self.store.update_album(id, &fields)?;
        info!("Updated album {}", id);
        Ok(album)
    }

    pub fn delete_album(&self, id: i64) -> AppResult<DeleteOutcome> {
        let outcome = self.store.delete_album(id)?;
        info!(
            "Deleted album {} ({} songs cascaded)",
            id, outcome.cascaded_songs
        );
        Ok(outcome)
    }

    // =========================================================================
    // Songs
    // =========================================================================

    pub fn create_song(&self, input: &SongInput) -> AppResult<Song> {
        let fields = self.song_fields(input, None)?;
        let song = self.store.insert_song(&fields)?;
        info!("Created song {} ({})", song.title, song.id);
        Ok(song)
    }

    pub fn get_song(&self, id: i64) -> AppResult<Song> {
        self.store.get_song(id)?.ok_or(AppError::NotFound {
            entity: EntityKind::Song,
            id,
        })
    }

    pub fn list_songs(&self) -> AppResult<Vec<SongListing>> {
        self.store.list_songs()
    }

    pub fn update_song(&self, id: i64, input: &SongInput) -> AppResult<Song> {
        self.get_song(id)?;
        let fields = self.song_fields(input, Some(id))?;
        let song = self.store.update_song(id, &fields)?;
        info!("Updated song {}", id);
        Ok(song)
    }

    pub fn delete_song(&self, id: i64) -> AppResult<()> {
        self.store.delete_song(id)?;
        info!("Deleted song {}", id);
        Ok(())
    }

    // =========================================================================
    // Form prefill
    // =========================================================================

    pub fn artist_input(&self, id: i64) -> AppResult<ArtistInput> {
        let artist = self.get_artist(id)?;
        Ok(ArtistInput {
            name: artist.name,
            genre: artist.genre,
            label: artist.label,
        })
    }

    /// A dangling artist reference prefills as an empty name.
    pub fn album_input(&self, id: i64) -> AppResult<AlbumInput> {
        let album = self.get_album(id)?;
        let artist_name = self
            .store
            .get_artist(album.artist_id)?
            .map(|a| a.name)
            .unwrap_or_default();
        Ok(AlbumInput {
            title: album.title,
            track_count: album.track_count.to_string(),
            release_date: album
                .release_date
                .format(crate::catalog_store::RELEASE_DATE_FORMAT)
                .to_string(),
            label: album.label,
            artist_name,
        })
    }

    pub fn song_input(&self, id: i64) -> AppResult<SongInput> {
        let song = self.get_song(id)?;
        let artist_name = self
            .store
            .get_artist(song.artist_id)?
            .map(|a| a.name)
            .unwrap_or_default();
        let album_title = self
            .store
            .get_album(song.album_id)?
            .map(|a| a.title)
            .unwrap_or_default();
        Ok(SongInput {
            title: song.title,
            duration: song.duration,
            artist_name,
            album_title,
        })
    }

    pub fn get_counts(&self) -> AppResult<CatalogCounts> {
        self.store.get_counts()
    }
}
