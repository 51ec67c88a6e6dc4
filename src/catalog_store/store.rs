//! SQLite-backed catalog store.

use super::delete_policy::DeletePolicy;
use super::models::*;
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::CatalogStore;
use crate::error::{classify_write_error, AppError, AppResult, EntityKind};
use crate::sqlite_persistence::open_versioned_db;
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const ARTIST_COLUMNS: &str = "id, name, genre, label";
const ALBUM_COLUMNS: &str = "id, title, track_count, release_date, label, artist_id";
const SONG_COLUMNS: &str = "id, title, duration, artist_id, album_id";

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
    delete_policy: DeletePolicy,
}

fn artist_from_row(row: &Row) -> rusqlite::Result<Artist> {
    Ok(Artist {
        id: row.get(0)?,
        name: row.get(1)?,
        genre: row.get(2)?,
        label: row.get(3)?,
    })
}

fn date_from_column(row: &Row, index: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(index)?;
    NaiveDate::parse_from_str(&raw, RELEASE_DATE_FORMAT)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err)))
}

fn album_from_row(row: &Row) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get(0)?,
        title: row.get(1)?,
        track_count: row.get(2)?,
        release_date: date_from_column(row, 3)?,
        label: row.get(4)?,
        artist_id: row.get(5)?,
    })
}

fn song_from_row(row: &Row) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        title: row.get(1)?,
        duration: row.get(2)?,
        artist_id: row.get(3)?,
        album_id: row.get(4)?,
    })
}

fn count(conn: &Connection, sql: &str, id: i64) -> AppResult<usize> {
    let n: i64 = conn.query_row(sql, params![id], |r| r.get(0))?;
    Ok(n as usize)
}

fn require_exists(conn: &Connection, table: &str, entity: EntityKind, id: i64) -> AppResult<()> {
    let exists = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?1", table),
            params![id],
            |_| Ok(()),
        )
        .optional()?;
    exists.ok_or(AppError::NotFound { entity, id })
}

impl SqliteCatalogStore {
    pub fn new<P: AsRef<Path>>(db_path: P, delete_policy: DeletePolicy) -> Result<Self> {
        let conn = open_versioned_db(db_path.as_ref(), CATALOG_VERSIONED_SCHEMAS)?;
        conn.pragma_update(None, "foreign_keys", delete_policy.enforces_foreign_keys())?;

        let store = SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
            delete_policy,
        };
        let counts = store.get_counts()?;
        info!(
            "Opened catalog {:?}: {} artists, {} albums, {} songs (delete policy: {})",
            db_path.as_ref(),
            counts.artists,
            counts.albums,
            counts.songs,
            delete_policy
        );
        Ok(store)
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal(anyhow!("Catalog connection mutex poisoned")))
    }

    /// Runs `f` inside `BEGIN IMMEDIATE`, committing on success and rolling
    /// back on any error.
    fn write<T>(&self, f: impl FnOnce(&Connection) -> AppResult<T>) -> AppResult<T> {
        let conn = self.lock()?;
        conn.execute("BEGIN IMMEDIATE", [])?;
        match f(&conn) {
            Ok(value) => {
                conn.execute("COMMIT", [])?;
                Ok(value)
            }
            Err(err) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(err)
            }
        }
    }

    fn query_one<T>(
        &self,
        sql: &str,
        param: &dyn rusqlite::ToSql,
        map: fn(&Row) -> rusqlite::Result<T>,
    ) -> AppResult<Option<T>> {
        let conn = self.lock()?;
        Ok(conn.query_row(sql, params![param], map).optional()?)
    }

    fn query_all<T>(&self, sql: &str, map: fn(&Row) -> rusqlite::Result<T>) -> AppResult<Vec<T>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map([], map)?
            .collect::<rusqlite::Result<Vec<T>>>()?;
        Ok(rows)
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn get_artist(&self, id: i64) -> AppResult<Option<Artist>> {
        self.query_one(
            &format!("SELECT {} FROM artist WHERE id = ?1", ARTIST_COLUMNS),
            &id,
            artist_from_row,
        )
    }

    fn find_artist_by_name(&self, name: &str) -> AppResult<Option<Artist>> {
        self.query_one(
            &format!("SELECT {} FROM artist WHERE name = ?1", ARTIST_COLUMNS),
            &name,
            artist_from_row,
        )
    }

    fn list_artists(&self) -> AppResult<Vec<Artist>> {
        self.query_all(
            &format!("SELECT {} FROM artist ORDER BY id", ARTIST_COLUMNS),
            artist_from_row,
        )
    }

    fn insert_artist(&self, fields: &ArtistFields) -> AppResult<Artist> {
        self.write(|conn| {
            conn.execute(
                "INSERT INTO artist (name, genre, label) VALUES (?1, ?2, ?3)",
                params![fields.name, fields.genre, fields.label],
            )
            .map_err(|err| classify_write_error(err, EntityKind::Artist, &fields.name))?;
            let id = conn.last_insert_rowid();
            debug!("Inserted artist {} with id {}", fields.name, id);
            Ok(Artist {
                id,
                name: fields.name.clone(),
                genre: fields.genre.clone(),
                label: fields.label.clone(),
            })
        })
    }

    fn update_artist(&self, id: i64, fields: &ArtistFields) -> AppResult<Artist> {
        self.write(|conn| {
            let updated = conn
                .execute(
                    "UPDATE artist SET name = ?1, genre = ?2, label = ?3 WHERE id = ?4",
                    params![fields.name, fields.genre, fields.label, id],
                )
                .map_err(|err| classify_write_error(err, EntityKind::Artist, &fields.name))?;
            if updated == 0 {
                return Err(AppError::NotFound {
                    entity: EntityKind::Artist,
                    id,
                });
            }
            Ok(Artist {
                id,
                name: fields.name.clone(),
                genre: fields.genre.clone(),
                label: fields.label.clone(),
            })
        })
    }

    fn delete_artist(&self, id: i64) -> AppResult<DeleteOutcome> {
        let policy = self.delete_policy;
        self.write(|conn| {
            require_exists(conn, "artist", EntityKind::Artist, id)?;
            let mut outcome = DeleteOutcome::default();
            match policy {
                DeletePolicy::AllowDangling => {}
                DeletePolicy::Reject => {
                    let dependents = count(
                        conn,
                        "SELECT COUNT(*) FROM album WHERE artist_id = ?1",
                        id,
                    )? + count(conn, "SELECT COUNT(*) FROM song WHERE artist_id = ?1", id)?;
                    if dependents > 0 {
                        return Err(AppError::StillReferenced {
                            entity: EntityKind::Artist,
                            id,
                            dependents,
                        });
                    }
                }
                DeletePolicy::Cascade => {
                    outcome.cascaded_songs = conn.execute(
                        "DELETE FROM song WHERE artist_id = ?1
                         OR album_id IN (SELECT id FROM album WHERE artist_id = ?1)",
                        params![id],
                    )?;
                    outcome.cascaded_albums =
                        conn.execute("DELETE FROM album WHERE artist_id = ?1", params![id])?;
                }
            }
            conn.execute("DELETE FROM artist WHERE id = ?1", params![id])?;
            Ok(outcome)
        })
    }

    fn get_album(&self, id: i64) -> AppResult<Option<Album>> {
        self.query_one(
            &format!("SELECT {} FROM album WHERE id = ?1", ALBUM_COLUMNS),
            &id,
            album_from_row,
        )
    }

    fn find_album_by_title(&self, title: &str) -> AppResult<Option<Album>> {
        self.query_one(
            &format!("SELECT {} FROM album WHERE title = ?1", ALBUM_COLUMNS),
            &title,
            album_from_row,
        )
    }

    fn list_albums(&self) -> AppResult<Vec<AlbumListing>> {
        self.query_all(
            "SELECT al.id, al.title, al.track_count, al.release_date, al.label, al.artist_id, ar.name
             FROM album al LEFT JOIN artist ar ON ar.id = al.artist_id
             ORDER BY al.id",
            |row| {
                Ok(AlbumListing {
                    album: album_from_row(row)?,
                    artist_name: row.get(6)?,
                })
            },
        )
    }

    fn insert_album(&self, fields: &AlbumFields) -> AppResult<Album> {
        self.write(|conn| {
            conn.execute(
                "INSERT INTO album (title, track_count, release_date, label, artist_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    fields.title,
                    fields.track_count,
                    fields.release_date.format(RELEASE_DATE_FORMAT).to_string(),
                    fields.label,
                    fields.artist_id
                ],
            )
            .map_err(|err| classify_write_error(err, EntityKind::Album, &fields.title))?;
            let id = conn.last_insert_rowid();
            debug!("Inserted album {} with id {}", fields.title, id);
            Ok(Album {
                id,
                title: fields.title.clone(),
                track_count: fields.track_count,
                release_date: fields.release_date,
                label: fields.label.clone(),
                artist_id: fields.artist_id,
            })
        })
    }

    fn update_album(&self, id: i64, fields: &AlbumFields) -> AppResult<Album> {
        self.write(|conn| {
            let updated = conn
                .execute(
                    "UPDATE album SET title = ?1, track_count = ?2, release_date = ?3, label = ?4,
                     artist_id = ?5 WHERE id = ?6",
                    params![
                        fields.title,
                        fields.track_count,
                        fields.release_date.format(RELEASE_DATE_FORMAT).to_string(),
                        fields.label,
                        fields.artist_id,
                        id
                    ],
                )
                .map_err(|err| classify_write_error(err, EntityKind::Album, &fields.title))?;
            if updated == 0 {
                return Err(AppError::NotFound {
                    entity: EntityKind::Album,
                    id,
                });
            }
            Ok(Album {
                id,
                title: fields.title.clone(),
                track_count: fields.track_count,
                release_date: fields.release_date,
                label: fields.label.clone(),
                artist_id: fields.artist_id,
            })
        })
    }

    fn delete_album(&self, id: i64) -> AppResult<DeleteOutcome> {
        let policy = self.delete_policy;
        self.write(|conn| {
            require_exists(conn, "album", EntityKind::Album, id)?;
            let mut outcome = DeleteOutcome::default();
            match policy {
                DeletePolicy::AllowDangling => {}
                DeletePolicy::Reject => {
                    let dependents =
                        count(conn, "SELECT COUNT(*) FROM song WHERE album_id = ?1", id)?;
                    if dependents > 0 {
                        return Err(AppError::StillReferenced {
                            entity: EntityKind::Album,
                            id,
                            dependents,
                        });
                    }
                }
                DeletePolicy::Cascade => {
                    outcome.cascaded_songs =
                        conn.execute("DELETE FROM song WHERE album_id = ?1", params![id])?;
                }
            }
            conn.execute("DELETE FROM album WHERE id = ?1", params![id])?;
            Ok(outcome)
        })
    }

    fn get_song(&self, id: i64) -> AppResult<Option<Song>> {
        self.query_one(
            &format!("SELECT {} FROM song WHERE id = ?1", SONG_COLUMNS),
            &id,
            song_from_row,
        )
    }

    fn find_song_by_title(&self, title: &str) -> AppResult<Option<Song>> {
        self.query_one(
            &format!("SELECT {} FROM song WHERE title = ?1", SONG_COLUMNS),
            &title,
            song_from_row,
        )
    }

    fn list_songs(&self) -> AppResult<Vec<SongListing>> {
        self.query_all(
            "SELECT s.id, s.title, s.duration, s.artist_id, s.album_id, ar.name, al.title
             FROM song s
             LEFT JOIN artist ar ON ar.id = s.artist_id
             LEFT JOIN album al ON al.id = s.album_id
             ORDER BY s.id",
            |row| {
                Ok(SongListing {
                    song: song_from_row(row)?,
                    artist_name: row.get(5)?,
                    album_title: row.get(6)?,
                })
            },
        )
    }

    fn insert_song(&self, fields: &SongFields) -> AppResult<Song> {
        self.write(|conn| {
            conn.execute(
                "INSERT INTO song (title, duration, artist_id, album_id) VALUES (?1, ?2, ?3, ?4)",
                params![
                    fields.title,
                    fields.duration,
                    fields.artist_id,
                    fields.album_id
                ],
            )
            .map_err(|err| classify_write_error(err, EntityKind::Song, &fields.title))?;
            let id = conn.last_insert_rowid();
            debug!("Inserted song {} with id {}", fields.title, id);
            Ok(Song {
                id,
                title: fields.title.clone(),
                duration: fields.duration.clone(),
                artist_id: fields.artist_id,
                album_id: fields.album_id,
            })
        })
    }

    fn update_song(&self, id: i64, fields: &SongFields) -> AppResult<Song> {
        self.write(|conn| {
            let updated = conn
                .execute(
                    "UPDATE song SET title = ?1, duration = ?2, artist_id = ?3, album_id = ?4
                     WHERE id = ?5",
                    params![
                        fields.title,
                        fields.duration,
                        fields.artist_id,
                        fields.album_id,
                        id
                    ],
                )
                .map_err(|err| classify_write_error(err, EntityKind::Song, &fields.title))?;
            if updated == 0 {
                return Err(AppError::NotFound {
                    entity: EntityKind::Song,
                    id,
                });
            }
            Ok(Song {
                id,
                title: fields.title.clone(),
                duration: fields.duration.clone(),
                artist_id: fields.artist_id,
                album_id: fields.album_id,
            })
        })
    }

    fn delete_song(&self, id: i64) -> AppResult<DeleteOutcome> {
        self.write(|conn| {
            let deleted = conn.execute("DELETE FROM song WHERE id = ?1", params![id])?;
            if deleted == 0 {
                return Err(AppError::NotFound {
                    entity: EntityKind::Song,
                    id,
                });
            }
            Ok(DeleteOutcome::default())
        })
    }

    fn get_counts(&self) -> AppResult<CatalogCounts> {
        let conn = self.lock()?;
        let count_table = |table: &str| -> rusqlite::Result<usize> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
                r.get::<_, i64>(0)
            })
            .map(|n| n as usize)
        };
        Ok(CatalogCounts {
            artists: count_table("artist")?,
            albums: count_table("album")?,
            songs: count_table("song")?,
        })
    }
}
