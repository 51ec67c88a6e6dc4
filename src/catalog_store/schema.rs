//! SQLite schema definitions for the catalog database.
//!
//! Natural keys (artist name, album title, song title) are globally unique.
//! Foreign keys are declared with `ON DELETE NO ACTION`; whether SQLite
//! enforces them depends on the configured `DeletePolicy`.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP,
};

pub const ARTIST_TABLE_NAME: &str = "artist";
pub const ALBUM_TABLE_NAME: &str = "album";
pub const SONG_TABLE_NAME: &str = "song";

const ARTIST_TABLE_V_0: Table = Table {
    name: ARTIST_TABLE_NAME,
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("genre", &SqlType::Text, non_null = true),
        sqlite_column!("label", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[],
};

const ALBUM_TABLE_V_0: Table = Table {
    name: ALBUM_TABLE_NAME,
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("track_count", &SqlType::Integer, non_null = true),
        sqlite_column!("release_date", &SqlType::Text, non_null = true), // YYYY-MM-DD
        sqlite_column!("label", &SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: ARTIST_TABLE_NAME,
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::NoAction,
            })
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_album_artist", "artist_id")],
};

const SONG_TABLE_V_0: Table = Table {
    name: SONG_TABLE_NAME,
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("duration", &SqlType::Text, non_null = true),
        sqlite_column!(
            "artist_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: ARTIST_TABLE_NAME,
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::NoAction,
            })
        ),
        sqlite_column!(
            "album_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: ALBUM_TABLE_NAME,
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::NoAction,
            })
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_song_artist", "artist_id"),
        ("idx_song_album", "album_id"),
    ],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[ARTIST_TABLE_V_0, ALBUM_TABLE_V_0, SONG_TABLE_V_0],
    migration: None,
}];
