//! Test database fixtures
//!
//! Seeds the account and catalog databases the test server opens.

use super::constants::*;
use anyhow::Result;
use musica_catalog_server::catalog::{AlbumInput, ArtistInput, SongInput};
use musica_catalog_server::user::{HashedPassword, SqliteUserStore, UserStore};
use musica_catalog_server::CatalogService;

/// Creates the seeded accounts in the given store
pub fn seed_accounts(store: &SqliteUserStore) -> Result<()> {
    for (username, password) in [(TEST_USER, TEST_PASS), (OTHER_USER, OTHER_PASS)] {
        let password = HashedPassword::new(password)?;
        let account_id = store.create_account(username, &password)?;
        eprintln!("Created test account {} with id {}", username, account_id);
    }
    Ok(())
}

/// Creates one artist, one of their albums and one song on it
pub fn seed_catalog(catalog: &CatalogService) -> Result<()> {
    let artist = catalog.create_artist(&ArtistInput {
        name: ARTIST_NAME.to_string(),
        genre: "Rock".to_string(),
        label: "EMI".to_string(),
    })?;
    let album = catalog.create_album(&AlbumInput {
        title: ALBUM_TITLE.to_string(),
        track_count: "12".to_string(),
        release_date: "1975-11-21".to_string(),
        label: "EMI".to_string(),
        artist_name: ARTIST_NAME.to_string(),
    })?;
    let song = catalog.create_song(&SongInput {
        title: SONG_TITLE.to_string(),
        duration: "5:55".to_string(),
        artist_name: ARTIST_NAME.to_string(),
        album_title: ALBUM_TITLE.to_string(),
    })?;
    assert_eq!(artist.id, ARTIST_ID);
    assert_eq!(album.id, ALBUM_ID);
    assert_eq!(song.id, SONG_ID);
    Ok(())
}
