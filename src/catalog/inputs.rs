//! Submitted catalog records, with references given by natural key.

use serde::Deserialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArtistInput {
    pub name: String,
    pub genre: String,
    pub label: String,
}

/// `track_count` and `release_date` stay textual until validation so a
/// malformed value can be echoed back in the form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AlbumInput {
    pub title: String,
    pub track_count: String,
    pub release_date: String,
    pub label: String,
    pub artist_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SongInput {
    pub title: String,
    pub duration: String,
    pub artist_name: String,
    pub album_title: String,
}
