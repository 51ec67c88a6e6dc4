//! Validation for catalog entities.
//!
//! Field limits mirror the catalog column sizes.

use super::models::{AlbumFields, ArtistFields, SongFields, RELEASE_DATE_FORMAT};
use crate::error::{AppError, AppResult};
use chrono::NaiveDate;

pub const MAX_TEXT_LENGTH: usize = 100;
pub const MAX_DURATION_LENGTH: usize = 10;

fn require_text(field: &'static str, value: &str, max_len: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_field(field, "is required"));
    }
    if value.chars().count() > max_len {
        return Err(AppError::invalid_field(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }
    Ok(())
}

pub fn validate_artist(fields: &ArtistFields) -> AppResult<()> {
    require_text("name", &fields.name, MAX_TEXT_LENGTH)?;
    require_text("genre", &fields.genre, MAX_TEXT_LENGTH)?;
    require_text("label", &fields.label, MAX_TEXT_LENGTH)
}

pub fn validate_album(fields: &AlbumFields) -> AppResult<()> {
    require_text("title", &fields.title, MAX_TEXT_LENGTH)?;
    require_text("label", &fields.label, MAX_TEXT_LENGTH)?;
    if fields.track_count < 0 {
        return Err(AppError::invalid_field(
            "track_count",
            format!("must be non-negative, got {}", fields.track_count),
        ));
    }
    Ok(())
}

pub fn validate_song(fields: &SongFields) -> AppResult<()> {
    require_text("title", &fields.title, MAX_TEXT_LENGTH)?;
    require_text("duration", &fields.duration, MAX_DURATION_LENGTH)
}

/// Natural keys typed into a form must name something.
pub fn require_reference(field: &'static str, value: &str) -> AppResult<()> {
    require_text(field, value, MAX_TEXT_LENGTH)
}

pub fn parse_release_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), RELEASE_DATE_FORMAT)
        .map_err(|_| AppError::invalid_field("release_date", "expected YYYY-MM-DD"))
}

pub fn parse_track_count(value: &str) -> AppResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::invalid_field("track_count", "must be a whole number"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_valid_album() -> AlbumFields {
        AlbumFields {
            title: "A Night at the Opera".to_string(),
            track_count: 12,
            release_date: NaiveDate::from_ymd_opt(1975, 11, 21).unwrap(),
            label: "EMI".to_string(),
            artist_id: 1,
        }
    }

    #[test]
    fn rejects_blank_artist_name() {
        let fields = ArtistFields {
            name: "   ".to_string(),
            genre: "Rock".to_string(),
            label: "EMI".to_string(),
        };
        match validate_artist(&fields) {
            Err(AppError::InvalidField { field, .. }) => assert_eq!(field, "name"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_too_long_duration() {
        let fields = SongFields {
            title: "Bohemian Rhapsody".to_string(),
            duration: "00:05:55.000".to_string(),
            artist_id: 1,
            album_id: 1,
        };
        assert!(matches!(
            validate_song(&fields),
            Err(AppError::InvalidField {
                field: "duration",
                ..
            })
        ));
    }

    #[test]
    fn rejects_negative_track_count() {
        let mut album = make_valid_album();
        validate_album(&album).unwrap();
        album.track_count = -1;
        assert!(validate_album(&album).is_err());
    }

    #[test]
    fn parses_form_values() {
        assert_eq!(
            parse_release_date("1975-11-21").unwrap(),
            NaiveDate::from_ymd_opt(1975, 11, 21).unwrap()
        );
        assert!(parse_release_date("21/11/1975").is_err());
        assert_eq!(parse_track_count(" 12 ").unwrap(), 12);
        assert!(parse_track_count("twelve").is_err());
    }
}
