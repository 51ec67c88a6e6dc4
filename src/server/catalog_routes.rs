//! Artist, album and song pages and form handlers.

use super::flash::{set_flash, take_flash};
use super::pages::{self, FormTarget};
use super::responses::{form_failure, plain_text};
use super::session::Session;
use super::state::{GuardedCatalogService, ServerState};
use crate::catalog::{AlbumInput, ArtistInput, SongInput};
use crate::catalog_store::DeleteOutcome;
use crate::error::EntityKind;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

fn updated(entity: EntityKind) -> Response {
    plain_text(StatusCode::OK, format!("{} updated successfully.", entity))
}

fn deleted(entity: EntityKind, outcome: DeleteOutcome) -> Response {
    let mut message = format!("{} deleted successfully.", entity);
    if outcome.cascaded_albums > 0 || outcome.cascaded_songs > 0 {
        message.push_str(&format!(
            " Also removed {} album(s) and {} song(s).",
            outcome.cascaded_albums, outcome.cascaded_songs
        ));
    }
    plain_text(StatusCode::OK, message)
}

fn new_target<'a>(title: &'a str, path: &str) -> FormTarget<'a> {
    FormTarget {
        title,
        action: path.to_owned(),
        submit: "Save",
    }
}

fn edit_target<'a>(title: &'a str, collection: &str, id: i64) -> FormTarget<'a> {
    FormTarget {
        title,
        action: format!("/{}/{}/edit", collection, id),
        submit: "Update",
    }
}

// =========================================================================
// Artists
// =========================================================================

async fn list_artists(
    session: Session,
    State(catalog): State<GuardedCatalogService>,
    jar: CookieJar,
) -> Response {
    match catalog.list_artists() {
        Ok(artists) => {
            let (jar, flash) = take_flash(jar);
            let html = pages::artists_page(&session.username, &artists, flash.as_deref());
            (jar, Html(html)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn new_artist_form(session: Session) -> Html<String> {
    Html(pages::artist_form_page(
        &session.username,
        &new_target("New artist", "/artists/new"),
        &ArtistInput::default(),
        None,
    ))
}

async fn create_artist(
    session: Session,
    State(catalog): State<GuardedCatalogService>,
    jar: CookieJar,
    Form(input): Form<ArtistInput>,
) -> Response {
    match catalog.create_artist(&input) {
        Ok(artist) => {
            info!("{} created artist {}", session.username, artist.id);
            let jar = set_flash(jar, "Artist created successfully.");
            (jar, Redirect::to("/artists")).into_response()
        }
        Err(err) => form_failure(err, |message| {
            pages::artist_form_page(
                &session.username,
                &new_target("New artist", "/artists/new"),
                &input,
                Some(message),
            )
        }),
    }
}

async fn edit_artist_form(
    session: Session,
    State(catalog): State<GuardedCatalogService>,
    Path(id): Path<i64>,
) -> Response {
    match catalog.artist_input(id) {
        Ok(input) => Html(pages::artist_form_page(
            &session.username,
            &edit_target("Edit artist", "artists", id),
            &input,
            None,
        ))
        .into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_artist(
    session: Session,
    State(catalog): State<GuardedCatalogService>,
    Path(id): Path<i64>,
    Form(input): Form<ArtistInput>,
) -> Response {
    match catalog.update_artist(id, &input) {
        Ok(_) => {
            info!("{} updated artist {}", session.username, id);
            updated(EntityKind::Artist)
        }
        Err(err) => err.into_response(),
    }
}

async fn delete_artist(
    session: Session,
    State(catalog): State<GuardedCatalogService>,
    Path(id): Path<i64>,
) -> Response {
    match catalog.delete_artist(id) {
        Ok(outcome) => {
            info!("{} deleted artist {}", session.username, id);
            deleted(EntityKind::Artist, outcome)
        }
        Err(err) => err.into_response(),
    }
}

// =========================================================================
// Albums
// =========================================================================

async fn list_albums(
    session: Session,
    State(catalog): State<GuardedCatalogService>,
    jar: CookieJar,
) -> Response {
    match catalog.list_albums() {
        Ok(albums) => {
            let (jar, flash) = take_flash(jar);
            let html = pages::albums_page(&session.username, &albums, flash.as_deref());
            (jar, Html(html)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn new_album_form(session: Session) -> Html<String> {
    Html(pages::album_form_page(
        &session.username,
        &new_target("New album", "/albums/new"),
        &AlbumInput::default(),
        None,
    ))
}

async fn create_album(
    session: Session,
    State(catalog): State<GuardedCatalogService>,
    jar: CookieJar,
    Form(input): Form<AlbumInput>,
) -> Response {
    match catalog.create_album(&input) {
        Ok(album) => {
            info!("{} created album {}", session.username, album.id);
            let jar = set_flash(jar, "Album created successfully.");
            (jar, Redirect::to("/albums")).into_response()
        }
        Err(err) => form_failure(err, |message| {
            pages::album_form_page(
                &session.username,
                &new_target("New album", "/albums/new"),
                &input,
                Some(message),
            )
        }),
    }
}

async fn edit_album_form(
    session: Session,
    State(catalog): State<GuardedCatalogService>,
    Path(id): Path<i64>,
) -> Response {
    match catalog.album_input(id) {
        Ok(input) => Html(pages::album_form_page(
            &session.username,
            &edit_target("Edit album", "albums", id),
            &input,
            None,
        ))
        .into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_album(
    session: Session,
    State(catalog): State<GuardedCatalogService>,
    Path(id): Path<i64>,
    Form(input): Form<AlbumInput>,
) -> Response {
    match catalog.update_album(id, &input) {
        Ok(_) => {
            info!("{} updated album {}", session.username, id);
            updated(EntityKind::Album)
        }
        Err(err) => err.into_response(),
    }
}

async fn delete_album(
    session: Session,
    State(catalog): State<GuardedCatalogService>,
    Path(id): Path<i64>,
) -> Response {
    match catalog.delete_album(id) {
        Ok(outcome) => {
            info!("{} deleted album {}", session.username, id);
            deleted(EntityKind::Album, outcome)
        }
        Err(err) => err.into_response(),
    }
}

// =========================================================================
// Songs
// =========================================================================

async fn list_songs(
    session: Session,
    State(catalog): State<GuardedCatalogService>,
    jar: CookieJar,
) -> Response {
    match catalog.list_songs() {
        Ok(songs) => {
            let (jar, flash) = take_flash(jar);
            let html = pages::songs_page(&session.username, &songs, flash.as_deref());
            (jar, Html(html)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn new_song_form(session: Session) -> Html<String> {
    Html(pages::song_form_page(
        &session.username,
        &new_target("New song", "/songs/new"),
        &SongInput::default(),
        None,
    ))
}

async fn create_song(
    session: Session,
    State(catalog): State<GuardedCatalogService>,
    jar: CookieJar,
    Form(input): Form<SongInput>,
) -> Response {
    match catalog.create_song(&input) {
        Ok(song) => {
            info!("{} created song {}", session.username, song.id);
            let jar = set_flash(jar, "Song created successfully.");
            (jar, Redirect::to("/songs")).into_response()
        }
        Err(err) => form_failure(err, |message| {
            pages::song_form_page(
                &session.username,
                &new_target("New song", "/songs/new"),
                &input,
                Some(message),
            )
        }),
    }
}

async fn edit_song_form(
    session: Session,
    State(catalog): State<GuardedCatalogService>,
    Path(id): Path<i64>,
) -> Response {
    match catalog.song_input(id) {
        Ok(input) => Html(pages::song_form_page(
            &session.username,
            &edit_target("Edit song", "songs", id),
            &input,
            None,
        ))
        .into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_song(
    session: Session,
    State(catalog): State<GuardedCatalogService>,
    Path(id): Path<i64>,
    Form(input): Form<SongInput>,
) -> Response {
    match catalog.update_song(id, &input) {
        Ok(_) => {
            info!("{} updated song {}", session.username, id);
            updated(EntityKind::Song)
        }
        Err(err) => err.into_response(),
    }
}

async fn delete_song(
    session: Session,
    State(catalog): State<GuardedCatalogService>,
    Path(id): Path<i64>,
) -> Response {
    match catalog.delete_song(id) {
        Ok(()) => {
            info!("{} deleted song {}", session.username, id);
            deleted(EntityKind::Song, DeleteOutcome::default())
        }
        Err(err) => err.into_response(),
    }
}

pub fn make_catalog_routes(state: ServerState) -> Router {
    Router::new()
        .route("/artists", get(list_artists))
        .route("/artists/new", get(new_artist_form).post(create_artist))
        .route("/artists/{id}/edit", get(edit_artist_form).post(update_artist))
        .route("/artists/{id}/delete", post(delete_artist))
        .route("/albums", get(list_albums))
        .route("/albums/new", get(new_album_form).post(create_album))
        .route("/albums/{id}/edit", get(edit_album_form).post(update_album))
        .route("/albums/{id}/delete", post(delete_album))
        .route("/songs", get(list_songs))
        .route("/songs/new", get(new_song_form).post(create_song))
        .route("/songs/{id}/edit", get(edit_song_form).post(update_song))
        .route("/songs/{id}/delete", post(delete_song))
        .with_state(state)
}
