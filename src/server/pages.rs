//! Server-side rendered HTML pages.

use crate::catalog::{AlbumInput, ArtistInput, SongInput};
use crate::catalog_store::{AlbumListing, Artist, CatalogCounts, SongListing, RELEASE_DATE_FORMAT};
use std::fmt::Write;

/// Escapes text for use in element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, username: Option<&str>, flash: Option<&str>, body: &str) -> String {
    let nav = match username {
        Some(username) => format!(
            "<nav><a href=\"/\">Home</a> | <a href=\"/artists\">Artists</a> | \
             <a href=\"/albums\">Albums</a> | <a href=\"/songs\">Songs</a> | \
             <span class=\"user\">{}</span> <a href=\"/logout\">Log out</a></nav>",
            escape(username)
        ),
        None => "<nav><a href=\"/login\">Log in</a> | <a href=\"/register\">Register</a></nav>"
            .to_owned(),
    };
    let flash = flash
        .map(|message| format!("<p class=\"flash\">{}</p>", escape(message)))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n{nav}\n{flash}\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape(title),
        nav = nav,
        flash = flash,
        body = body
    )
}

fn error_paragraph(message: Option<&str>) -> String {
    message
        .map(|message| format!("<p class=\"error\">{}</p>", escape(message)))
        .unwrap_or_default()
}

fn text_field(name: &str, label: &str, value: &str, input_type: &str) -> String {
    format!(
        "<label>{label} <input type=\"{input_type}\" name=\"{name}\" value=\"{value}\" required></label><br>",
        label = escape(label),
        input_type = input_type,
        name = name,
        value = escape(value)
    )
}

fn form(action: &str, fields: &[String], submit: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{}\">\n{}\n<button type=\"submit\">{}</button>\n</form>",
        escape(action),
        fields.join("\n"),
        escape(submit)
    )
}

fn delete_button(action: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{}\" class=\"inline\"><button type=\"submit\">Delete</button></form>",
        escape(action)
    )
}

fn or_missing(value: Option<&str>) -> String {
    match value {
        Some(value) => escape(value),
        None => "<em>(missing)</em>".to_owned(),
    }
}

// =========================================================================
// Accounts
// =========================================================================

pub fn login_page(username: &str, message: Option<&str>, flash: Option<&str>) -> String {
    let body = format!(
        "{}\n{}\n<p>No account? <a href=\"/register\">Register</a></p>",
        error_paragraph(message),
        form(
            "/login",
            &[
                text_field("username", "Username", username, "text"),
                text_field("password", "Password", "", "password"),
            ],
            "Log in"
        )
    );
    layout("Log in", None, flash, &body)
}

pub fn register_page(username: &str, message: Option<&str>, flash: Option<&str>) -> String {
    let body = format!(
        "{}\n{}\n<p>Already registered? <a href=\"/login\">Log in</a></p>",
        error_paragraph(message),
        form(
            "/register",
            &[
                text_field("username", "Username", username, "text"),
                text_field("password", "Password", "", "password"),
            ],
            "Register"
        )
    );
    layout("Register", None, flash, &body)
}

pub fn home_page(
    username: &str,
    counts: &CatalogCounts,
    uptime: &str,
    flash: Option<&str>,
) -> String {
    let body = format!(
        "<p>Welcome, {}.</p>\n<ul>\n\
         <li><a href=\"/artists\">Artists</a>: {}</li>\n\
         <li><a href=\"/albums\">Albums</a>: {}</li>\n\
         <li><a href=\"/songs\">Songs</a>: {}</li>\n</ul>\n\
         <p class=\"uptime\">Up for {}</p>",
        escape(username),
        counts.artists,
        counts.albums,
        counts.songs,
        escape(uptime)
    );
    layout("Music catalog", Some(username), flash, &body)
}

// =========================================================================
// Listings
// =========================================================================

pub fn artists_page(username: &str, artists: &[Artist], flash: Option<&str>) -> String {
    let mut rows = String::new();
    for artist in artists {
        let _ = writeln!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td><a href=\"/artists/{id}/edit\">Edit</a> {}</td></tr>",
            escape(&artist.name),
            escape(&artist.genre),
            escape(&artist.label),
            delete_button(&format!("/artists/{}/delete", artist.id)),
            id = artist.id
        );
    }
    let body = format!(
        "<p><a href=\"/artists/new\">Add artist</a></p>\n<table>\n\
         <tr><th>Name</th><th>Genre</th><th>Label</th><th></th></tr>\n{}</table>",
        rows
    );
    layout("Artists", Some(username), flash, &body)
}

pub fn albums_page(username: &str, albums: &[AlbumListing], flash: Option<&str>) -> String {
    let mut rows = String::new();
    for listing in albums {
        let album = &listing.album;
        let _ = writeln!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href=\"/albums/{id}/edit\">Edit</a> {}</td></tr>",
            escape(&album.title),
            or_missing(listing.artist_name.as_deref()),
            album.track_count,
            album.release_date.format(RELEASE_DATE_FORMAT),
            escape(&album.label),
            delete_button(&format!("/albums/{}/delete", album.id)),
            id = album.id
        );
    }
    let body = format!(
        "<p><a href=\"/albums/new\">Add album</a></p>\n<table>\n\
         <tr><th>Title</th><th>Artist</th><th>Tracks</th><th>Released</th><th>Label</th><th></th></tr>\n{}</table>",
        rows
    );
    layout("Albums", Some(username), flash, &body)
}

pub fn songs_page(username: &str, songs: &[SongListing], flash: Option<&str>) -> String {
    let mut rows = String::new();
    for listing in songs {
        let song = &listing.song;
        let _ = writeln!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href=\"/songs/{id}/edit\">Edit</a> {}</td></tr>",
            escape(&song.title),
            escape(&song.duration),
            or_missing(listing.artist_name.as_deref()),
            or_missing(listing.album_title.as_deref()),
            delete_button(&format!("/songs/{}/delete", song.id)),
            id = song.id
        );
    }
    let body = format!(
        "<p><a href=\"/songs/new\">Add song</a></p>\n<table>\n\
         <tr><th>Title</th><th>Duration</th><th>Artist</th><th>Album</th><th></th></tr>\n{}</table>",
        rows
    );
    layout("Songs", Some(username), flash, &body)
}

// =========================================================================
// Entity forms
// =========================================================================

/// Where a catalog form posts to, and how it is titled.
pub struct FormTarget<'a> {
    pub title: &'a str,
    pub action: String,
    pub submit: &'a str,
}

pub fn artist_form_page(
    username: &str,
    target: &FormTarget,
    input: &ArtistInput,
    message: Option<&str>,
) -> String {
    let body = format!(
        "{}\n{}",
        error_paragraph(message),
        form(
            &target.action,
            &[
                text_field("name", "Name", &input.name, "text"),
                text_field("genre", "Genre", &input.genre, "text"),
                text_field("label", "Label", &input.label, "text"),
            ],
            target.submit
        )
    );
    layout(target.title, Some(username), None, &body)
}

pub fn album_form_page(
    username: &str,
    target: &FormTarget,
    input: &AlbumInput,
    message: Option<&str>,
) -> String {
    let body = format!(
        "{}\n{}",
        error_paragraph(message),
        form(
            &target.action,
            &[
                text_field("title", "Title", &input.title, "text"),
                text_field("track_count", "Tracks", &input.track_count, "number"),
                text_field("artist_name", "Artist", &input.artist_name, "text"),
                text_field("label", "Label", &input.label, "text"),
                text_field("release_date", "Release date", &input.release_date, "date"),
            ],
            target.submit
        )
    );
    layout(target.title, Some(username), None, &body)
}

pub fn song_form_page(
    username: &str,
    target: &FormTarget,
    input: &SongInput,
    message: Option<&str>,
) -> String {
    let body = format!(
        "{}\n{}",
        error_paragraph(message),
        form(
            &target.action,
            &[
                text_field("title", "Title", &input.title, "text"),
                text_field("duration", "Duration", &input.duration, "text"),
                text_field("artist_name", "Artist", &input.artist_name, "text"),
                text_field("album_title", "Album", &input.album_title, "text"),
            ],
            target.submit
        )
    );
    layout(target.title, Some(username), None, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn artist_listing_escapes_values() {
        let artists = vec![Artist {
            id: 7,
            name: "<b>Queen</b>".to_string(),
            genre: "Rock".to_string(),
            label: "EMI".to_string(),
        }];
        let html = artists_page("alice", &artists, Some("Saved & done"));
        assert!(html.contains("&lt;b&gt;Queen&lt;/b&gt;"));
        assert!(!html.contains("<b>Queen</b>"));
        assert!(html.contains("/artists/7/edit"));
        assert!(html.contains("/artists/7/delete"));
        assert!(html.contains("Saved &amp; done"));
    }

    #[test]
    fn forms_echo_submitted_values() {
        let target = FormTarget {
            title: "New song",
            action: "/songs/new".to_string(),
            submit: "Save",
        };
        let input = SongInput {
            title: "Bohemian Rhapsody".to_string(),
            duration: "5:55".to_string(),
            artist_name: "Queen".to_string(),
            album_title: "\"Opera\"".to_string(),
        };
        let html = song_form_page("alice", &target, &input, Some("Album not found."));
        assert!(html.contains("value=\"Bohemian Rhapsody\""));
        assert!(html.contains("value=\"&quot;Opera&quot;\""));
        assert!(html.contains("Album not found."));
    }

    #[test]
    fn login_page_never_prefills_password() {
        let html = login_page("alice", Some("Incorrect username or password."), None);
        assert!(html.contains("name=\"password\" value=\"\""));
        assert!(html.contains("value=\"alice\""));
    }
}
