//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server route. Redirects are not
//! followed so tests can assert on `303 See Other` and its `Location`.
//!
//! When routes or form fields change, update only this file.

use super::constants::*;
use reqwest::{redirect, Response};
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

/// The `Location` header of a redirect response.
pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client logged in as the seeded test account
    ///
    /// # Panics
    ///
    /// Panics if the login fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(TEST_USER, TEST_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::SEE_OTHER,
            "Test account login failed: {:?}",
            response.text().await
        );

        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET on an arbitrary path
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// Form POST on an arbitrary path
    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(fields)
            .send()
            .await
            .expect("POST request failed")
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// POST /register
    pub async fn register(&self, username: &str, password: &str) -> Response {
        self.post_form("/register", &[("username", username), ("password", password)])
            .await
    }

    /// POST /login
    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.post_form("/login", &[("username", username), ("password", password)])
            .await
    }

    /// GET /logout
    pub async fn logout(&self) -> Response {
        self.get("/logout").await
    }

    /// GET /
    pub async fn home(&self) -> Response {
        self.get("/").await
    }

    // ========================================================================
    // Artists
    // ========================================================================

    /// GET /artists
    pub async fn list_artists(&self) -> Response {
        self.get("/artists").await
    }

    /// POST /artists/new
    pub async fn create_artist(&self, name: &str, genre: &str, label: &str) -> Response {
        self.post_form(
            "/artists/new",
            &[("name", name), ("genre", genre), ("label", label)],
        )
        .await
    }

    /// POST /artists/{id}/edit
    pub async fn update_artist(&self, id: i64, name: &str, genre: &str, label: &str) -> Response {
        self.post_form(
            &format!("/artists/{}/edit", id),
            &[("name", name), ("genre", genre), ("label", label)],
        )
        .await
    }

    /// POST /artists/{id}/delete
    pub async fn delete_artist(&self, id: i64) -> Response {
        self.post_form(&format!("/artists/{}/delete", id), &[]).await
    }

    // ========================================================================
    // Albums
    // ========================================================================

    /// GET /albums
    pub async fn list_albums(&self) -> Response {
        self.get("/albums").await
    }

    /// POST /albums/new
    pub async fn create_album(
        &self,
        title: &str,
        track_count: &str,
        release_date: &str,
        label: &str,
        artist_name: &str,
    ) -> Response {
        self.post_form(
            "/albums/new",
            &[
                ("title", title),
                ("track_count", track_count),
                ("release_date", release_date),
                ("label", label),
                ("artist_name", artist_name),
            ],
        )
        .await
    }

    /// POST /albums/{id}/edit
    pub async fn update_album(
        &self,
        id: i64,
        title: &str,
        track_count: &str,
        release_date: &str,
        label: &str,
        artist_name: &str,
    ) -> Response {
        self.post_form(
            &format!("/albums/{}/edit", id),
            &[
                ("title", title),
                ("track_count", track_count),
                ("release_date", release_date),
                ("label", label),
                ("artist_name", artist_name),
            ],
        )
        .await
    }

    /// POST /albums/{id}/delete
    pub async fn delete_album(&self, id: i64) -> Response {
        self.post_form(&format!("/albums/{}/delete", id), &[]).await
    }

    // ========================================================================
    // Songs
    // ========================================================================

    /// GET /songs
    pub async fn list_songs(&self) -> Response {
        self.get("/songs").await
    }

    /// POST /songs/new
    pub async fn create_song(
        &self,
        title: &str,
        duration: &str,
        artist_name: &str,
        album_title: &str,
    ) -> Response {
        self.post_form(
            "/songs/new",
            &[
                ("title", title),
                ("duration", duration),
                ("artist_name", artist_name),
                ("album_title", album_title),
            ],
        )
        .await
    }

    /// POST /songs/{id}/edit
    pub async fn update_song(
        &self,
        id: i64,
        title: &str,
        duration: &str,
        artist_name: &str,
        album_title: &str,
    ) -> Response {
        self.post_form(
            &format!("/songs/{}/edit", id),
            &[
                ("title", title),
                ("duration", duration),
                ("artist_name", artist_name),
                ("album_title", album_title),
            ],
        )
        .await
    }

    /// POST /songs/{id}/delete
    pub async fn delete_song(&self, id: i64) -> Response {
        self.post_form(&format!("/songs/{}/delete", id), &[]).await
    }
}
