//! One-shot messages carried across a redirect in a short-lived cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

pub const COOKIE_FLASH_KEY: &str = "flash";
const FLASH_MAX_AGE_SECS: i64 = 60;

/// Adds a flash message to be shown by the next rendered page.
pub fn set_flash(jar: CookieJar, message: impl Into<String>) -> CookieJar {
    jar.add(
        Cookie::build((COOKIE_FLASH_KEY, message.into()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(FLASH_MAX_AGE_SECS))
            .build(),
    )
}

/// Reads the pending flash message, if any, and removes it from the jar.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<String>) {
    let message = jar
        .get(COOKIE_FLASH_KEY)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty());
    match message {
        Some(message) => {
            let jar = jar.remove(Cookie::build(COOKIE_FLASH_KEY).path("/"));
            (jar, Some(message))
        }
        None => (jar, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};

    #[test]
    fn flash_is_consumed_once() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("flash=Saved; other=1"),
        );
        let jar = CookieJar::from_headers(&headers);

        let (jar, message) = take_flash(jar);
        assert_eq!(message.as_deref(), Some("Saved"));
        assert!(jar.get(COOKIE_FLASH_KEY).is_none());
        assert!(jar.get("other").is_some());
    }

    #[test]
    fn missing_flash_leaves_jar_alone() {
        let (jar, message) = take_flash(CookieJar::new());
        assert!(message.is_none());
        assert!(jar.iter().next().is_none());
    }

    #[test]
    fn set_flash_adds_cookie() {
        let jar = set_flash(CookieJar::new(), "Logged in.");
        assert_eq!(jar.get(COOKIE_FLASH_KEY).unwrap().value(), "Logged in.");
    }
}
