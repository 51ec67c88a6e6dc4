use super::state::ServerState;
use crate::user::AuthTokenValue;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{debug, error};

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const LOGIN_PATH: &str = "/login";

/// The authenticated account of the current request.
#[derive(Debug, Clone)]
pub struct Session {
    pub account_id: usize,
    pub username: String,
    pub token: AuthTokenValue,
}

#[derive(Debug)]
pub enum SessionExtractionError {
    /// No cookie, or a token that is unknown or expired.
    Unauthenticated,
    InternalError,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> Response {
        match self {
            SessionExtractionError::Unauthenticated => Redirect::to(LOGIN_PATH).into_response(),
            SessionExtractionError::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

fn extract_session_token_from_cookies(parts: &Parts) -> Option<AuthTokenValue> {
    CookieJar::from_headers(&parts.headers)
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(Cookie::value)
        .filter(|value| !value.is_empty())
        .map(|value| AuthTokenValue(value.to_owned()))
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let token = match extract_session_token_from_cookies(parts) {
            Some(token) => token,
            None => {
                debug!("No session token in cookies.");
                return Err(SessionExtractionError::Unauthenticated);
            }
        };

        match ctx.account_manager.resolve_session(&token) {
            Ok(Some(account)) => Ok(Session {
                account_id: account.account_id,
                username: account.username,
                token: account.token,
            }),
            Ok(None) => {
                debug!("Session token not found or expired");
                Err(SessionExtractionError::Unauthenticated)
            }
            Err(err) => {
                error!("Failed to resolve session: {}", err);
                Err(SessionExtractionError::InternalError)
            }
        }
    }
}

pub fn session_cookie(token: &AuthTokenValue, secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_SESSION_TOKEN_KEY, token.0.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// A cookie that makes the browser drop the session token.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((COOKIE_SESSION_TOKEN_KEY, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
        .build()
}
