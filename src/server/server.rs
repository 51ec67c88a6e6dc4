use anyhow::{Context, Result};
use std::time::Duration;

use tracing::info;

use crate::catalog::CatalogService;
use crate::user::AccountManager;
use axum_extra::extract::cookie::CookieJar;

use axum::{
    extract::State,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use std::sync::Arc;

#[cfg(feature = "slowdown")]
use super::slowdown_request;
use super::{
    catalog_routes::make_catalog_routes,
    flash::{set_flash, take_flash},
    log_requests, pages,
    responses::form_failure,
    session::{expired_session_cookie, session_cookie, Session, LOGIN_PATH},
    state::*,
    ServerConfig,
};

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct CredentialsForm {
    pub username: String,
    pub password: String,
}

async fn home(session: Session, State(state): State<ServerState>, jar: CookieJar) -> Response {
    match state.catalog.get_counts() {
        Ok(counts) => {
            let (jar, flash) = take_flash(jar);
            let html = pages::home_page(
                &session.username,
                &counts,
                &format_uptime(state.start_time.elapsed()),
                flash.as_deref(),
            );
            (jar, Html(html)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn register_form(jar: CookieJar) -> Response {
    let (jar, flash) = take_flash(jar);
    (jar, Html(pages::register_page("", None, flash.as_deref()))).into_response()
}

async fn register(
    State(account_manager): State<GuardedAccountManager>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Response {
    match account_manager.register(&form.username, &form.password) {
        Ok(_) => {
            let jar = set_flash(jar, "Account created successfully.");
            (jar, Redirect::to(LOGIN_PATH)).into_response()
        }
        Err(err) => form_failure(err, |message| {
            pages::register_page(&form.username, Some(message), None)
        }),
    }
}

async fn login_form(jar: CookieJar) -> Response {
    let (jar, flash) = take_flash(jar);
    (jar, Html(pages::login_page("", None, flash.as_deref()))).into_response()
}

async fn login(State(state): State<ServerState>, jar: CookieJar, Form(form): Form<CredentialsForm>) -> Response {
    match state.account_manager.login(&form.username, &form.password) {
        Ok(token) => {
            info!("Account {} logged in", token.account_id);
            let jar = jar.add(session_cookie(&token.value, state.config.secure_cookies));
            let jar = set_flash(jar, "Logged in successfully.");
            (jar, Redirect::to("/")).into_response()
        }
        Err(err) => form_failure(err, |message| {
            pages::login_page(&form.username, Some(message), None)
        }),
    }
}

async fn logout(
    State(account_manager): State<GuardedAccountManager>,
    session: Session,
    jar: CookieJar,
) -> Response {
    if let Err(err) = account_manager.end_session(&session.token) {
        return err.into_response();
    }
    info!("Account {} logged out", session.account_id);
    let jar = jar.add(expired_session_cookie());
    let jar = set_flash(jar, "Logged out successfully.");
    (jar, Redirect::to(LOGIN_PATH)).into_response()
}

pub fn make_app(
    config: ServerConfig,
    catalog: Arc<CatalogService>,
    account_manager: Arc<AccountManager>,
) -> Router {
    let state = ServerState::new(config, catalog, account_manager);

    let auth_routes: Router = Router::new()
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
        .with_state(state.clone());

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    let mut app: Router = home_router
        .merge(auth_routes)
        .merge(make_catalog_routes(state.clone()));

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    app = app.layer(middleware::from_fn_with_state(state, log_requests));

    app
}

pub async fn run_server(
    config: ServerConfig,
    catalog: Arc<CatalogService>,
    account_manager: Arc<AccountManager>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, catalog, account_manager);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Ready to serve at port {}!", port);

    Ok(axum::serve(listener, app).await?)
}
