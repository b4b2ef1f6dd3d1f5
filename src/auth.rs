use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequestParts, Query, State},
    http::request::Parts,
    response::Redirect,
};
use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState,
    entities::user,
    error::{AppError, AppResult},
    models::PublicUser,
    sessions::SESSION_COOKIE,
};

const STATE_COOKIE: &str = "sceneit_oauth_state";
const STATE_TTL_SECONDS: i64 = 600;

/// The user behind the request's session cookie. Rejects with 401 when there
/// is no live session.
pub struct CurrentUser(pub user::Model);

impl CurrentUser {
    pub fn ensure_is(&self, username: &str) -> AppResult<()> {
        if self.0.username == username { Ok(()) } else { Err(AppError::Forbidden) }
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
            return Err(AppError::Unauthorized);
        };
        state.sessions.user_for(&token).await?.map(CurrentUser).ok_or(AppError::Unauthorized)
    }
}

fn build_cookie(
    state: &AppState,
    name: &'static str,
    value: String,
    max_age: i64,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(state.config.client_url.starts_with("https://"))
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age))
        .build()
}

pub async fn github_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let csrf = uuid::Uuid::new_v4().simple().to_string();
    let url = state.github.authorize_url(&csrf);
    let jar = jar.add(build_cookie(&state, STATE_COOKIE, csrf, STATE_TTL_SECONDS));
    (jar, Redirect::to(&url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: String,
    state: String,
}

pub async fn github_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(q): Query<CallbackQuery>,
) -> AppResult<(CookieJar, Redirect)> {
    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    if expected.as_deref() != Some(q.state.as_str()) {
        return Err(AppError::BadRequest("invalid OAuth state".to_string()));
    }

    let access_token = state.github.exchange_code(&q.code).await?;
    let identity = state.github.fetch_identity(access_token).await?;
    let user = state.profiles.upsert_github_user(identity).await?;
    let token = state.sessions.create(user.id).await?;

    tracing::info!(username = %user.username, user_id = user.id, "user logged in");

    let jar = jar
        .remove(Cookie::build(STATE_COOKIE).path("/"))
        .add(build_cookie(&state, SESSION_COOKIE, token, state.sessions.ttl_seconds()));
    Ok((jar, Redirect::to(&state.config.client_url)))
}

pub async fn login_success(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({ "success": true, "user": PublicUser::from(user) }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    if let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        state.sessions.destroy(&token).await?;
        tracing::info!("user logged out");
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Json(json!({ "success": true }))))
}
