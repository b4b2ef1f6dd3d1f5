mod auth;
mod catalog;
mod config;
mod db;
mod entities;
mod error;
mod github;
mod models;
mod pagination;
mod profiles;
mod routes;
mod seed;
mod sessions;
mod tmdb;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method, header::CONTENT_TYPE};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    catalog::Catalog, config::Config, github::GithubOAuth, profiles::Profiles,
    sessions::SessionStore, tmdb::TmdbClient,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Catalog,
    pub profiles: Profiles,
    pub sessions: SessionStore,
    pub tmdb: Arc<TmdbClient>,
    pub github: Arc<GithubOAuth>,
}

impl AppState {
    pub fn new(config: Arc<Config>, db: sea_orm::DatabaseConnection, http: reqwest::Client) -> Self {
        let tmdb = TmdbClient::new(
            http.clone(),
            config.tmdb_access_token.clone(),
            config.tmdb_api_key.clone(),
            config.tmdb_base_url.clone(),
            config.tmdb_rps,
        );
        let github = GithubOAuth::new(http, &config);

        Self {
            catalog: Catalog::new(db.clone()),
            profiles: Profiles::new(db.clone()),
            sessions: SessionStore::new(db, config.session_ttl_days),
            tmdb: Arc::new(tmdb),
            github: Arc::new(github),
            config,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,sceneit=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let http = reqwest::Client::builder()
        .user_agent("sceneit/0.1")
        .timeout(Duration::from_secs(30))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url).await.context("database setup")?;
    let state = Arc::new(AppState::new(config.clone(), db, http));

    let purged = state.sessions.purge_expired().await.context("purging sessions")?;
    if purged > 0 {
        tracing::info!(purged, "removed expired sessions");
    }

    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_str(&config.client_url).context("CLIENT_URL")?)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    let app = routes::router(state).layer(cors).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
