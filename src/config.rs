use std::net::SocketAddr;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub tmdb_access_token: String,
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub tmdb_image_base_url: String,
    pub tmdb_rps: u32,
    pub seed_pages: u32,
    pub seed_page_delay_ms: u64,
    pub github_client_id: String,
    pub github_client_secret: String,
    pub github_callback_url: String,
    pub client_url: String,
    pub session_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3001".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://sceneit.db?mode=rwc".to_string());

        let tmdb_access_token = std::env::var("TMDB_ACCESS_TOKEN").unwrap_or_default();
        let tmdb_api_key = std::env::var("TMDB_API_KEY").unwrap_or_default();
        let tmdb_base_url = std::env::var("TMDB_BASE_URL")
            .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string());
        let tmdb_image_base_url = std::env::var("TMDB_IMAGE_BASE_URL")
            .unwrap_or_else(|_| "https://image.tmdb.org/t/p/w500".to_string());

        let tmdb_rps: u32 =
            std::env::var("TMDB_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(4);

        let seed_pages: u32 =
            std::env::var("SEED_PAGES").ok().and_then(|s| s.parse().ok()).unwrap_or(10);

        let seed_page_delay_ms: u64 =
            std::env::var("SEED_PAGE_DELAY_MS").ok().and_then(|s| s.parse().ok()).unwrap_or(250);

        let github_client_id = std::env::var("GITHUB_CLIENT_ID").unwrap_or_default();
        let github_client_secret = std::env::var("GITHUB_CLIENT_SECRET").unwrap_or_default();
        let github_callback_url = std::env::var("GITHUB_CALLBACK_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}/auth/github/callback"));

        let client_url =
            std::env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let session_ttl_days: i64 =
            std::env::var("SESSION_TTL_DAYS").ok().and_then(|s| s.parse().ok()).unwrap_or(7);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            tmdb_access_token,
            tmdb_api_key,
            tmdb_base_url,
            tmdb_image_base_url,
            tmdb_rps,
            seed_pages,
            seed_page_delay_ms,
            github_client_id,
            github_client_secret,
            github_callback_url,
            client_url: client_url.trim_end_matches('/').to_string(),
            session_ttl_days,
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 0).into(),
            database_url: "sqlite::memory:".to_string(),
            tmdb_access_token: String::new(),
            tmdb_api_key: String::new(),
            tmdb_base_url: "http://127.0.0.1:9".to_string(),
            tmdb_image_base_url: "https://image.tmdb.org/t/p/w500".to_string(),
            tmdb_rps: 100,
            seed_pages: 1,
            seed_page_delay_ms: 0,
            github_client_id: "client-id".to_string(),
            github_client_secret: "client-secret".to_string(),
            github_callback_url: "http://localhost:3001/auth/github/callback".to_string(),
            client_url: "http://localhost:5173".to_string(),
            session_ttl_days: 7,
        }
    }
}
