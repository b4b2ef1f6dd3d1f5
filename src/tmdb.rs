use std::{num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::{Deserialize, de::DeserializeOwned};

use crate::error::AppResult;

#[derive(Clone, Debug, Deserialize)]
pub struct CatalogGenre {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CatalogMovie {
    pub id: i32,
    pub title: String,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CatalogPage {
    pub page: u32,
    pub total_pages: u32,
    pub results: Vec<CatalogMovie>,
}

/// Source of genre and movie listings for the seeder.
pub trait CatalogProvider {
    fn genres(&self) -> impl Future<Output = AppResult<Vec<CatalogGenre>>> + Send;

    fn popular_movies(&self, page: u32) -> impl Future<Output = AppResult<CatalogPage>> + Send;
}

pub struct TmdbClient {
    client: reqwest::Client,
    access_token: String,
    api_key: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(
        client: reqwest::Client,
        access_token: String,
        api_key: String,
        base_url: String,
        rps: u32,
    ) -> Self {
        if access_token.trim().is_empty() && api_key.trim().is_empty() {
            tracing::warn!("no TMDB_ACCESS_TOKEN or TMDB_API_KEY provided, seeding is disabled");
        }

        let quota = Quota::per_second(NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        Self { client, access_token, api_key, base_url, limiter }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> AppResult<T> {
        let token = self.access_token.trim();
        let key = self.api_key.trim();
        if token.is_empty() && key.is_empty() {
            return Err(anyhow::anyhow!("TMDB credentials not configured").into());
        }

        self.limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let mut req = self.client.get(url).query(query);
        req = if token.is_empty() {
            req.query(&[("api_key", key)])
        } else {
            req.bearer_auth(token)
        };

        Ok(req.send().await?.error_for_status()?.json().await?)
    }
}

impl CatalogProvider for TmdbClient {
    async fn genres(&self) -> AppResult<Vec<CatalogGenre>> {
        let resp: GenreListResponse = self.get("genre/movie/list", &[]).await?;
        Ok(resp.genres)
    }

    async fn popular_movies(&self, page: u32) -> AppResult<CatalogPage> {
        self.get("movie/popular", &[("page", page.to_string())]).await
    }
}

#[derive(Debug, Deserialize)]
struct GenreListResponse {
    genres: Vec<CatalogGenre>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popular_page_tolerates_missing_fields() {
        let page: CatalogPage = serde_json::from_str(
            r#"{
                "page": 1,
                "total_pages": 500,
                "results": [
                    {"id": 550, "title": "Fight Club", "release_date": "1999-10-15",
                     "poster_path": "/a.jpg", "vote_average": 8.4, "genre_ids": [18]},
                    {"id": 551, "title": "Untitled", "release_date": ""}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].genre_ids, vec![18]);
        assert!(page.results[1].genre_ids.is_empty());
        assert_eq!(page.results[1].vote_average, None);
    }

    #[tokio::test]
    async fn refuses_without_credentials() {
        let client = TmdbClient::new(
            reqwest::Client::new(),
            String::new(),
            String::new(),
            "http://127.0.0.1:9".to_string(),
            4,
        );
        assert!(client.genres().await.is_err());
    }
}
