use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};

use crate::entities::{genre, movie, review, user, watchlist_entry, watchlist_entry::WatchStatus};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieWithGenres {
    pub id: i32,
    pub title: String,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub img_path: Option<String>,
    pub external_avg_rating: Option<f64>,
    pub genres: Vec<String>,
    pub genre_ids: Vec<i32>,
}

impl MovieWithGenres {
    /// `genres` must already be sorted by name and free of duplicates.
    pub fn new(m: movie::Model, genres: &[GenreDto]) -> Self {
        Self {
            id: m.id,
            title: m.title,
            release_date: m.release_date,
            overview: m.overview,
            img_path: m.img_path,
            external_avg_rating: m.external_avg_rating,
            genres: genres.iter().map(|g| g.name.clone()).collect(),
            genre_ids: genres.iter().map(|g| g.id).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieSummary {
    pub id: i32,
    pub title: String,
    pub release_date: Option<String>,
    pub img_path: Option<String>,
    pub external_avg_rating: Option<f64>,
}

impl From<movie::Model> for MovieSummary {
    fn from(m: movie::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            release_date: m.release_date,
            img_path: m.img_path,
            external_avg_rating: m.external_avg_rating,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GenreDto {
    pub id: i32,
    pub name: String,
}

impl From<genre::Model> for GenreDto {
    fn from(g: genre::Model) -> Self {
        Self { id: g.id, name: g.name }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MovieListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub genre_id: Option<i32>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PublicUser {
    pub id: i32,
    pub username: String,
    #[serde(rename = "avatarurl")]
    pub avatar_url: Option<String>,
}

impl From<user::Model> for PublicUser {
    fn from(u: user::Model) -> Self {
        Self { id: u.id, username: u.username, avatar_url: u.avatar_url }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewWithMovie {
    pub id: i32,
    pub user_id: i32,
    pub movie_id: i32,
    pub rating: Option<i32>,
    pub review_text: Option<String>,
    pub created_at: Timestamp,
    pub movie: Option<MovieSummary>,
}

impl ReviewWithMovie {
    pub fn new(r: review::Model, movie: Option<MovieSummary>) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            movie_id: r.movie_id,
            rating: r.rating,
            review_text: r.review_text,
            created_at: timestamp(r.created_at),
            movie,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WatchlistEntryWithMovie {
    pub id: i32,
    pub user_id: i32,
    pub movie_id: i32,
    pub status: WatchStatus,
    pub priority: Option<i32>,
    pub created_at: Timestamp,
    pub movie: Option<MovieSummary>,
}

impl WatchlistEntryWithMovie {
    pub fn new(e: watchlist_entry::Model, movie: Option<MovieSummary>) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            movie_id: e.movie_id,
            status: e.status,
            priority: e.priority,
            created_at: timestamp(e.created_at),
            movie,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReviewRequest {
    pub movie_id: i32,
    pub rating: Option<i32>,
    pub review_text: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WatchlistRequest {
    pub status: WatchStatus,
    pub priority: Option<i32>,
}

/// `priority` is `None` when absent and `Some(None)` for an explicit `null`,
/// which clears it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct WatchlistPatch {
    pub status: Option<WatchStatus>,
    #[serde(default, deserialize_with = "present")]
    pub priority: Option<Option<i32>>,
}

fn present<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularGenre {
    pub id: i32,
    pub name: String,
    pub movie_count: i64,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_genres: u64,
    pub total_movies: u64,
    pub total_relations: u64,
    pub popular_genres: Vec<PopularGenre>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub genres: u64,
    pub movies: u64,
    pub movie_genres: u64,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub genres_upserted: u64,
    pub movies_upserted: u64,
    pub relations_linked: u64,
    pub skipped: u64,
    pub totals: Totals,
}

pub fn timestamp(secs: i64) -> Timestamp {
    Timestamp::from_second(secs).unwrap_or(Timestamp::UNIX_EPOCH)
}

pub fn now_sec() -> i64 {
    Timestamp::now().as_second()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watchlist_patch_tells_null_from_absent() {
        let absent: WatchlistPatch = serde_json::from_str(r#"{"status":"watched"}"#).unwrap();
        assert_eq!(absent.priority, None);

        let cleared: WatchlistPatch = serde_json::from_str(r#"{"priority":null}"#).unwrap();
        assert_eq!(cleared.priority, Some(None));

        let set: WatchlistPatch = serde_json::from_str(r#"{"priority":3}"#).unwrap();
        assert_eq!(set.priority, Some(Some(3)));
    }
}
