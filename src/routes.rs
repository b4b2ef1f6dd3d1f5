use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use serde_json::{Value, json};

use crate::{
    AppState, auth,
    auth::CurrentUser,
    error::AppResult,
    models::{MovieListQuery, PublicUser, ReviewRequest, WatchlistPatch, WatchlistRequest},
    pagination::{Page, PageQuery},
    seed::{self, SeedOptions},
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/seed-database", get(seed_database))
        .route("/api/stats", get(stats))
        .route("/api/genres", get(list_genres))
        .route("/api/genres/{genre_id}/movies", get(genre_movies))
        .route("/api/movies", get(list_movies))
        .route("/api/movies/{id}", get(get_movie))
        .route("/api/users", get(list_users))
        .route("/api/user/{username}", get(get_user))
        .route("/api/{username}/reviews", get(user_reviews).post(create_review))
        .route("/api/{username}/reviews/{movie_id}", delete(delete_review))
        .route("/api/{username}/watchlist", get(user_watchlist))
        .route(
            "/api/{username}/watchlist/{movie_id}",
            post(add_to_watchlist).patch(update_watchlist).delete(remove_from_watchlist),
        )
        .route("/auth/github", get(auth::github_login))
        .route("/auth/github/callback", get(auth::github_callback))
        .route("/auth/login/success", get(auth::login_success))
        .route("/auth/logout", get(auth::logout))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "message": "Backend is running!" }))
}

async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(q): Query<MovieListQuery>,
) -> AppResult<Json<Value>> {
    let (movies, pagination) = state.catalog.list_movies(&q).await?;
    Ok(Json(json!({ "success": true, "data": movies, "pagination": pagination })))
}

async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<Value>> {
    let movie = state.catalog.get_movie(id).await?;
    Ok(Json(json!({ "success": true, "data": movie })))
}

async fn list_genres(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let genres = state.catalog.list_genres().await?;
    Ok(Json(json!({ "success": true, "count": genres.len(), "data": genres })))
}

async fn genre_movies(
    State(state): State<Arc<AppState>>,
    Path(genre_id): Path<i32>,
    Query(q): Query<PageQuery>,
) -> AppResult<Json<Value>> {
    let (genre, movies, pagination) = state.catalog.genre_movies(genre_id, Page::from(q)).await?;
    Ok(Json(json!({
        "success": true,
        "genre": genre,
        "count": movies.len(),
        "data": movies,
        "pagination": pagination,
    })))
}

async fn list_users(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let users = state.profiles.list_users().await?;
    Ok(Json(json!({ "success": true, "data": users })))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> AppResult<Json<Value>> {
    let user = state.profiles.user_by_username(&username).await?;
    Ok(Json(json!({ "success": true, "data": PublicUser::from(user) })))
}

async fn user_reviews(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> AppResult<Json<Value>> {
    let reviews = state.profiles.user_reviews(&username).await?;
    Ok(Json(json!({ "success": true, "data": reviews })))
}

async fn create_review(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(username): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> AppResult<Json<Value>> {
    current.ensure_is(&username)?;
    let review = state.profiles.upsert_review(&username, req).await?;
    Ok(Json(json!({ "success": true, "data": review })))
}

async fn delete_review(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path((username, movie_id)): Path<(String, i32)>,
) -> AppResult<Json<Value>> {
    current.ensure_is(&username)?;
    state.profiles.remove_review(&username, movie_id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn user_watchlist(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> AppResult<Json<Value>> {
    let entries = state.profiles.user_watchlist(&username).await?;
    Ok(Json(json!({ "success": true, "data": entries })))
}

async fn add_to_watchlist(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path((username, movie_id)): Path<(String, i32)>,
    Json(req): Json<WatchlistRequest>,
) -> AppResult<Json<Value>> {
    current.ensure_is(&username)?;
    let entry = state.profiles.upsert_watchlist_entry(&username, movie_id, req).await?;
    Ok(Json(json!({ "success": true, "data": entry })))
}

async fn update_watchlist(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path((username, movie_id)): Path<(String, i32)>,
    Json(patch): Json<WatchlistPatch>,
) -> AppResult<Json<Value>> {
    current.ensure_is(&username)?;
    let entry = state.profiles.update_watchlist_entry(&username, movie_id, patch).await?;
    Ok(Json(json!({ "success": true, "data": entry })))
}

async fn remove_from_watchlist(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path((username, movie_id)): Path<(String, i32)>,
) -> AppResult<Json<Value>> {
    current.ensure_is(&username)?;
    state.profiles.remove_watchlist_entry(&username, movie_id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn seed_database(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    tracing::info!(pages = state.config.seed_pages, "starting database seeding");
    let opts = SeedOptions {
        pages: state.config.seed_pages,
        page_delay: Duration::from_millis(state.config.seed_page_delay_ms),
        image_base_url: state.config.tmdb_image_base_url.clone(),
    };
    let report = seed::run(&state.catalog, &*state.tmdb, &opts).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Database seeded successfully with TMDB data",
        "report": report,
    })))
}

async fn stats(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let stats = state.catalog.stats().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}
