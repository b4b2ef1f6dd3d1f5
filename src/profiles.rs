use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};

use crate::{
    entities::{movie, review, user, watchlist_entry},
    error::{AppError, AppResult},
    models::{
        MovieSummary, PublicUser, ReviewRequest, ReviewWithMovie, WatchlistEntryWithMovie,
        WatchlistPatch, WatchlistRequest, now_sec,
    },
};

const RATING_RANGE: std::ops::RangeInclusive<i32> = 1..=10;

/// First path segments under `/api/` that static routes already claim.
const RESERVED_USERNAMES: [&str; 5] = ["genres", "movies", "stats", "user", "users"];

fn routable_username(login: &str, github_id: i64) -> String {
    if RESERVED_USERNAMES.iter().any(|r| r.eq_ignore_ascii_case(login)) {
        format!("{login}-{github_id}")
    } else {
        login.to_string()
    }
}

/// The identity GitHub reports for a freshly authorized login.
#[derive(Clone, Debug)]
pub struct GithubIdentity {
    pub github_id: i64,
    pub username: String,
    pub avatar_url: Option<String>,
    pub access_token: String,
}

#[derive(Clone)]
pub struct Profiles {
    db: DatabaseConnection,
}

impl Profiles {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_users(&self) -> AppResult<Vec<PublicUser>> {
        let users = user::Entity::find().order_by_asc(user::Column::Username).all(&self.db).await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    pub async fn user_by_username(&self, username: &str) -> AppResult<user::Model> {
        user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Creates the user on first login and refreshes profile fields and token after that.
    ///
    /// GitHub logins can be renamed and later claimed by another account. A
    /// stored row still holding the name is moved aside to `<name>-<github_id>`.
    pub async fn upsert_github_user(&self, identity: GithubIdentity) -> AppResult<user::Model> {
        let username = routable_username(&identity.username, identity.github_id);

        if let Some(stale) = user::Entity::find()
            .filter(user::Column::Username.eq(&username))
            .filter(user::Column::GithubId.ne(identity.github_id))
            .one(&self.db)
            .await?
        {
            let moved = format!("{}-{}", stale.username, stale.github_id);
            tracing::warn!(
                from = %stale.username,
                to = %moved,
                "username reassigned on GitHub, renaming stale user"
            );
            let mut active: user::ActiveModel = stale.into();
            active.username = Set(moved);
            active.update(&self.db).await?;
        }

        let model = user::ActiveModel {
            github_id: Set(identity.github_id),
            username: Set(username),
            avatar_url: Set(identity.avatar_url),
            access_token: Set(identity.access_token),
            created_at: Set(now_sec()),
            ..Default::default()
        };

        user::Entity::insert(model)
            .on_conflict(
                OnConflict::column(user::Column::GithubId)
                    .update_columns([
                        user::Column::Username,
                        user::Column::AvatarUrl,
                        user::Column::AccessToken,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        user::Entity::find()
            .filter(user::Column::GithubId.eq(identity.github_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user vanished after upsert")))
    }

    pub async fn user_reviews(&self, username: &str) -> AppResult<Vec<ReviewWithMovie>> {
        let user = self.user_by_username(username).await?;
        let reviews = review::Entity::find()
            .filter(review::Column::UserId.eq(user.id))
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id)
            .all(&self.db)
            .await?;

        let ids: Vec<i32> = reviews.iter().map(|r| r.movie_id).collect();
        let movies = self.movie_summaries(&ids).await?;
        Ok(reviews
            .into_iter()
            .map(|r| {
                let movie = movies.get(&r.movie_id).cloned();
                ReviewWithMovie::new(r, movie)
            })
            .collect())
    }

    /// One review per user and movie; posting again replaces rating and text and
    /// moves the review to the top of the newest-first listing.
    pub async fn upsert_review(
        &self,
        username: &str,
        req: ReviewRequest,
    ) -> AppResult<ReviewWithMovie> {
        if let Some(rating) = req.rating {
            if !RATING_RANGE.contains(&rating) {
                return Err(AppError::BadRequest(format!(
                    "rating must be between {} and {}",
                    RATING_RANGE.start(),
                    RATING_RANGE.end()
                )));
            }
        }

        let user = self.user_by_username(username).await?;
        let movie = self.movie(req.movie_id).await?;

        let model = review::ActiveModel {
            user_id: Set(user.id),
            movie_id: Set(movie.id),
            rating: Set(req.rating),
            review_text: Set(req.review_text),
            created_at: Set(now_sec()),
            ..Default::default()
        };

        review::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([review::Column::UserId, review::Column::MovieId])
                    .update_columns([
                        review::Column::Rating,
                        review::Column::ReviewText,
                        review::Column::CreatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        let saved = review::Entity::find()
            .filter(review::Column::UserId.eq(user.id))
            .filter(review::Column::MovieId.eq(movie.id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("review vanished after upsert")))?;

        tracing::info!(username = %user.username, movie_id = movie.id, "saved review");
        Ok(ReviewWithMovie::new(saved, Some(movie.into())))
    }

    pub async fn remove_review(&self, username: &str, movie_id: i32) -> AppResult<()> {
        let user = self.user_by_username(username).await?;
        let res = review::Entity::delete_many()
            .filter(review::Column::UserId.eq(user.id))
            .filter(review::Column::MovieId.eq(movie_id))
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::not_found("Review"));
        }
        Ok(())
    }

    /// Entries with a priority come first, lowest priority value first.
    pub async fn user_watchlist(&self, username: &str) -> AppResult<Vec<WatchlistEntryWithMovie>> {
        let user = self.user_by_username(username).await?;
        let mut entries = watchlist_entry::Entity::find()
            .filter(watchlist_entry::Column::UserId.eq(user.id))
            .all(&self.db)
            .await?;
        entries.sort_by_key(|e| (e.priority.is_none(), e.priority, e.created_at, e.id));

        let ids: Vec<i32> = entries.iter().map(|e| e.movie_id).collect();
        let movies = self.movie_summaries(&ids).await?;
        Ok(entries
            .into_iter()
            .map(|e| {
                let movie = movies.get(&e.movie_id).cloned();
                WatchlistEntryWithMovie::new(e, movie)
            })
            .collect())
    }

    pub async fn upsert_watchlist_entry(
        &self,
        username: &str,
        movie_id: i32,
        req: WatchlistRequest,
    ) -> AppResult<WatchlistEntryWithMovie> {
        let user = self.user_by_username(username).await?;
        let movie = self.movie(movie_id).await?;

        let model = watchlist_entry::ActiveModel {
            user_id: Set(user.id),
            movie_id: Set(movie.id),
            status: Set(req.status),
            priority: Set(req.priority),
            created_at: Set(now_sec()),
            ..Default::default()
        };

        watchlist_entry::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    watchlist_entry::Column::UserId,
                    watchlist_entry::Column::MovieId,
                ])
                .update_columns([watchlist_entry::Column::Status, watchlist_entry::Column::Priority])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        let saved = self.watchlist_entry(user.id, movie.id).await?;
        tracing::info!(username = %user.username, movie_id, status = ?saved.status, "saved watchlist entry");
        Ok(WatchlistEntryWithMovie::new(saved, Some(movie.into())))
    }

    pub async fn update_watchlist_entry(
        &self,
        username: &str,
        movie_id: i32,
        patch: WatchlistPatch,
    ) -> AppResult<WatchlistEntryWithMovie> {
        if patch.status.is_none() && patch.priority.is_none() {
            return Err(AppError::BadRequest("nothing to update".to_string()));
        }

        let user = self.user_by_username(username).await?;
        let entry = self.watchlist_entry(user.id, movie_id).await?;

        let mut active: watchlist_entry::ActiveModel = entry.into();
        if let Some(status) = patch.status {
            active.status = Set(status);
        }
        if let Some(priority) = patch.priority {
            active.priority = Set(priority);
        }
        let updated = active.update(&self.db).await?;

        let movie = match self.movie(movie_id).await {
            Ok(movie) => Some(MovieSummary::from(movie)),
            Err(AppError::NotFound(_)) => None,
            Err(err) => return Err(err),
        };
        Ok(WatchlistEntryWithMovie::new(updated, movie))
    }

    pub async fn remove_watchlist_entry(&self, username: &str, movie_id: i32) -> AppResult<()> {
        let user = self.user_by_username(username).await?;
        let res = watchlist_entry::Entity::delete_many()
            .filter(watchlist_entry::Column::UserId.eq(user.id))
            .filter(watchlist_entry::Column::MovieId.eq(movie_id))
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::not_found("Watchlist entry"));
        }
        Ok(())
    }

    async fn watchlist_entry(&self, user_id: i32, movie_id: i32) -> AppResult<watchlist_entry::Model> {
        watchlist_entry::Entity::find()
            .filter(watchlist_entry::Column::UserId.eq(user_id))
            .filter(watchlist_entry::Column::MovieId.eq(movie_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Watchlist entry"))
    }

    async fn movie(&self, id: i32) -> AppResult<movie::Model> {
        movie::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Movie"))
    }

    async fn movie_summaries(&self, ids: &[i32]) -> AppResult<HashMap<i32, MovieSummary>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let movies = movie::Entity::find()
            .filter(movie::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await?;
        Ok(movies.into_iter().map(|m| (m.id, MovieSummary::from(m))).collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use sea_orm::sea_query::Expr;

    use super::*;
    use crate::{catalog::tests::fixture, entities::watchlist_entry::WatchStatus};

    pub(crate) fn identity(github_id: i64, username: &str) -> GithubIdentity {
        GithubIdentity {
            github_id,
            username: username.to_string(),
            avatar_url: Some(format!("https://avatars.example/{username}.png")),
            access_token: format!("token-{github_id}"),
        }
    }

    async fn profiles() -> Profiles {
        let catalog = fixture().await;
        let profiles = Profiles::new(catalog.db().clone());
        profiles.upsert_github_user(identity(101, "ada")).await.unwrap();
        profiles
    }

    fn review(movie_id: i32, rating: Option<i32>, text: &str) -> ReviewRequest {
        ReviewRequest { movie_id, rating, review_text: Some(text.to_string()) }
    }

    #[tokio::test]
    async fn github_login_refreshes_existing_user() {
        let profiles = profiles().await;
        let first = profiles.user_by_username("ada").await.unwrap();

        let mut renamed = identity(101, "ada-l");
        renamed.access_token = "fresh".to_string();
        let second = profiles.upsert_github_user(renamed).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.username, "ada-l");
        assert_eq!(second.access_token, "fresh");
        assert_eq!(profiles.list_users().await.unwrap().len(), 1);
        assert!(matches!(profiles.user_by_username("ada").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn reassigned_github_login_moves_stale_user_aside() {
        let profiles = profiles().await;
        let original = profiles.user_by_username("ada").await.unwrap();

        let newcomer = profiles.upsert_github_user(identity(202, "ada")).await.unwrap();
        assert_eq!(newcomer.username, "ada");
        assert_eq!(newcomer.github_id, 202);

        let moved = profiles.user_by_username("ada-101").await.unwrap();
        assert_eq!(moved.id, original.id);
        assert_eq!(profiles.list_users().await.unwrap().len(), 2);

        // the original account can still log in under its stored row
        let back = profiles.upsert_github_user(identity(101, "ada-101")).await.unwrap();
        assert_eq!(back.id, original.id);
    }

    #[tokio::test]
    async fn logins_matching_api_routes_get_suffixed() {
        let profiles = profiles().await;
        for (id, login) in [(7, "movies"), (8, "Genres"), (9, "user")] {
            let saved = profiles.upsert_github_user(identity(id, login)).await.unwrap();
            assert_eq!(saved.username, format!("{login}-{id}"));
        }
        let plain = profiles.upsert_github_user(identity(10, "moviesbuff")).await.unwrap();
        assert_eq!(plain.username, "moviesbuff");
    }

    #[tokio::test]
    async fn second_review_overwrites_first() {
        let profiles = profiles().await;
        profiles.upsert_review("ada", review(2, Some(6), "fine")).await.unwrap();
        profiles.upsert_review("ada", review(3, Some(7), "solid")).await.unwrap();

        // age both rows so the rewrite below is strictly newer
        review::Entity::update_many()
            .col_expr(review::Column::CreatedAt, Expr::value(now_sec() - 3600))
            .exec(&profiles.db)
            .await
            .unwrap();

        let saved = profiles.upsert_review("ada", review(2, Some(9), "grew on me")).await.unwrap();
        assert_eq!(saved.rating, Some(9));

        let reviews = profiles.user_reviews("ada").await.unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews.iter().map(|r| r.movie_id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(reviews[0].review_text.as_deref(), Some("grew on me"));
        assert_eq!(reviews[0].movie.as_ref().map(|m| m.title.as_str()), Some("Apple Pie"));
    }

    #[tokio::test]
    async fn review_validation() {
        let profiles = profiles().await;
        assert!(matches!(
            profiles.upsert_review("ada", review(2, Some(11), "too much")).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            profiles.upsert_review("ada", review(999, Some(5), "ghost")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            profiles.upsert_review("nobody", review(2, Some(5), "who")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(profiles.user_reviews("nobody").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn remove_review() {
        let profiles = profiles().await;
        profiles.upsert_review("ada", review(3, None, "meh")).await.unwrap();
        profiles.remove_review("ada", 3).await.unwrap();
        assert!(profiles.user_reviews("ada").await.unwrap().is_empty());
        assert!(matches!(profiles.remove_review("ada", 3).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn watchlist_upsert_patch_and_order() {
        let profiles = profiles().await;
        let req = |status, priority| WatchlistRequest { status, priority };

        profiles.upsert_watchlist_entry("ada", 1, req(WatchStatus::NotWatched, None)).await.unwrap();
        profiles.upsert_watchlist_entry("ada", 2, req(WatchStatus::NotWatched, Some(2))).await.unwrap();
        profiles.upsert_watchlist_entry("ada", 3, req(WatchStatus::Watching, Some(1))).await.unwrap();
        profiles.upsert_watchlist_entry("ada", 2, req(WatchStatus::Watching, Some(2))).await.unwrap();

        let list = profiles.user_watchlist("ada").await.unwrap();
        assert_eq!(list.iter().map(|e| e.movie_id).collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(list[1].status, WatchStatus::Watching);

        let patched = profiles
            .update_watchlist_entry(
                "ada",
                1,
                WatchlistPatch { status: Some(WatchStatus::Watched), priority: None },
            )
            .await
            .unwrap();
        assert_eq!(patched.status, WatchStatus::Watched);
        assert_eq!(patched.priority, None);
        assert_eq!(patched.movie.as_ref().map(|m| m.id), Some(1));

        let cleared = profiles
            .update_watchlist_entry("ada", 2, WatchlistPatch { status: None, priority: Some(None) })
            .await
            .unwrap();
        assert_eq!(cleared.priority, None);
        assert_eq!(cleared.status, WatchStatus::Watching);

        assert!(matches!(
            profiles.update_watchlist_entry("ada", 4, WatchlistPatch::default()).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            profiles
                .update_watchlist_entry(
                    "ada",
                    4,
                    WatchlistPatch { status: Some(WatchStatus::Watched), priority: None }
                )
                .await,
            Err(AppError::NotFound(_))
        ));

        profiles.remove_watchlist_entry("ada", 1).await.unwrap();
        let list = profiles.user_watchlist("ada").await.unwrap();
        assert_eq!(list.iter().map(|e| e.movie_id).collect::<Vec<_>>(), vec![3, 2]);
    }
}
