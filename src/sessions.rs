use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::{
    entities::{session, user},
    error::AppResult,
    models::now_sec,
};

pub const SESSION_COOKIE: &str = "sceneit_session";

#[derive(Clone)]
pub struct SessionStore {
    db: DatabaseConnection,
    ttl_seconds: i64,
}

impl SessionStore {
    pub fn new(db: DatabaseConnection, ttl_days: i64) -> Self {
        Self { db, ttl_seconds: ttl_days * 86_400 }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    pub async fn create(&self, user_id: i32) -> AppResult<String> {
        let now = now_sec();
        let token = uuid::Uuid::new_v4().simple().to_string();
        let model = session::ActiveModel {
            id: Set(token.clone()),
            user_id: Set(user_id),
            created_at: Set(now),
            expires_at: Set(now + self.ttl_seconds),
        };
        session::Entity::insert(model).exec_without_returning(&self.db).await?;
        Ok(token)
    }

    /// Resolves a live session to its user. Expired sessions are removed on sight.
    pub async fn user_for(&self, token: &str) -> AppResult<Option<user::Model>> {
        let Some((session, user)) = session::Entity::find_by_id(token.to_string())
            .find_also_related(user::Entity)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        if session.expires_at <= now_sec() {
            tracing::debug!(user_id = session.user_id, "session expired");
            session::Entity::delete_by_id(session.id).exec(&self.db).await?;
            return Ok(None);
        }

        Ok(user)
    }

    pub async fn destroy(&self, token: &str) -> AppResult<()> {
        session::Entity::delete_by_id(token.to_string()).exec(&self.db).await?;
        Ok(())
    }

    pub async fn purge_expired(&self) -> AppResult<u64> {
        let res = session::Entity::delete_many()
            .filter(session::Column::ExpiresAt.lte(now_sec()))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::connect_in_memory, profiles::{Profiles, tests::identity}};

    async fn store(ttl_days: i64) -> (SessionStore, user::Model) {
        let db = connect_in_memory().await;
        let user = Profiles::new(db.clone()).upsert_github_user(identity(7, "grace")).await.unwrap();
        (SessionStore::new(db, ttl_days), user)
    }

    #[tokio::test]
    async fn create_resolve_destroy() {
        let (store, user) = store(7).await;
        let token = store.create(user.id).await.unwrap();

        let found = store.user_for(&token).await.unwrap().unwrap();
        assert_eq!(found.username, "grace");
        assert!(store.user_for("not-a-token").await.unwrap().is_none());

        store.destroy(&token).await.unwrap();
        assert!(store.user_for(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_rejected_and_purged() {
        let (store, user) = store(0).await;
        let stale = store.create(user.id).await.unwrap();
        assert!(store.user_for(&stale).await.unwrap().is_none());

        store.create(user.id).await.unwrap();
        assert_eq!(store.purge_expired().await.unwrap(), 1);
    }
}
