use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250101_000001_create_catalog::Movies;

const WATCH_STATUSES: [&str; 3] = ["not_watched", "watching", "watched"];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(big_integer(Users::GithubId).unique_key())
                    .col(string_uniq(Users::Username))
                    .col(string_null(Users::AvatarUrl))
                    .col(string(Users::AccessToken))
                    .col(big_integer(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserReviews::Table)
                    .if_not_exists()
                    .col(pk_auto(UserReviews::Id))
                    .col(integer(UserReviews::UserId))
                    .col(integer(UserReviews::MovieId))
                    .col(integer_null(UserReviews::Rating))
                    .col(text_null(UserReviews::ReviewText))
                    .col(big_integer(UserReviews::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_reviews_user")
                            .from(UserReviews::Table, UserReviews::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_reviews_movie")
                            .from(UserReviews::Table, UserReviews::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_reviews_user_movie")
                    .table(UserReviews::Table)
                    .col(UserReviews::UserId)
                    .col(UserReviews::MovieId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WatchlistEntries::Table)
                    .if_not_exists()
                    .col(pk_auto(WatchlistEntries::Id))
                    .col(integer(WatchlistEntries::UserId))
                    .col(integer(WatchlistEntries::MovieId))
                    .col(
                        string(WatchlistEntries::Status)
                            .check(Expr::col(WatchlistEntries::Status).is_in(WATCH_STATUSES)),
                    )
                    .col(integer_null(WatchlistEntries::Priority))
                    .col(big_integer(WatchlistEntries::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watchlist_entries_user")
                            .from(WatchlistEntries::Table, WatchlistEntries::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watchlist_entries_movie")
                            .from(WatchlistEntries::Table, WatchlistEntries::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_watchlist_entries_user_movie")
                    .table(WatchlistEntries::Table)
                    .col(WatchlistEntries::UserId)
                    .col(WatchlistEntries::MovieId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(WatchlistEntries::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(UserReviews::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    GithubId,
    Username,
    AvatarUrl,
    AccessToken,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserReviews {
    Table,
    Id,
    UserId,
    MovieId,
    Rating,
    ReviewText,
    CreatedAt,
}

#[derive(DeriveIden)]
enum WatchlistEntries {
    Table,
    Id,
    UserId,
    MovieId,
    Status,
    Priority,
    CreatedAt,
}
