use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
    sea_query::{Expr, Func, OnConflict, Query, SimpleExpr},
};

use crate::{
    entities::{genre, movie, movie_genre},
    error::{AppError, AppResult},
    models::{GenreDto, MovieListQuery, MovieWithGenres, PopularGenre, Stats, Totals},
    pagination::{Page, Pagination},
};

const POPULAR_GENRES: usize = 5;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortField {
    Title,
    ReleaseDate,
    Rating,
    Id,
}

impl SortField {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Some(SortField::Title),
            "release_date" => Some(SortField::ReleaseDate),
            "rating" | "external_avg_rating" => Some(SortField::Rating),
            "id" => Some(SortField::Id),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    fn as_order(self) -> Order {
        match self {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// Anything outside the allow-list falls back to rating descending.
pub fn resolve_sort(sort: Option<&str>, order: Option<&str>) -> (SortField, SortOrder) {
    let field = sort.map(SortField::parse).unwrap_or(Some(SortField::Rating));
    let order = order.map(SortOrder::parse).unwrap_or(Some(SortOrder::Desc));
    match (field, order) {
        (Some(field), Some(order)) => (field, order),
        _ => (SortField::Rating, SortOrder::Desc),
    }
}

fn apply_sort(
    select: Select<movie::Entity>,
    field: SortField,
    order: SortOrder,
) -> Select<movie::Entity> {
    let select = match field {
        SortField::Title => select.order_by(
            SimpleExpr::FunctionCall(Func::lower(Expr::col((movie::Entity, movie::Column::Title)))),
            order.as_order(),
        ),
        SortField::ReleaseDate => select.order_by(movie::Column::ReleaseDate, order.as_order()),
        SortField::Rating => select.order_by(movie::Column::ExternalAvgRating, order.as_order()),
        SortField::Id => return select.order_by(movie::Column::Id, order.as_order()),
    };
    select.order_by_asc(movie::Column::Id)
}

#[derive(Clone)]
pub struct Catalog {
    db: DatabaseConnection,
}

impl Catalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn list_movies(
        &self,
        q: &MovieListQuery,
    ) -> AppResult<(Vec<MovieWithGenres>, Pagination)> {
        let page = Page::new(q.page, q.limit);
        let (field, order) = resolve_sort(q.sort.as_deref(), q.order.as_deref());

        let mut select = movie::Entity::find();
        if let Some(genre_id) = q.genre_id {
            select = select.filter(
                movie::Column::Id.in_subquery(
                    Query::select()
                        .column(movie_genre::Column::MovieId)
                        .from(movie_genre::Entity)
                        .and_where(movie_genre::Column::GenreId.eq(genre_id))
                        .to_owned(),
                ),
            );
        }

        let total = select.clone().count(&self.db).await?;
        let movies = apply_sort(select, field, order)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.db)
            .await?;

        tracing::debug!(?field, ?order, total, returned = movies.len(), "listed movies");

        Ok((self.attach_genres(movies).await?, Pagination::new(page, total)))
    }

    pub async fn get_movie(&self, id: i32) -> AppResult<MovieWithGenres> {
        let movie = movie::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Movie"))?;
        let mut out = self.attach_genres(vec![movie]).await?;
        out.pop().ok_or_else(|| AppError::not_found("Movie"))
    }

    pub async fn list_genres(&self) -> AppResult<Vec<GenreDto>> {
        let genres = genre::Entity::find().order_by_asc(genre::Column::Name).all(&self.db).await?;
        Ok(genres.into_iter().map(GenreDto::from).collect())
    }

    pub async fn genre_movies(
        &self,
        genre_id: i32,
        page: Page,
    ) -> AppResult<(GenreDto, Vec<MovieWithGenres>, Pagination)> {
        let genre = genre::Entity::find_by_id(genre_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Genre"))?;

        let select = movie::Entity::find().filter(
            movie::Column::Id.in_subquery(
                Query::select()
                    .column(movie_genre::Column::MovieId)
                    .from(movie_genre::Entity)
                    .and_where(movie_genre::Column::GenreId.eq(genre_id))
                    .to_owned(),
            ),
        );

        let total = select.clone().count(&self.db).await?;
        let movies = apply_sort(select, SortField::Rating, SortOrder::Desc)
            .offset(page.offset())
            .limit(page.limit)
            .all(&self.db)
            .await?;

        Ok((genre.into(), self.attach_genres(movies).await?, Pagination::new(page, total)))
    }

    /// Loads the genres of every movie in one query and keeps the input order.
    async fn attach_genres(&self, movies: Vec<movie::Model>) -> AppResult<Vec<MovieWithGenres>> {
        let ids: Vec<i32> = movies.iter().map(|m| m.id).collect();
        let genres = self.genres_for(&ids).await?;
        Ok(movies
            .into_iter()
            .map(|m| {
                let list = genres.get(&m.id).map(Vec::as_slice).unwrap_or_default();
                MovieWithGenres::new(m, list)
            })
            .collect())
    }

    async fn genres_for(&self, movie_ids: &[i32]) -> AppResult<HashMap<i32, Vec<GenreDto>>> {
        if movie_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = movie_genre::Entity::find()
            .filter(movie_genre::Column::MovieId.is_in(movie_ids.iter().copied()))
            .find_also_related(genre::Entity)
            .all(&self.db)
            .await?;

        let mut out: HashMap<i32, Vec<GenreDto>> = HashMap::new();
        for (link, genre) in rows {
            let Some(genre) = genre else {
                continue;
            };
            out.entry(link.movie_id).or_default().push(genre.into());
        }
        for list in out.values_mut() {
            list.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            list.dedup_by_key(|g| g.id);
        }
        Ok(out)
    }

    pub async fn totals(&self) -> AppResult<Totals> {
        Ok(Totals {
            genres: genre::Entity::find().count(&self.db).await?,
            movies: movie::Entity::find().count(&self.db).await?,
            movie_genres: movie_genre::Entity::find().count(&self.db).await?,
        })
    }

    pub async fn stats(&self) -> AppResult<Stats> {
        let totals = self.totals().await?;

        let counts: Vec<(i32, i64)> = movie_genre::Entity::find()
            .select_only()
            .column(movie_genre::Column::GenreId)
            .column_as(Expr::col(movie_genre::Column::MovieId).count(), "movie_count")
            .group_by(movie_genre::Column::GenreId)
            .into_tuple()
            .all(&self.db)
            .await?;
        let counts: HashMap<i32, i64> = counts.into_iter().collect();

        let mut popular: Vec<PopularGenre> = genre::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|g| PopularGenre {
                movie_count: counts.get(&g.id).copied().unwrap_or(0),
                id: g.id,
                name: g.name,
            })
            .collect();
        popular.sort_by(|a, b| b.movie_count.cmp(&a.movie_count).then_with(|| a.name.cmp(&b.name)));
        popular.truncate(POPULAR_GENRES);

        Ok(Stats {
            total_genres: totals.genres,
            total_movies: totals.movies,
            total_relations: totals.movie_genres,
            popular_genres: popular,
        })
    }

    pub async fn upsert_genre(&self, id: i32, name: &str) -> AppResult<()> {
        let model = genre::ActiveModel { id: Set(id), name: Set(name.to_string()) };

        genre::Entity::insert(model)
            .on_conflict(
                OnConflict::column(genre::Column::Id)
                    .update_column(genre::Column::Name)
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    pub async fn upsert_movie(&self, movie: movie::Model) -> AppResult<()> {
        let model = movie::ActiveModel {
            id: Set(movie.id),
            title: Set(movie.title),
            release_date: Set(movie.release_date),
            overview: Set(movie.overview),
            img_path: Set(movie.img_path),
            external_avg_rating: Set(movie.external_avg_rating),
        };

        movie::Entity::insert(model)
            .on_conflict(
                OnConflict::column(movie::Column::Id)
                    .update_columns([
                        movie::Column::Title,
                        movie::Column::ReleaseDate,
                        movie::Column::Overview,
                        movie::Column::ImgPath,
                        movie::Column::ExternalAvgRating,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    /// Returns false when the link already existed.
    pub async fn link_genre(&self, movie_id: i32, genre_id: i32) -> AppResult<bool> {
        let model = movie_genre::ActiveModel { movie_id: Set(movie_id), genre_id: Set(genre_id) };

        let inserted = movie_genre::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([movie_genre::Column::MovieId, movie_genre::Column::GenreId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(inserted > 0)
    }
}
