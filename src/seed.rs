use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    catalog::Catalog,
    entities::movie,
    error::AppResult,
    models::SeedReport,
    tmdb::{CatalogMovie, CatalogProvider},
};

#[derive(Clone, Debug)]
pub struct SeedOptions {
    pub pages: u32,
    pub page_delay: Duration,
    pub image_base_url: String,
}

/// Imports genres and popular movies, keyed by the provider's ids so that a
/// rerun updates rows in place.
pub async fn run<P: CatalogProvider>(
    catalog: &Catalog,
    provider: &P,
    opts: &SeedOptions,
) -> AppResult<SeedReport> {
    let started = std::time::Instant::now();
    let mut report = SeedReport::default();

    let genres = provider.genres().await?;
    debug!(count = genres.len(), "fetched genres");

    for genre in genres {
        match catalog.upsert_genre(genre.id, genre.name.trim()).await {
            Ok(()) => report.genres_upserted += 1,
            Err(err) => {
                warn!(genre_id = genre.id, name = %genre.name, error = %err, "failed to upsert genre");
                report.skipped += 1;
            },
        }
    }

    for page in 1..=opts.pages {
        debug!(page, pages = opts.pages, "requesting popular movies page");
        let listing = match provider.popular_movies(page).await {
            Ok(listing) => listing,
            Err(err) => {
                warn!(page, error = %err, "failed to fetch page, stopping");
                break;
            },
        };
        debug!(
            page = listing.page,
            total_pages = listing.total_pages,
            results = listing.results.len(),
            "fetched popular movies page"
        );

        for film in listing.results {
            let movie_id = film.id;
            let genre_ids = film.genre_ids.clone();
            if let Err(err) = catalog.upsert_movie(to_movie(film, &opts.image_base_url)).await {
                warn!(movie_id, error = %err, "failed to upsert movie");
                report.skipped += 1;
                continue;
            }
            report.movies_upserted += 1;

            for genre_id in genre_ids {
                match catalog.link_genre(movie_id, genre_id).await {
                    Ok(true) => report.relations_linked += 1,
                    Ok(false) => {},
                    Err(err) => {
                        warn!(movie_id, genre_id, error = %err, "failed to link genre");
                        report.skipped += 1;
                    },
                }
            }
        }

        if page >= listing.total_pages {
            break;
        }
        if page < opts.pages && !opts.page_delay.is_zero() {
            tokio::time::sleep(opts.page_delay).await;
        }
    }

    report.totals = catalog.totals().await?;

    info!(
        genres = report.totals.genres,
        movies = report.totals.movies,
        movie_genres = report.totals.movie_genres,
        skipped = report.skipped,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "seeding finished"
    );

    Ok(report)
}

fn to_movie(film: CatalogMovie, image_base_url: &str) -> movie::Model {
    movie::Model {
        id: film.id,
        title: film.title.trim().to_string(),
        release_date: film.release_date.as_deref().and_then(normalize_date),
        overview: film.overview.filter(|s| !s.trim().is_empty()),
        img_path: film
            .poster_path
            .filter(|p| !p.trim().is_empty())
            .map(|p| format!("{}{}", image_base_url.trim_end_matches('/'), p)),
        external_avg_rating: film.vote_average,
    }
}

/// The provider sends `""` for unknown dates; anything unparseable is dropped.
fn normalize_date(raw: &str) -> Option<String> {
    raw.trim().parse::<jiff::civil::Date>().ok().map(|d| d.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::{
        db::connect_in_memory,
        error::AppError,
        tmdb::{CatalogGenre, CatalogPage},
    };

    struct FakeProvider {
        genres: Vec<CatalogGenre>,
        pages: Vec<Vec<CatalogMovie>>,
        advertised_pages: u32,
        fail_genres: bool,
        calls: AtomicU32,
    }

    impl FakeProvider {
        fn new(genres: &[(i32, &str)], pages: Vec<Vec<CatalogMovie>>) -> Self {
            Self {
                genres: genres
                    .iter()
                    .map(|(id, name)| CatalogGenre { id: *id, name: name.to_string() })
                    .collect(),
                advertised_pages: pages.len() as u32,
                pages,
                fail_genres: false,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl CatalogProvider for FakeProvider {
        async fn genres(&self) -> AppResult<Vec<CatalogGenre>> {
            if self.fail_genres {
                return Err(AppError::Internal(anyhow::anyhow!("provider unreachable")));
            }
            Ok(self.genres.clone())
        }

        async fn popular_movies(&self, page: u32) -> AppResult<CatalogPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let results = self
                .pages
                .get(page as usize - 1)
                .cloned()
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("page {page} unavailable")))?;
            Ok(CatalogPage { page, total_pages: self.advertised_pages, results })
        }
    }

    fn film(id: i32, title: &str, genre_ids: &[i32]) -> CatalogMovie {
        CatalogMovie {
            id,
            title: title.to_string(),
            release_date: Some("2024-02-29".to_string()),
            overview: Some("An overview".to_string()),
            poster_path: Some("/poster.jpg".to_string()),
            vote_average: Some(7.25),
            genre_ids: genre_ids.to_vec(),
        }
    }

    fn opts(pages: u32) -> SeedOptions {
        SeedOptions {
            pages,
            page_delay: Duration::ZERO,
            image_base_url: "https://image.tmdb.org/t/p/w500".to_string(),
        }
    }

    #[tokio::test]
    async fn seeding_twice_is_idempotent() {
        let catalog = Catalog::new(connect_in_memory().await);
        let provider =
            FakeProvider::new(&[(1, "Action"), (2, "Drama")], vec![vec![film(10, "Heat", &[1])]]);

        let first = run(&catalog, &provider, &opts(1)).await.unwrap();
        assert_eq!(first.genres_upserted, 2);
        assert_eq!(first.movies_upserted, 1);
        assert_eq!(first.relations_linked, 1);
        assert_eq!((first.totals.genres, first.totals.movies, first.totals.movie_genres), (2, 1, 1));

        let second = run(&catalog, &provider, &opts(1)).await.unwrap();
        assert_eq!(second.totals, first.totals);
        assert_eq!(second.relations_linked, 0);

        let movie = catalog.get_movie(10).await.unwrap();
        assert_eq!(movie.genres, vec!["Action"]);
        assert_eq!(movie.img_path.as_deref(), Some("https://image.tmdb.org/t/p/w500/poster.jpg"));
        assert_eq!(movie.release_date.as_deref(), Some("2024-02-29"));
    }

    #[tokio::test]
    async fn unknown_genre_link_is_skipped() {
        let catalog = Catalog::new(connect_in_memory().await);
        let provider = FakeProvider::new(&[(1, "Action")], vec![vec![film(10, "Heat", &[1, 99])]]);

        let report = run(&catalog, &provider, &opts(1)).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.totals.movie_genres, 1);
        assert_eq!(report.totals.movies, 1);
    }

    #[tokio::test]
    async fn page_failure_stops_paging_but_keeps_progress() {
        let catalog = Catalog::new(connect_in_memory().await);
        let mut provider = FakeProvider::new(&[(1, "Action")], vec![vec![film(10, "Heat", &[1])]]);
        provider.advertised_pages = 5;

        let report = run(&catalog, &provider, &opts(5)).await.unwrap();
        assert_eq!(report.totals.movies, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stops_at_last_advertised_page() {
        let catalog = Catalog::new(connect_in_memory().await);
        let provider = FakeProvider::new(&[(1, "Action")], vec![vec![film(10, "Heat", &[1])]]);

        let report = run(&catalog, &provider, &opts(3)).await.unwrap();
        assert_eq!(report.movies_upserted, 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unreachable_provider_aborts() {
        let catalog = Catalog::new(connect_in_memory().await);
        let mut provider = FakeProvider::new(&[], vec![]);
        provider.fail_genres = true;
        assert!(run(&catalog, &provider, &opts(1)).await.is_err());
        assert_eq!(catalog.totals().await.unwrap().movies, 0);
    }

    #[test]
    fn dates_are_normalized() {
        assert_eq!(normalize_date("1999-10-15").as_deref(), Some("1999-10-15"));
        assert_eq!(normalize_date(""), None);
        assert_eq!(normalize_date("soon"), None);
    }
}
