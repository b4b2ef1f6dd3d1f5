pub mod genre;
pub mod movie;
pub mod movie_genre;
pub mod review;
pub mod session;
pub mod user;
pub mod watchlist_entry;
