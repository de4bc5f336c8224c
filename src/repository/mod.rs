//! Repository layer for persistence operations
//!
//! Handlers and services only see the [`BooksRepository`] and
//! [`ReviewsRepository`] traits. Two backends implement them: PostgreSQL
//! through sqlx, and an in-memory store used for development and tests.

pub mod books;
pub mod memory;
pub mod reviews;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Book, BookFilter, CreateBook, NewReview, Pagination, Review, UpdateReview},
};

/// Book storage
#[async_trait]
pub trait BooksRepository: Send + Sync {
    /// Check that the backing store answers
    async fn ping(&self) -> AppResult<()>;

    async fn create(&self, id: Uuid, data: &CreateBook) -> AppResult<Book>;

    /// Books matching `filter` in insertion order, optionally paginated
    async fn find(&self, filter: &BookFilter, page: Option<Pagination>) -> AppResult<Vec<Book>>;

    async fn count(&self, filter: &BookFilter) -> AppResult<i64>;

    /// Books whose title or author contains `term`, at most `limit`
    async fn search(&self, term: &str, limit: i64) -> AppResult<Vec<Book>>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;
}

/// Review storage. Every write keeps the owning book's rating aggregate in
/// step within the same transaction.
#[async_trait]
pub trait ReviewsRepository: Send + Sync {
    /// Reviews of a book, newest first
    async fn list_for_book(&self, book_id: Uuid, page: Pagination) -> AppResult<Vec<Review>>;

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Review>>;

    /// Fails with `BookNotFound` when the book is missing and `Conflict` when
    /// the user already reviewed it.
    async fn create(&self, review: &NewReview) -> AppResult<Review>;

    /// Fails with `ReviewNotFound` when the review is missing
    async fn update(&self, id: Uuid, patch: &UpdateReview) -> AppResult<Review>;

    /// Fails with `ReviewNotFound` when the review is missing
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

/// Main repository struct holding the storage backends
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BooksRepository>,
    pub reviews: Arc<dyn ReviewsRepository>,
}

impl Repository {
    /// Create a repository backed by the given PostgreSQL pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::PgBooksRepository::new(pool.clone())),
            reviews: Arc::new(reviews::PgReviewsRepository::new(pool)),
        }
    }

    /// Create a repository kept entirely in process memory
    pub fn in_memory() -> Self {
        let store = memory::InMemoryStore::new();
        Self {
            books: Arc::new(store.clone()),
            reviews: Arc::new(store),
        }
    }
}

/// Turn user text into a literal `ILIKE` substring pattern
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("dun"), "%dun%");
        assert_eq!(like_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
    }
}
