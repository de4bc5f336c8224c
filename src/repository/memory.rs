//! In-memory storage backend
//!
//! Books and reviews live in one state behind a single lock, so each
//! review write and its rating aggregate update happen atomically, and the
//! one-review-per-user-per-book rule is checked under the write lock.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BooksRepository, ReviewsRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::contains_ignore_case, Book, BookFilter, CreateBook, NewReview, Pagination, Review,
        UpdateReview,
    },
};

#[derive(Debug, Default)]
struct State {
    /// Insertion order
    books: Vec<Book>,
    /// Insertion order
    reviews: Vec<Review>,
}

impl State {
    /// Copy of a stored book with its review id list filled in
    fn hydrate(&self, book: &Book) -> Book {
        let mut book = book.clone();
        book.reviews = self
            .reviews
            .iter()
            .filter(|r| r.book_id == book.id)
            .map(|r| r.id)
            .collect();
        book
    }

    fn book_mut(&mut self, id: Uuid) -> Option<&mut Book> {
        self.books.iter_mut().find(|b| b.id == id)
    }
}

/// Shared in-memory store. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn window<T>(items: impl Iterator<Item = T>, page: Option<Pagination>) -> Vec<T> {
    match page {
        Some(page) => items
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit).unwrap_or(usize::MAX))
            .collect(),
        None => items.collect(),
    }
}

#[async_trait]
impl BooksRepository for InMemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn create(&self, id: Uuid, data: &CreateBook) -> AppResult<Book> {
        let now = Utc::now();
        let book = Book {
            id,
            title: data.title.clone(),
            author: data.author.clone(),
            genre: data.genre.clone(),
            description: data.description.clone(),
            reviews: Vec::new(),
            rating_count: 0,
            rating_sum: 0,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.books.push(book.clone());
        Ok(book)
    }

    async fn find(&self, filter: &BookFilter, page: Option<Pagination>) -> AppResult<Vec<Book>> {
        let state = self.state.read().await;
        let matching = state.books.iter().filter(|b| filter.matches(b));
        Ok(window(matching, page)
            .into_iter()
            .map(|b| state.hydrate(b))
            .collect())
    }

    async fn count(&self, filter: &BookFilter) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state.books.iter().filter(|b| filter.matches(b)).count() as i64)
    }

    async fn search(&self, term: &str, limit: i64) -> AppResult<Vec<Book>> {
        let state = self.state.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(state
            .books
            .iter()
            .filter(|b| contains_ignore_case(&b.title, term) || contains_ignore_case(&b.author, term))
            .take(limit)
            .map(|b| state.hydrate(b))
            .collect())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let state = self.state.read().await;
        Ok(state
            .books
            .iter()
            .find(|b| b.id == id)
            .map(|b| state.hydrate(b)))
    }
}

#[async_trait]
impl ReviewsRepository for InMemoryStore {
    async fn list_for_book(&self, book_id: Uuid, page: Pagination) -> AppResult<Vec<Review>> {
        let state = self.state.read().await;
        let newest_first = state.reviews.iter().rev().filter(|r| r.book_id == book_id);
        Ok(window(newest_first, Some(page)).into_iter().cloned().collect())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Review>> {
        let state = self.state.read().await;
        Ok(state.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, review: &NewReview) -> AppResult<Review> {
        let mut state = self.state.write().await;

        if !state.books.iter().any(|b| b.id == review.book_id) {
            return Err(AppError::BookNotFound("Book not found".to_string()));
        }
        if state
            .reviews
            .iter()
            .any(|r| r.book_id == review.book_id && r.user_id == review.user_id)
        {
            return Err(AppError::Conflict(
                "You have already reviewed this book".to_string(),
            ));
        }

        let now = Utc::now();
        let created = Review {
            id: review.id,
            book_id: review.book_id,
            user_id: review.user_id,
            user_name: review.user_name.clone(),
            rating: review.rating,
            comment: review.comment.clone(),
            created_at: now,
            updated_at: now,
        };
        state.reviews.push(created.clone());
        if let Some(book) = state.book_mut(review.book_id) {
            book.rating_count += 1;
            book.rating_sum += i64::from(review.rating);
        }
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: &UpdateReview) -> AppResult<Review> {
        let mut state = self.state.write().await;

        let review = state
            .reviews
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::ReviewNotFound("Review not found".to_string()))?;
        let previous_rating = review.rating;
        patch.apply_to(review);
        review.updated_at = Utc::now();
        let updated = review.clone();

        let delta = i64::from(updated.rating) - i64::from(previous_rating);
        if let Some(book) = state.book_mut(updated.book_id) {
            book.rating_sum += delta;
        }
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;

        let position = state
            .reviews
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AppError::ReviewNotFound("Review not found".to_string()))?;
        let removed = state.reviews.remove(position);

        if let Some(book) = state.book_mut(removed.book_id) {
            book.rating_count -= 1;
            book.rating_sum -= i64::from(removed.rating);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserClaims;
    use crate::models::CreateReview;

    fn create_book(title: &str, author: &str) -> CreateBook {
        CreateBook {
            title: title.to_string(),
            author: author.to_string(),
            genre: Some("Science Fiction".to_string()),
            description: None,
        }
    }

    fn new_review(book_id: Uuid, user: Uuid, rating: i16) -> NewReview {
        let claims = UserClaims::new(user, Some("reader".into()), 1);
        NewReview::new(
            book_id,
            &claims,
            CreateReview {
                rating,
                comment: None,
            },
        )
    }

    #[tokio::test]
    async fn books_keep_insertion_order_and_paginate() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            BooksRepository::create(&store, Uuid::new_v4(), &create_book(&format!("T{i}"), "A"))
                .await
                .unwrap();
        }
        let page = Pagination { page: 2, limit: 2 };
        let books = store.find(&BookFilter::default(), Some(page)).await.unwrap();
        let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["T2", "T3"]);
        assert_eq!(store.count(&BookFilter::default()).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn review_writes_maintain_aggregate() {
        let store = InMemoryStore::new();
        let book_id = Uuid::new_v4();
        BooksRepository::create(&store, book_id, &create_book("Dune", "Herbert"))
            .await
            .unwrap();

        let first = ReviewsRepository::create(&store, &new_review(book_id, Uuid::new_v4(), 4))
            .await
            .unwrap();
        ReviewsRepository::create(&store, &new_review(book_id, Uuid::new_v4(), 2))
            .await
            .unwrap();

        let book = BooksRepository::get_by_id(&store, book_id).await.unwrap().unwrap();
        assert_eq!((book.rating_count, book.rating_sum), (2, 6));
        assert_eq!(book.reviews.len(), 2);
        assert_eq!(book.reviews[0], first.id);

        let patch = UpdateReview {
            rating: Some(5),
            comment: None,
        };
        ReviewsRepository::update(&store, first.id, &patch).await.unwrap();
        let book = BooksRepository::get_by_id(&store, book_id).await.unwrap().unwrap();
        assert_eq!((book.rating_count, book.rating_sum), (2, 7));

        ReviewsRepository::delete(&store, first.id).await.unwrap();
        let book = BooksRepository::get_by_id(&store, book_id).await.unwrap().unwrap();
        assert_eq!((book.rating_count, book.rating_sum), (1, 2));
        assert_eq!(book.reviews.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_review_is_a_conflict() {
        let store = InMemoryStore::new();
        let book_id = Uuid::new_v4();
        let user = Uuid::new_v4();
        BooksRepository::create(&store, book_id, &create_book("Dune", "Herbert"))
            .await
            .unwrap();

        ReviewsRepository::create(&store, &new_review(book_id, user, 4))
            .await
            .unwrap();
        let err = ReviewsRepository::create(&store, &new_review(book_id, user, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let page = Pagination { page: 1, limit: 10 };
        assert_eq!(store.list_for_book(book_id, page).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn review_on_missing_book_is_not_found() {
        let store = InMemoryStore::new();
        let err = ReviewsRepository::create(&store, &new_review(Uuid::new_v4(), Uuid::new_v4(), 3))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BookNotFound(_)));
    }
}
