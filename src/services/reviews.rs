//! Review management service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{CreateReview, NewReview, Review, UpdateReview, UserClaims},
    repository::Repository,
};

use super::catalog::parse_book_id;

#[derive(Clone)]
pub struct ReviewsService {
    repository: Repository,
}

impl ReviewsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Add the caller's review to a book. One review per user per book.
    pub async fn create_review(
        &self,
        book_id: &str,
        claims: &UserClaims,
        data: CreateReview,
    ) -> AppResult<Review> {
        let book_id = parse_book_id(book_id)?;
        if self.repository.books.get_by_id(book_id).await?.is_none() {
            return Err(AppError::BookNotFound("Book not found".to_string()));
        }
        data.validate()?;

        let review = self
            .repository
            .reviews
            .create(&NewReview::new(book_id, claims, data))
            .await?;
        tracing::info!(
            review_id = %review.id,
            book_id = %book_id,
            user_id = %claims.sub,
            "Review created"
        );
        Ok(review)
    }

    /// Update the caller's own review
    pub async fn update_review(
        &self,
        id: &str,
        claims: &UserClaims,
        patch: UpdateReview,
    ) -> AppResult<Review> {
        let review = self.owned_review(id, claims, "update").await?;
        patch.validate()?;

        if patch.is_empty() {
            return Ok(review);
        }

        let updated = self.repository.reviews.update(review.id, &patch).await?;
        tracing::info!(review_id = %updated.id, user_id = %claims.sub, "Review updated");
        Ok(updated)
    }

    /// Delete the caller's own review
    pub async fn delete_review(&self, id: &str, claims: &UserClaims) -> AppResult<()> {
        let review = self.owned_review(id, claims, "delete").await?;

        self.repository.reviews.delete(review.id).await?;
        tracing::info!(review_id = %review.id, user_id = %claims.sub, "Review deleted");
        Ok(())
    }

    async fn owned_review(&self, id: &str, claims: &UserClaims, action: &str) -> AppResult<Review> {
        let not_found = || AppError::ReviewNotFound("Review not found".to_string());

        let id = Uuid::parse_str(id).map_err(|_| not_found())?;
        let review = self
            .repository
            .reviews
            .get_by_id(id)
            .await?
            .ok_or_else(not_found)?;

        if !claims.owns(review.user_id) {
            tracing::warn!(review_id = %id, user_id = %claims.sub, action, "Review ownership check failed");
            return Err(AppError::Authorization(format!(
                "Unauthorized to {} this review",
                action
            )));
        }
        Ok(review)
    }
}
