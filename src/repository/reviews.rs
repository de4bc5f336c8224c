//! PostgreSQL review storage

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use super::ReviewsRepository;
use crate::{
    error::{AppError, AppResult},
    models::{NewReview, Pagination, Review, UpdateReview},
};

const REVIEW_COLUMNS: &str =
    "id, book_id, user_id, user_name, rating, comment, created_at, updated_at";

#[derive(Clone)]
pub struct PgReviewsRepository {
    pool: Pool<Postgres>,
}

impl PgReviewsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn review_not_found() -> AppError {
    AppError::ReviewNotFound("Review not found".to_string())
}

/// Lock the book owning review `id`. Every review write locks the book row
/// before any review row.
async fn lock_book_of_review(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> AppResult<()> {
    let locked: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM books WHERE id = (SELECT book_id FROM reviews WHERE id = $1) FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;
    locked.map(|_| ()).ok_or_else(review_not_found)
}

#[async_trait]
impl ReviewsRepository for PgReviewsRepository {
    async fn list_for_book(&self, book_id: Uuid, page: Pagination) -> AppResult<Vec<Review>> {
        let query = format!(
            "SELECT {} FROM reviews WHERE book_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            REVIEW_COLUMNS
        );
        let reviews = sqlx::query_as::<_, Review>(&query)
            .bind(book_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(reviews)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Review>> {
        let query = format!("SELECT {} FROM reviews WHERE id = $1", REVIEW_COLUMNS);
        let review = sqlx::query_as::<_, Review>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    async fn create(&self, review: &NewReview) -> AppResult<Review> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent writes on the same book's aggregate
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM books WHERE id = $1 FOR UPDATE")
                .bind(review.book_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(AppError::BookNotFound("Book not found".to_string()));
        }

        let query = format!(
            "INSERT INTO reviews (id, book_id, user_id, user_name, rating, comment) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            REVIEW_COLUMNS
        );
        let created = sqlx::query_as::<_, Review>(&query)
            .bind(review.id)
            .bind(review.book_id)
            .bind(review.user_id)
            .bind(&review.user_name)
            .bind(review.rating)
            .bind(&review.comment)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::Conflict("You have already reviewed this book".to_string())
                }
                other => AppError::Database(other),
            })?;

        sqlx::query(
            "UPDATE books SET rating_count = rating_count + 1, rating_sum = rating_sum + $2 \
             WHERE id = $1",
        )
        .bind(review.book_id)
        .bind(i64::from(review.rating))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update(&self, id: Uuid, patch: &UpdateReview) -> AppResult<Review> {
        let mut tx = self.pool.begin().await?;
        lock_book_of_review(&mut tx, id).await?;

        let query = format!("SELECT {} FROM reviews WHERE id = $1 FOR UPDATE", REVIEW_COLUMNS);
        let mut review = sqlx::query_as::<_, Review>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(review_not_found)?;

        let previous_rating = review.rating;
        patch.apply_to(&mut review);

        let query = format!(
            "UPDATE reviews SET rating = $2, comment = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            REVIEW_COLUMNS
        );
        let updated = sqlx::query_as::<_, Review>(&query)
            .bind(id)
            .bind(review.rating)
            .bind(&review.comment)
            .fetch_one(&mut *tx)
            .await?;

        let delta = i64::from(updated.rating) - i64::from(previous_rating);
        if delta != 0 {
            sqlx::query("UPDATE books SET rating_sum = rating_sum + $2 WHERE id = $1")
                .bind(updated.book_id)
                .bind(delta)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        lock_book_of_review(&mut tx, id).await?;

        let removed: Option<(Uuid, i16)> =
            sqlx::query_as("DELETE FROM reviews WHERE id = $1 RETURNING book_id, rating")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let (book_id, rating) = removed.ok_or_else(review_not_found)?;

        sqlx::query(
            "UPDATE books SET rating_count = rating_count - 1, rating_sum = rating_sum - $2 \
             WHERE id = $1",
        )
        .bind(book_id)
        .bind(i64::from(rating))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
