//! PostgreSQL book storage

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{like_pattern, BooksRepository};
use crate::{
    error::AppResult,
    models::{Book, BookFilter, CreateBook, Pagination},
};

/// Book columns, with the review id list derived from the reviews table
const BOOK_COLUMNS: &str = r#"
    b.id, b.title, b.author, b.genre, b.description,
    ARRAY(SELECT r.id FROM reviews r WHERE r.book_id = b.id ORDER BY r.created_at, r.id) AS reviews,
    b.rating_count, b.rating_sum, b.created_at, b.updated_at
"#;

#[derive(Clone)]
pub struct PgBooksRepository {
    pool: Pool<Postgres>,
}

impl PgBooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    if let Some(ref author) = filter.author {
        builder.push(" AND b.author ILIKE ").push_bind(like_pattern(author));
    }
    if let Some(ref genre) = filter.genre {
        builder.push(" AND b.genre ILIKE ").push_bind(like_pattern(genre));
    }
}

#[async_trait]
impl BooksRepository for PgBooksRepository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create(&self, id: Uuid, data: &CreateBook) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, author, genre, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, author, genre, description,
                      ARRAY[]::uuid[] AS reviews,
                      rating_count, rating_sum, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.author)
        .bind(&data.genre)
        .bind(&data.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(book)
    }

    async fn find(&self, filter: &BookFilter, page: Option<Pagination>) -> AppResult<Vec<Book>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM books b WHERE TRUE",
            BOOK_COLUMNS
        ));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY b.created_at, b.id");
        if let Some(page) = page {
            builder
                .push(" LIMIT ")
                .push_bind(page.limit)
                .push(" OFFSET ")
                .push_bind(page.offset());
        }

        let books = builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn count(&self, filter: &BookFilter) -> AppResult<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books b WHERE TRUE");
        push_filter(&mut builder, filter);

        let (total,): (i64,) = builder
            .build_query_as()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn search(&self, term: &str, limit: i64) -> AppResult<Vec<Book>> {
        let pattern = like_pattern(term);
        let query = format!(
            "SELECT {} FROM books b WHERE b.title ILIKE $1 OR b.author ILIKE $1 \
             ORDER BY b.created_at, b.id LIMIT $2",
            BOOK_COLUMNS
        );
        let books = sqlx::query_as::<_, Book>(&query)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let query = format!("SELECT {} FROM books b WHERE b.id = $1", BOOK_COLUMNS);
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }
}
