//! Book model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Book record
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub description: Option<String>,
    /// Ids of the book's reviews, oldest first
    pub reviews: Vec<Uuid>,
    /// Number of ratings folded into `rating_sum`
    #[serde(skip)]
    pub rating_count: i64,
    #[serde(skip)]
    pub rating_sum: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Mean rating over every review of the book, rounded to two decimals.
    /// Zero when the book has no reviews.
    pub fn average_rating(&self) -> f64 {
        if self.rating_count <= 0 {
            return 0.0;
        }
        let mean = self.rating_sum as f64 / self.rating_count as f64;
        (mean * 100.0).round() / 100.0
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    pub genre: Option<String>,
    pub description: Option<String>,
}

/// Book list query parameters. Numbers are taken as raw strings and
/// coerced leniently, see [`super::PageQuery`].
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
}

/// Search query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookSearchQuery {
    /// Matched against title and author
    pub q: Option<String>,
}

/// Case-insensitive substring filters on books
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub author: Option<String>,
    pub genre: Option<String>,
}

impl BookFilter {
    /// Build a filter, dropping empty filter values
    pub fn new(author: Option<String>, genre: Option<String>) -> Self {
        let keep = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            author: keep(author),
            genre: keep(genre),
        }
    }

    /// In-process evaluation, used by the in-memory repository
    pub fn matches(&self, book: &Book) -> bool {
        let author_ok = self
            .author
            .as_deref()
            .map_or(true, |a| contains_ignore_case(&book.author, a));
        let genre_ok = self.genre.as_deref().map_or(true, |g| {
            book.genre
                .as_deref()
                .is_some_and(|genre| contains_ignore_case(genre, g))
        });
        author_ok && genre_ok
    }
}

/// Case-insensitive substring test
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
