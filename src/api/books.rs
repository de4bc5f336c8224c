//! Book endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        book::{BookListQuery, BookSearchQuery},
        Book, CreateBook, CreateReview, PageQuery, Review, ReviewWithUser,
    },
    AppState,
};

use super::{AppJson, AuthenticatedUser};

/// Response to a book creation
#[derive(Serialize, ToSchema)]
pub struct BookCreatedResponse {
    pub message: String,
    pub book: Book,
}

/// Paginated book list
#[derive(Serialize, ToSchema)]
pub struct BookListResponse {
    pub books: Vec<Book>,
    /// Number of books matching the filters
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Unpaginated book list
#[derive(Serialize, ToSchema)]
pub struct BooksResponse {
    pub books: Vec<Book>,
}

/// Book with one page of its reviews and its average rating
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookDetailsResponse {
    pub book: Book,
    /// Mean of all ratings, two decimals, 0 without reviews
    pub average_rating: f64,
    /// Requested page of reviews, newest first
    pub reviews: Vec<ReviewWithUser>,
    pub total_reviews: i64,
    pub page: i64,
    pub limit: i64,
}

/// Response to a review creation
#[derive(Serialize, ToSchema)]
pub struct ReviewCreatedResponse {
    pub message: String,
    pub review: Review,
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookCreatedResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    AppJson(data): AppJson<CreateBook>,
) -> AppResult<(StatusCode, Json<BookCreatedResponse>)> {
    tracing::debug!(user_id = %claims.sub, "Creating book");

    let book = state.services.catalog.create_book(data).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookCreatedResponse {
            message: "Book added successfully".to_string(),
            book,
        }),
    ))
}

/// List books with author/genre filters and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookListQuery),
    responses(
        (status = 200, description = "Page of books", body = BookListResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookListQuery>,
) -> AppResult<Json<BookListResponse>> {
    let page = state.services.catalog.list_books(query).await?;

    Ok(Json(BookListResponse {
        books: page.books,
        total: page.total,
        page: page.pagination.page,
        limit: page.pagination.limit,
    }))
}

/// List books by genre (case-insensitive substring)
#[utoipa::path(
    get,
    path = "/books/genre/{genre}",
    tag = "books",
    params(
        ("genre" = String, Path, description = "Genre text to look for")
    ),
    responses(
        (status = 200, description = "Matching books", body = BooksResponse)
    )
)]
pub async fn books_by_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
) -> AppResult<Json<BooksResponse>> {
    let books = state.services.catalog.books_by_genre(genre).await?;
    Ok(Json(BooksResponse { books }))
}

/// Search books by title or author
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "books",
    params(BookSearchQuery),
    responses(
        (status = 200, description = "At most 20 matching books", body = BooksResponse),
        (status = 400, description = "Missing query parameter 'q'", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<BookSearchQuery>,
) -> AppResult<Json<BooksResponse>> {
    let books = state.services.catalog.search_books(query).await?;
    Ok(Json(BooksResponse { books }))
}

/// Get book details with paginated reviews and average rating
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetailsResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<BookDetailsResponse>> {
    let details = state.services.catalog.get_book_details(&id, query).await?;

    Ok(Json(BookDetailsResponse {
        book: details.book,
        average_rating: details.average_rating,
        reviews: details.reviews,
        total_reviews: details.total_reviews,
        page: details.pagination.page,
        limit: details.pagination.limit,
    }))
}

/// Review a book (one review per user per book)
#[utoipa::path(
    post,
    path = "/books/{id}/reviews",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    request_body = CreateReview,
    responses(
        (status = 201, description = "Review added", body = ReviewCreatedResponse),
        (status = 400, description = "Invalid rating or book already reviewed", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    AppJson(data): AppJson<CreateReview>,
) -> AppResult<(StatusCode, Json<ReviewCreatedResponse>)> {
    let review = state
        .services
        .reviews
        .create_review(&id, &claims, data)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReviewCreatedResponse {
            message: "Review added".to_string(),
            review,
        }),
    ))
}
