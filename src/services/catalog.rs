//! Book catalog service

use uuid::Uuid;
use validator::Validate;

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::{
        book::{BookListQuery, BookSearchQuery},
        Book, BookFilter, CreateBook, PageQuery, Pagination, ReviewWithUser,
    },
    repository::Repository,
};

/// One page of books plus the size of the whole filtered set
#[derive(Debug)]
pub struct BookPage {
    pub books: Vec<Book>,
    pub total: i64,
    pub pagination: Pagination,
}

/// A book with one page of its reviews and its rating summary
#[derive(Debug)]
pub struct BookDetails {
    pub book: Book,
    pub average_rating: f64,
    pub reviews: Vec<ReviewWithUser>,
    pub total_reviews: i64,
    pub pagination: Pagination,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    pagination: PaginationConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, pagination: PaginationConfig) -> Self {
        Self {
            repository,
            pagination,
        }
    }

    /// Create a new book
    pub async fn create_book(&self, data: CreateBook) -> AppResult<Book> {
        data.validate()?;

        let book = self.repository.books.create(Uuid::new_v4(), &data).await?;
        tracing::info!(book_id = %book.id, title = %book.title, "Book created");
        Ok(book)
    }

    /// List books with optional author/genre filters and pagination
    pub async fn list_books(&self, query: BookListQuery) -> AppResult<BookPage> {
        let pagination = Pagination::resolve(
            query.page.as_deref(),
            query.limit.as_deref(),
            self.pagination.default_limit,
        );
        let filter = BookFilter::new(query.author, query.genre);

        let books = self
            .repository
            .books
            .find(&filter, Some(pagination))
            .await?;
        let total = self.repository.books.count(&filter).await?;

        Ok(BookPage {
            books,
            total,
            pagination,
        })
    }

    /// All books whose genre contains `genre`, unpaginated
    pub async fn books_by_genre(&self, genre: String) -> AppResult<Vec<Book>> {
        let filter = BookFilter::new(None, Some(genre));
        self.repository.books.find(&filter, None).await
    }

    /// Title/author search, capped at the configured search limit
    pub async fn search_books(&self, query: BookSearchQuery) -> AppResult<Vec<Book>> {
        let term = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::BadRequest("Query parameter 'q' is required".to_string()))?;

        self.repository
            .books
            .search(term, self.pagination.search_limit)
            .await
    }

    /// Book with a page of its reviews, newest first, and its average rating
    pub async fn get_book_details(&self, id: &str, query: PageQuery) -> AppResult<BookDetails> {
        let book_id = parse_book_id(id)?;
        let book = self
            .repository
            .books
            .get_by_id(book_id)
            .await?
            .ok_or_else(book_not_found)?;

        let pagination = query.resolve(self.pagination.review_limit);
        let reviews = self
            .repository
            .reviews
            .list_for_book(book_id, pagination)
            .await?;

        Ok(BookDetails {
            average_rating: book.average_rating(),
            total_reviews: book.rating_count,
            reviews: reviews.into_iter().map(ReviewWithUser::from).collect(),
            book,
            pagination,
        })
    }
}

fn book_not_found() -> AppError {
    AppError::BookNotFound("Book not found".to_string())
}

/// Book ids that are not valid UUIDs cannot name an existing book
pub(crate) fn parse_book_id(id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| book_not_found())
}
