//! Data models for the book review server

pub mod book;
pub mod pagination;
pub mod review;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookFilter, CreateBook};
pub use pagination::{PageQuery, Pagination};
pub use review::{CreateReview, NewReview, Review, ReviewUser, ReviewWithUser, UpdateReview};
pub use user::UserClaims;
