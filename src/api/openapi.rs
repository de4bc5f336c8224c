//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, reviews};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Book Review API",
        version = "1.0.0",
        description = "Books, reviews and ratings REST API"
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::create_book,
        books::list_books,
        books::books_by_genre,
        books::search_books,
        books::get_book,
        books::create_review,
        // Reviews
        reviews::update_review,
        reviews::delete_review,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            books::BookCreatedResponse,
            books::BookListResponse,
            books::BooksResponse,
            books::BookDetailsResponse,
            // Reviews
            crate::models::review::Review,
            crate::models::review::ReviewUser,
            crate::models::review::ReviewWithUser,
            crate::models::review::CreateReview,
            crate::models::review::UpdateReview,
            books::ReviewCreatedResponse,
            reviews::ReviewUpdatedResponse,
            reviews::MessageResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog"),
        (name = "reviews", description = "Book reviews")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by authenticated paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_endpoint_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/ready",
            "/books",
            "/books/genre/{genre}",
            "/books/search",
            "/books/{id}",
            "/books/{id}/reviews",
            "/reviews/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
