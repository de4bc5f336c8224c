//! Review endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{Review, UpdateReview},
    AppState,
};

use super::{AppJson, AuthenticatedUser};

#[derive(Serialize, ToSchema)]
pub struct ReviewUpdatedResponse {
    pub message: String,
    pub review: Review,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Update your own review
#[utoipa::path(
    put,
    path = "/reviews/{id}",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Review ID")),
    request_body = UpdateReview,
    responses(
        (status = 200, description = "Review updated", body = ReviewUpdatedResponse),
        (status = 400, description = "Invalid rating", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the review owner", body = crate::error::ErrorResponse),
        (status = 404, description = "Review not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    AppJson(patch): AppJson<UpdateReview>,
) -> AppResult<Json<ReviewUpdatedResponse>> {
    let review = state
        .services
        .reviews
        .update_review(&id, &claims, patch)
        .await?;

    Ok(Json(ReviewUpdatedResponse {
        message: "Review updated".to_string(),
        review,
    }))
}

/// Delete your own review
#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review deleted", body = MessageResponse),
        (status = 403, description = "Not the review owner", body = crate::error::ErrorResponse),
        (status = 404, description = "Review not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_review(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.reviews.delete_review(&id, &claims).await?;

    Ok(Json(MessageResponse {
        message: "Review deleted".to_string(),
    }))
}
