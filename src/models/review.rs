//! Review model

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Review record
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    /// Reviewer display name at the time of writing
    pub user_name: Option<String>,
    /// 1 to 5
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal reviewer data shown alongside a review
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewUser {
    pub id: Uuid,
    pub name: Option<String>,
}

/// Review joined with its reviewer, as listed on the book detail page
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithUser {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user: ReviewUser,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Review> for ReviewWithUser {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            book_id: review.book_id,
            user: ReviewUser {
                id: review.user_id,
                name: review.user_name,
            },
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}

/// Create review request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReview {
    /// A missing rating reads as 0 and fails validation
    #[serde(default, deserialize_with = "deserialize_rating")]
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,
    pub comment: Option<String>,
}

/// Rating as sent by clients: a number or a numeric string
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRating {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawRating {
    /// Whole-number value. Out of `i16` range saturates so that range
    /// validation reports it.
    fn into_rating<E: de::Error>(self) -> Result<i16, E> {
        let value = match self {
            RawRating::Int(v) => v,
            RawRating::Float(f) => whole(f)?,
            RawRating::Text(text) => {
                let text = text.trim();
                match text.parse::<i64>() {
                    Ok(v) => v,
                    Err(_) => text
                        .parse::<f64>()
                        .map_err(|_| E::custom("Rating must be a number"))
                        .and_then(whole)?,
                }
            }
        };
        Ok(i16::try_from(value).unwrap_or(if value < 0 { i16::MIN } else { i16::MAX }))
    }
}

fn whole<E: de::Error>(f: f64) -> Result<i64, E> {
    if f.is_finite() && f.fract() == 0.0 {
        Ok(f as i64)
    } else {
        Err(E::custom("Rating must be a whole number"))
    }
}

fn deserialize_rating<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i16, D::Error> {
    RawRating::deserialize(deserializer)?.into_rating()
}

fn deserialize_optional_rating<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i16>, D::Error> {
    Option::<RawRating>::deserialize(deserializer)?
        .map(RawRating::into_rating)
        .transpose()
}

/// Partial review update. A field that is present is applied, whatever its
/// value; an absent field is left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateReview {
    #[serde(default, deserialize_with = "deserialize_optional_rating")]
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i16>,
    pub comment: Option<String>,
}

impl UpdateReview {
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.comment.is_none()
    }

    /// Apply the present fields to `review`
    pub fn apply_to(&self, review: &mut Review) {
        if let Some(rating) = self.rating {
            review.rating = rating;
        }
        if let Some(ref comment) = self.comment {
            review.comment = Some(comment.clone());
        }
    }
}

/// Review ready to be persisted
#[derive(Debug, Clone)]
pub struct NewReview {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub rating: i16,
    pub comment: Option<String>,
}

impl NewReview {
    pub fn new(book_id: Uuid, claims: &super::UserClaims, data: CreateReview) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id,
            user_id: claims.sub,
            user_name: claims.name.clone(),
            rating: data.rating,
            comment: data.comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review() -> Review {
        Review {
            id: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_name: Some("Ann".into()),
            rating: 3,
            comment: Some("fine".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn absent_fields_are_left_alone() {
        let mut r = review();
        let patch: UpdateReview = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());
        patch.apply_to(&mut r);
        assert_eq!(r.rating, 3);
        assert_eq!(r.comment.as_deref(), Some("fine"));
    }

    #[test]
    fn present_empty_comment_is_applied() {
        let mut r = review();
        let patch: UpdateReview = serde_json::from_str(r#"{"comment": ""}"#).unwrap();
        patch.apply_to(&mut r);
        assert_eq!(r.rating, 3);
        assert_eq!(r.comment.as_deref(), Some(""));
    }

    #[test]
    fn zero_rating_is_rejected_not_ignored() {
        let patch: UpdateReview = serde_json::from_str(r#"{"rating": 0}"#).unwrap();
        assert!(!patch.is_empty());
        assert!(patch.validate().is_err());
    }

    #[test]
    fn rating_accepts_numeric_strings_and_whole_floats() {
        let data: CreateReview = serde_json::from_str(r#"{"rating": "5"}"#).unwrap();
        assert_eq!(data.rating, 5);
        let data: CreateReview = serde_json::from_str(r#"{"rating": 4.0}"#).unwrap();
        assert_eq!(data.rating, 4);
        let patch: UpdateReview = serde_json::from_str(r#"{"rating": " 2 "}"#).unwrap();
        assert_eq!(patch.rating, Some(2));
    }

    #[test]
    fn fractional_or_text_rating_does_not_parse() {
        assert!(serde_json::from_str::<CreateReview>(r#"{"rating": 4.5}"#).is_err());
        assert!(serde_json::from_str::<CreateReview>(r#"{"rating": "five"}"#).is_err());
    }

    #[test]
    fn huge_rating_saturates_and_fails_validation() {
        let data: CreateReview = serde_json::from_str(r#"{"rating": 40000}"#).unwrap();
        assert_eq!(data.rating, i16::MAX);
        assert!(data.validate().is_err());
    }

    #[test]
    fn null_rating_in_patch_is_absent() {
        let patch: UpdateReview = serde_json::from_str(r#"{"rating": null}"#).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn joined_review_exposes_reviewer() {
        let r = review();
        let user_id = r.user_id;
        let joined = ReviewWithUser::from(r);
        let json = serde_json::to_value(&joined).unwrap();
        assert_eq!(json["user"]["id"], user_id.to_string());
        assert_eq!(json["user"]["name"], "Ann");
        assert!(json.get("bookId").is_some());
    }
}
