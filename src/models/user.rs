//! Authenticated user identity carried by bearer tokens

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims. Tokens are issued elsewhere; this server only verifies them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    /// User id
    pub sub: Uuid,
    /// Display name shown next to the user's reviews
    #[serde(default)]
    pub name: Option<String>,
    pub exp: i64,
    /// Optional; some issuers leave it out
    #[serde(default)]
    pub iat: i64,
}

impl UserClaims {
    /// Claims valid for `hours` from now
    pub fn new(user_id: Uuid, name: Option<String>, hours: i64) -> Self {
        let now = chrono::Utc::now();
        Self {
            sub: user_id,
            name,
            exp: (now + chrono::Duration::hours(hours)).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Whether this user owns a record created by `owner_id`
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.sub == owner_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let claims = UserClaims::new(Uuid::new_v4(), Some("Ann".into()), 1);
        let token = claims.create_token("secret").unwrap();
        assert_eq!(UserClaims::from_token(&token, "secret").unwrap(), claims);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = UserClaims::new(Uuid::new_v4(), None, 1)
            .create_token("secret")
            .unwrap();
        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn token_without_iat_is_accepted() {
        use jsonwebtoken::{encode, EncodingKey, Header};
        let user = Uuid::new_v4();
        let exp = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp();
        let token = encode(
            &Header::default(),
            &serde_json::json!({ "sub": user, "exp": exp }),
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let claims = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.name, None);
        assert_eq!(claims.iat, 0);
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = UserClaims::new(Uuid::new_v4(), None, -2)
            .create_token("secret")
            .unwrap();
        assert!(UserClaims::from_token(&token, "secret").is_err());
    }
}
