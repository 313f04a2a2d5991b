use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::models::auth::{AuthenticatedUser, Claims};

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or((StatusCode::UNAUTHORIZED, "Invalid Authorization header format"))?;

        let secret = parts
            .extensions
            .get::<JwtSecret>()
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "JWT secret not configured"))?;

        let user = decode_access_token(token, &secret.0)
            .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid or expired token"))?;

        Ok(user)
    }
}

/// Extension type to carry the JWT secret through request extensions.
#[derive(Clone)]
pub struct JwtSecret(pub String);

/// Validates the token and yields the principal's identity. The token
/// carries no role claim; handlers resolve the role from the store.
pub fn decode_access_token(token: &str, secret: &str) -> Result<AuthenticatedUser, anyhow::Error> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &key, &validation)?;
    let claims = data.claims;

    Ok(AuthenticatedUser {
        id: claims.sub.parse()?,
        email: claims.email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::AuthService;
    use uuid::Uuid;

    #[test]
    fn issued_tokens_decode_back_to_the_same_identity() {
        let id = Uuid::new_v4();
        let token =
            AuthService::create_access_token(id, "kid@example.com", "test-secret", 900).unwrap();
        let user = decode_access_token(&token, "test-secret").unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email, "kid@example.com");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = AuthService::create_access_token(
            Uuid::new_v4(),
            "kid@example.com",
            "test-secret",
            900,
        )
        .unwrap();
        assert!(decode_access_token(&token, "other-secret").is_err());
    }
}
