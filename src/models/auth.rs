use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims embedded in the JWT access token. Deliberately carries no role:
/// the role is resolved from the role store on every request so a stale
/// token can never grant a revoked capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user UUID
    pub email: String,
    pub exp: usize,
    pub iat: usize,
}

/// Extracted from the validated JWT — available via Axum extractors.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
}
