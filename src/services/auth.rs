use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{on_unique_violation, ApiError};
use crate::models::auth::Claims;
use crate::models::user::{RegisterRequest, Role, User};

pub struct AuthService;

impl AuthService {
    /// Creates a signed HS256 access token. Claims carry identity only; the
    /// role is re-resolved from the store on every request.
    pub fn create_access_token(
        user_id: Uuid,
        email: &str,
        secret: &str,
        expiry_seconds: u64,
    ) -> anyhow::Result<String> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + expiry_seconds as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Self-service signup. The admin role cannot be obtained this way;
    /// it is only ever granted by an existing admin through role assignment.
    pub async fn register(
        pool: &PgPool,
        req: &RegisterRequest,
        bcrypt_cost: u32,
    ) -> Result<User, ApiError> {
        if req.role == Role::Admin {
            return Err(ApiError::validation("invalid role"));
        }
        let email = req.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ApiError::validation("invalid email"));
        }
        if req.password.len() < 8 {
            return Err(ApiError::validation("password must be at least 8 characters"));
        }
        if req.display_name.trim().is_empty() {
            return Err(ApiError::validation("display_name is required"));
        }

        let hash = bcrypt::hash(&req.password, bcrypt_cost)
            .map_err(|e| ApiError::Upstream(e.into()))?;

        let mut tx = pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, display_name, role)
             VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(&email)
        .bind(&hash)
        .bind(req.display_name.trim())
        .bind(req.role.to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| on_unique_violation(e, "users_email_key", "email already registered"))?;

        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
            .bind(user.id)
            .bind(req.role.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Verifies credentials. Unknown email and wrong password are
    /// indistinguishable to the caller.
    pub async fn login(pool: &PgPool, email: &str, password: &str) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE email = $1 AND is_active = TRUE",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;

        let Some(user) = user else {
            return Err(ApiError::NotAuthenticated);
        };

        let ok = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| ApiError::Upstream(e.into()))?;
        if !ok {
            return Err(ApiError::NotAuthenticated);
        }
        Ok(user)
    }
}
