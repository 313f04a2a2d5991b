use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::ApiError,
    models::auth::AuthenticatedUser,
    models::user::{LoginRequest, LoginResponse, RegisterRequest, UserProfile},
    services::auth::AuthService,
    services::users::UserService,
    AppState,
};

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let user = AuthService::register(&state.db, &body, state.config.bcrypt_cost).await?;

    let access_token = AuthService::create_access_token(
        user.id,
        &user.email,
        &state.config.jwt_secret,
        state.config.jwt_expiry_seconds,
    )?;
    let user = UserProfile::try_from(user)?;

    Ok((StatusCode::CREATED, Json(LoginResponse { access_token, user })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = AuthService::login(&state.db, &body.email, &body.password).await?;

    let access_token = AuthService::create_access_token(
        user.id,
        &user.email,
        &state.config.jwt_secret,
        state.config.jwt_expiry_seconds,
    )?;
    let user = UserProfile::try_from(user)?;

    Ok(Json(LoginResponse { access_token, user }))
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<UserProfile>, ApiError> {
    let user = UserService::get(&state.db, auth.id).await?;
    Ok(Json(UserProfile::try_from(user)?))
}
