use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    access::Principal,
    error::ApiError,
    models::auth::AuthenticatedUser,
    models::message::{ConversationSummary, Message, PaginationQuery, SendMessageRequest},
    models::user::Role,
    services::messages::MessageService,
    services::users::UserService,
    AppState,
};

/// Sending requires a relationship to the recipient: an approved
/// parent/child link or a shared class through the sender's or recipient's
/// ownership of it. Admins may message anyone.
pub async fn send_message(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    if body.recipient_id == principal.id {
        return Err(ApiError::validation("cannot message yourself"));
    }
    UserService::get(&state.db, body.recipient_id).await?;

    if principal.role != Role::Admin
        && !MessageService::can_message(&state.db, principal.id, body.recipient_id).await?
    {
        return Err(ApiError::NotAuthorized);
    }

    let msg = MessageService::send(&state.db, principal.id, body.recipient_id, &body.body).await?;
    Ok((StatusCode::CREATED, Json(msg)))
}

/// The caller's own exchange with one counterpart; the query is bound to
/// the caller's id, so nothing foreign can be read here.
pub async fn get_conversation(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(user_id): Path<Uuid>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let messages = MessageService::conversation(
        &state.db,
        principal.id,
        user_id,
        pagination.per_page(),
        pagination.offset(),
    )
    .await?;
    Ok(Json(messages))
}

pub async fn get_conversations(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let summaries = MessageService::conversations(&state.db, principal.id).await?;
    Ok(Json(summaries))
}

/// Recipient-only; others get the same 404 as for an unknown id.
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Message>, ApiError> {
    let principal = Principal::load(&state.db, &auth).await?;
    let msg = MessageService::mark_read(&state.db, id, principal.id).await?;
    Ok(Json(msg))
}
