use super::error::{ERR_BODY, WebError, WebResult};
use super::extract::Authenticated;
use super::state::AppState;
use crate::context::RequestContext;
use crate::core::{Change, NewUser, Profile, ServiceError};
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdResponse {
    pub id: String,
}

/// Decodes a JSON body; any failure is reported as the same bad-input message.
fn decode<T: DeserializeOwned>(body: &[u8]) -> WebResult<T> {
    serde_json::from_slice(body).map_err(|err| {
        debug!(error = %err, "request body rejected");
        WebError::from(ServiceError::bad_input(ERR_BODY))
    })
}

pub async fn create_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: Bytes,
) -> WebResult<(StatusCode, Json<IdResponse>)> {
    let new_user: NewUser = decode(&body)?;
    let id = state.users.create(&ctx, new_user).await?;

    Ok((StatusCode::CREATED, Json(IdResponse { id })))
}

pub async fn confirm_user(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<Json<IdResponse>> {
    let id = state.users.confirm(&ctx, ctx.param("user_id")?).await?;
    Ok(Json(IdResponse { id }))
}

pub async fn all_profiles(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<Json<Vec<Profile>>> {
    Ok(Json(state.profiles.all(&ctx).await?))
}

pub async fn get_profile(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<Json<Profile>> {
    let profile = state.profiles.get(&ctx, ctx.param("profile_id")?).await?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    body: Bytes,
) -> WebResult<Json<Profile>> {
    let incoming: Profile = decode(&body)?;
    let profile = state
        .profiles
        .update(&ctx, incoming)
        .await
        .map_err(WebError::conceal)?;

    Ok(Json(profile))
}

pub async fn profile_history(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
) -> WebResult<Json<Vec<Change>>> {
    let history = state
        .profiles
        .history(&ctx, ctx.param("profile_id")?)
        .await
        .map_err(WebError::conceal)?;

    Ok(Json(history))
}
