//! Request handlers for `/api/users`.

use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use tracing::debug;
use warden_auth::{LoginInput, RegisterInput};
use warden_core::error::WardenError;
use warden_core::repository::AccountDirectory;

use crate::api::dto::{
    AvatarResponse, CurrentUserResponse, HealthResponse, LoginRequest, LoginResponse,
    MessageResponse, RegisterRequest, RegisterResponse, ResendVerificationRequest,
    SessionUser, SubscriptionRequest, SubscriptionResponse,
};
use crate::api::extract::{ApiJson, CurrentSession};
use crate::api::routes::AppState;
use crate::error::{ApiError, ApiResult};
use crate::validation;

/// Multipart field carrying the avatar file.
pub const AVATAR_FIELD: &str = "avatar";

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn register<D>(
    State(state): State<Arc<AppState<D>>>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)>
where
    D: AccountDirectory + Clone + 'static,
{
    let min = state.service.config().min_password_length;
    let input = RegisterInput {
        name: validation::name(body.name)?,
        email: validation::email(body.email)?,
        password: validation::password(body.password, min)?,
    };

    let account = state.service.register(input).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

pub async fn login<D>(
    State(state): State<Arc<AppState<D>>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>>
where
    D: AccountDirectory + Clone + 'static,
{
    let min = state.service.config().min_password_length;
    let input = LoginInput {
        email: validation::email(body.email)?,
        password: validation::password(body.password, min)?,
    };

    let out = state.service.login(input).await?;
    Ok(Json(LoginResponse {
        token: out.token,
        user: SessionUser {
            email: out.account.email,
            subscription: out.account.subscription,
            avatar_url: out.account.avatar_url,
        },
    }))
}

pub async fn logout<D>(
    State(state): State<Arc<AppState<D>>>,
    session: CurrentSession,
) -> ApiResult<Json<MessageResponse>>
where
    D: AccountDirectory + Clone + 'static,
{
    state
        .service
        .logout(session.account.id, &session.token)
        .await?;
    Ok(Json(MessageResponse {
        message: "Logout successful",
    }))
}

pub async fn current(session: CurrentSession) -> Json<CurrentUserResponse> {
    Json(session.account.into())
}

pub async fn update_subscription<D>(
    State(state): State<Arc<AppState<D>>>,
    session: CurrentSession,
    ApiJson(body): ApiJson<SubscriptionRequest>,
) -> ApiResult<Json<SubscriptionResponse>>
where
    D: AccountDirectory + Clone + 'static,
{
    let subscription = validation::required(body.subscription, "subscription")?;
    let account = state
        .service
        .change_subscription(session.account.id, &subscription)
        .await?;

    Ok(Json(SubscriptionResponse {
        email: account.email,
        subscription: account.subscription,
    }))
}

pub async fn update_avatar<D>(
    State(state): State<Arc<AppState<D>>>,
    session: CurrentSession,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<AvatarResponse>)>
where
    D: AccountDirectory + Clone + 'static,
{
    let mut multipart =
        multipart.map_err(|rejection| ApiError(WardenError::validation(rejection.body_text())))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AVATAR_FIELD) {
            debug!(field = ?field.name(), "Ignoring multipart field");
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| WardenError::validation("avatar must be sent as a file"))?;
        let bytes = field.bytes().await?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload
        .ok_or_else(|| WardenError::validation(format!("missing required field {AVATAR_FIELD}")))?;

    let staged = state
        .service
        .avatars()
        .stage(&bytes, &filename)
        .await
        .map_err(WardenError::from)?;
    let account = state
        .service
        .replace_avatar(session.account.id, staged)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AvatarResponse {
            avatar_url: account.avatar_url,
        }),
    ))
}

pub async fn verify_email<D>(
    State(state): State<Arc<AppState<D>>>,
    Path(token): Path<String>,
) -> ApiResult<Json<MessageResponse>>
where
    D: AccountDirectory + Clone + 'static,
{
    state.service.verify_email(&token).await?;
    Ok(Json(MessageResponse {
        message: "Verification successful",
    }))
}

pub async fn resend_verification<D>(
    State(state): State<Arc<AppState<D>>>,
    ApiJson(body): ApiJson<ResendVerificationRequest>,
) -> ApiResult<Json<MessageResponse>>
where
    D: AccountDirectory + Clone + 'static,
{
    let email = validation::email(body.email)?;
    state.service.resend_verification(&email).await?;
    Ok(Json(MessageResponse {
        message: "Verification email sent",
    }))
}
