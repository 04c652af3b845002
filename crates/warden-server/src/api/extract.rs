//! Extractors shared by the handlers.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use warden_core::error::WardenError;
use warden_core::models::account::Account;
use warden_core::repository::AccountDirectory;

use crate::api::routes::AppState;
use crate::error::ApiError;

/// `axum::Json` with rejections rendered as validation errors.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// The authenticated account and the bearer token it presented.
#[derive(Debug)]
pub struct CurrentSession {
    pub account: Account,
    pub token: String,
}

fn not_authorized() -> ApiError {
    ApiError(WardenError::AuthenticationFailed {
        reason: "Not authorized".into(),
    })
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl<D> FromRequestParts<Arc<AppState<D>>> for CurrentSession
where
    D: AccountDirectory + Clone + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<D>>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(not_authorized)?.to_string();
        let account = state.service.authenticate(&token).await?;
        Ok(Self { account, token })
    }
}
