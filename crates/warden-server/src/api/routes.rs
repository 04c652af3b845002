use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use warden_auth::AccountService;
use warden_core::repository::AccountDirectory;

use crate::api::handlers::{
    current, health, login, logout, register, resend_verification, update_avatar,
    update_subscription, verify_email,
};

/// Multipart framing allowance on top of the raw file size.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Application state shared by all handlers.
pub struct AppState<D: AccountDirectory + Clone> {
    pub service: AccountService<D>,
}

pub fn create_router<D>(service: AccountService<D>) -> Router
where
    D: AccountDirectory + Clone + 'static,
{
    let avatar_config = service.avatars().config().clone();
    let state = Arc::new(AppState { service });

    let users = Router::new()
        .route("/register", post(register::<D>))
        .route("/login", post(login::<D>))
        .route("/logout", get(logout::<D>))
        .route("/current", get(current))
        .route("/users", patch(update_subscription::<D>))
        .route(
            "/avatars",
            patch(update_avatar::<D>).layer(DefaultBodyLimit::max(
                avatar_config.max_upload_bytes + MULTIPART_OVERHEAD,
            )),
        )
        .route("/verify/:token", get(verify_email::<D>))
        .route("/verify", post(resend_verification::<D>));

    Router::new()
        .route("/health", get(health))
        .nest("/api/users", users)
        .nest_service(
            &avatar_config.url_prefix,
            ServeDir::new(&avatar_config.public_dir),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
