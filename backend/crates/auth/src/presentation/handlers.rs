//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;

use crate::application::config::AuthConfig;
use crate::application::csrf;
use crate::application::session_manager::AuthSessionManager;
use crate::application::sign_in::SignInUseCase;
use crate::domain::repository::{SessionStore, UserRepository};
use crate::error::AuthResult;
use crate::presentation::dto::{CsrfResponse, LoginRequest, SessionResponse, UserView};
use crate::presentation::middleware::SessionHandle;

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: SessionStore + UserRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

/// POST /api/auth/login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    Extension(session): Extension<SessionHandle>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<SessionResponse>>
where
    R: SessionStore + UserRepository + Clone + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let mut ctx = session.0.lock().await;
    use_case
        .execute(&mut ctx, &req.email, &req.password, req.remember_me)
        .await?;

    Ok(Json(SessionResponse {
        logged_in: true,
        user: UserView::from_record(&ctx.record),
    }))
}

/// POST /api/auth/logout
pub async fn logout<R>(
    State(state): State<AuthAppState<R>>,
    Extension(session): Extension<SessionHandle>,
) -> AuthResult<StatusCode>
where
    R: SessionStore + UserRepository + Clone + Send + Sync + 'static,
{
    let manager = AuthSessionManager::new(
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let mut ctx = session.0.lock().await;
    manager.logout(&mut ctx).await;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/session
pub async fn session_status(Extension(session): Extension<SessionHandle>) -> Json<SessionResponse> {
    let ctx = session.0.lock().await;

    Json(SessionResponse {
        logged_in: ctx.record.is_authenticated(),
        user: UserView::from_record(&ctx.record),
    })
}

/// GET /api/auth/csrf
///
/// Returns the session's anti-forgery token, generating it on first
/// call. Clients send it back in the `X-CSRF-Token` header.
pub async fn csrf_token(Extension(session): Extension<SessionHandle>) -> Json<CsrfResponse> {
    let mut ctx = session.0.lock().await;

    Json(CsrfResponse {
        csrf_token: csrf::get_or_create_token(&mut ctx.record),
    })
}
