//! Auth Middleware
//!
//! Three layers, outermost first:
//! - `session_layer` resumes or starts the session, enforces the
//!   lifetime, and writes the cookie on the way out
//! - `csrf_guard` rejects state-changing requests without a valid token
//! - `require_role_guard` redirects requests the access rules refuse

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::application::access::{self, TIMEOUT_PATH};
use crate::application::config::AuthConfig;
use crate::application::csrf;
use crate::application::session_manager::AuthSessionManager;
use crate::domain::entity::SessionContext;
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::{Role, SessionId};
use crate::error::AuthError;

/// Header carrying the anti-forgery token on state-changing requests
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Per-request session context shared between the session layer and
/// the handlers downstream of it
#[derive(Clone)]
pub struct SessionHandle(pub Arc<Mutex<SessionContext>>);

impl SessionHandle {
    pub fn new(ctx: SessionContext) -> Self {
        Self(Arc::new(Mutex::new(ctx)))
    }
}

/// State for the session layer
#[derive(Clone)]
pub struct SessionLayerState<R>
where
    R: SessionStore + UserRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
}

/// Session lifecycle middleware.
///
/// Resumes the session named by the cookie (or starts anonymous),
/// enforces the lifetime, and threads a [`SessionHandle`] through the
/// request. After the handler runs it persists the record and emits the
/// Set-Cookie header; a cleared session gets an expiring cookie
/// instead. A timed-out session never reaches the handler: the request
/// is answered with a redirect carrying the timeout marker.
pub async fn session_layer<R>(
    State(state): State<SessionLayerState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: SessionStore + UserRepository + Clone + Send + Sync + 'static,
{
    let headers = req.headers().clone();
    let peer = req
        .extensions()
        .get::<axum::extract::ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());

    let cookie_id = platform::cookie::extract_cookie(&headers, &state.config.session_cookie_name)
        .and_then(|v| Uuid::parse_str(&v).ok())
        .map(SessionId::from_uuid);

    let manager = AuthSessionManager::new(
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );
    let mut ctx = manager.resume_or_start(cookie_id).await;

    // Secure flag follows the effective scheme, honoring forwarded
    // headers only per the configured proxy trust
    let trust = state.config.proxy_trust();
    let secure = platform::proxy::is_tls(&headers, state.config.direct_tls, peer, &trust);
    let cookie = state.config.cookie_config(secure);

    if manager.check_timeout(&mut ctx).await {
        let client_ip = platform::proxy::client_ip(&headers, peer, &trust);
        tracing::info!(client_ip = ?client_ip, "Redirecting timed-out session to login");

        // Absolute redirect against the client-facing host when known
        let target = match platform::proxy::effective_host(&headers, peer, &trust) {
            Some(host) => {
                let scheme = if secure { "https" } else { "http" };
                format!("{scheme}://{host}{TIMEOUT_PATH}")
            }
            None => TIMEOUT_PATH.to_string(),
        };

        let mut response = Redirect::to(&target).into_response();
        response.headers_mut().append(
            header::SET_COOKIE,
            platform::cookie::delete_cookie_header(&cookie),
        );
        return response;
    }

    let handle = SessionHandle::new(ctx);
    req.extensions_mut().insert(handle.clone());

    let mut response = next.run(req).await;

    let ctx = handle.0.lock().await;
    if let Err(e) = manager.persist(&ctx).await {
        e.log();
        tracing::warn!(session_id = %ctx.session_id, "Failed to persist session");
    }

    let set_cookie = if ctx.cleared {
        platform::cookie::delete_cookie_header(&cookie)
    } else {
        let cookie = match ctx.cookie_max_age {
            Some(max_age) => cookie.with_max_age(max_age),
            None => cookie,
        };
        platform::cookie::set_cookie_header(&cookie, &ctx.session_id.to_string())
    };
    response.headers_mut().append(header::SET_COOKIE, set_cookie);

    response
}

/// Role requirement attached to a protected route group
#[derive(Clone)]
pub struct RoleGuard {
    pub required: Arc<Vec<Role>>,
}

impl RoleGuard {
    pub fn new(required: Vec<Role>) -> Self {
        Self {
            required: Arc::new(required),
        }
    }
}

/// Middleware enforcing the role requirement.
///
/// Refused requests are redirected (login page for anonymous, forbidden
/// page for an insufficient role) and never reach the handler.
pub async fn require_role_guard(
    State(guard): State<RoleGuard>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(handle) = req.extensions().get::<SessionHandle>().cloned() else {
        // No session layer upstream: fail closed
        tracing::error!("Role guard installed without session layer");
        return Redirect::to(access::LOGIN_PATH).into_response();
    };

    let denial = {
        let ctx = handle.0.lock().await;
        access::require_role(&ctx.record, &guard.required).err()
    };

    match denial {
        None => next.run(req).await,
        Some(denial) => Redirect::to(denial.redirect_target()).into_response(),
    }
}

/// CSRF middleware.
///
/// State-changing methods must carry the session's token in the
/// [`CSRF_HEADER`] header; everything else passes through. Mismatches
/// are terminated with 403 before the handler runs.
pub async fn csrf_guard(req: Request<Body>, next: Next) -> Response {
    if !matches!(
        *req.method(),
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    ) {
        return next.run(req).await;
    }

    let Some(handle) = req.extensions().get::<SessionHandle>().cloned() else {
        tracing::error!("CSRF guard installed without session layer");
        return AuthError::CsrfMismatch.into_response();
    };

    let candidate = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let valid = {
        let ctx = handle.0.lock().await;
        csrf::verify(&ctx.record, &candidate)
    };

    if valid {
        next.run(req).await
    } else {
        AuthError::CsrfMismatch.into_response()
    }
}
