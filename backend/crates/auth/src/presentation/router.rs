//! Auth Router

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::application::config::AuthConfig;
use crate::domain::repository::{SessionStore, UserRepository};
use crate::domain::value_object::Role;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{
    RoleGuard, SessionLayerState, csrf_guard, require_role_guard, session_layer,
};

/// Create the auth router with PostgreSQL repository
pub fn auth_router(repo: PgAuthRepository, config: AuthConfig) -> Router {
    auth_router_generic(repo, config)
}

/// Create a generic auth router for any repository implementation
pub fn auth_router_generic<R>(repo: R, config: AuthConfig) -> Router
where
    R: SessionStore + UserRepository + Clone + Send + Sync + 'static,
{
    let repo = Arc::new(repo);
    let config = Arc::new(config);
    let state = AuthAppState {
        repo: repo.clone(),
        config: config.clone(),
    };
    let layer_state = SessionLayerState { repo, config };

    // Layer order (outermost last): the session layer must run before
    // the CSRF guard, which must run before any handler
    Router::new()
        .route("/login", post(handlers::login::<R>))
        .route("/logout", post(handlers::logout::<R>))
        .route("/session", get(handlers::session_status))
        .route("/csrf", get(handlers::csrf_token))
        .layer(middleware::from_fn(csrf_guard))
        .layer(middleware::from_fn_with_state(
            layer_state,
            session_layer::<R>,
        ))
        .with_state(state)
}

/// Attach the session layer to a router outside this crate.
///
/// Application routers wrap themselves with this so their handlers see
/// the same [`SessionHandle`] the auth routes do.
///
/// [`SessionHandle`]: crate::presentation::middleware::SessionHandle
pub fn with_session<R>(router: Router, repo: Arc<R>, config: Arc<AuthConfig>) -> Router
where
    R: SessionStore + UserRepository + Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(
        SessionLayerState { repo, config },
        session_layer::<R>,
    ))
}

/// Wrap a router so every route in it requires one of `required`.
///
/// Must sit inside a router that carries the session layer.
pub fn protect(router: Router, required: Vec<Role>) -> Router {
    router.layer(middleware::from_fn_with_state(
        RoleGuard::new(required),
        require_role_guard,
    ))
}
