//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entity::{Identity, SessionRecord};
use crate::domain::value_object::Role;

/// Request for POST /api/auth/login
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Authenticated user as exposed to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl UserView {
    /// The session's identity, when authenticated
    pub fn from_record(record: &SessionRecord) -> Option<Self> {
        match &record.identity {
            Identity::Authenticated {
                user_id,
                user_name,
                user_email,
                role,
                ..
            } => Some(Self {
                user_id: user_id.into_uuid(),
                name: user_name.clone(),
                email: user_email.as_str().to_string(),
                role: *role,
            }),
            Identity::Anonymous => None,
        }
    }
}

/// Response for POST /api/auth/login and GET /api/auth/session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
}

/// Response for GET /api/auth/csrf
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfResponse {
    pub csrf_token: String,
}
