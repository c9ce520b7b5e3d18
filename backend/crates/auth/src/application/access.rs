//! Access Control
//!
//! Pure role decisions over the current session. Nothing here touches
//! storage; guards return a [`Denial`] whose redirect target the
//! presentation layer turns into a terminating response.

use crate::domain::entity::SessionRecord;
use crate::domain::value_object::Role;

/// Fixed redirect target for unauthenticated requests
pub const LOGIN_PATH: &str = "/login";
/// Fixed redirect target for authenticated but unauthorized requests
pub const FORBIDDEN_PATH: &str = "/forbidden";
/// Login redirect carrying the timed-out marker
pub const TIMEOUT_PATH: &str = "/login?timeout=1";

/// Why a guard refused the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NotLoggedIn,
    InsufficientRole,
}

impl Denial {
    /// Where the refused request is redirected
    pub fn redirect_target(&self) -> &'static str {
        match self {
            Denial::NotLoggedIn => LOGIN_PATH,
            Denial::InsufficientRole => FORBIDDEN_PATH,
        }
    }
}

/// True iff the session carries a full authenticated identity
pub fn is_logged_in(record: &SessionRecord) -> bool {
    record.is_authenticated()
}

/// Role-set satisfaction per [`Role::satisfies`]; anonymous sessions
/// satisfy nothing
pub fn has_role(record: &SessionRecord, required: &[Role]) -> bool {
    match record.role() {
        Some(role) => role.satisfies(required),
        None => false,
    }
}

/// Guard: the caller must stop handling the request on `Err`
pub fn require_login(record: &SessionRecord) -> Result<(), Denial> {
    if is_logged_in(record) {
        Ok(())
    } else {
        Err(Denial::NotLoggedIn)
    }
}

/// Guard: login first, then the role table
pub fn require_role(record: &SessionRecord, required: &[Role]) -> Result<(), Denial> {
    require_login(record)?;
    if has_role(record, required) {
        Ok(())
    } else {
        Err(Denial::InsufficientRole)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{Identity, SessionRecord};
    use crate::domain::value_object::{Email, UserId};
    use chrono::Utc;

    fn session_with(role: Role) -> SessionRecord {
        SessionRecord {
            identity: Identity::Authenticated {
                user_id: UserId::new(),
                user_name: "Test".to_string(),
                user_email: Email::new("t@example.com").unwrap(),
                role,
                login_time: Utc::now(),
            },
            csrf_token: None,
        }
    }

    #[test]
    fn test_anonymous_satisfies_nothing() {
        let record = SessionRecord::anonymous();
        assert!(!is_logged_in(&record));
        assert!(!has_role(&record, &[Role::Customer]));
        assert!(!has_role(&record, &[Role::Admin, Role::Staff, Role::Customer]));
    }

    #[test]
    fn test_require_login_redirects_to_login() {
        let err = require_login(&SessionRecord::anonymous()).unwrap_err();
        assert_eq!(err, Denial::NotLoggedIn);
        assert_eq!(err.redirect_target(), LOGIN_PATH);

        assert!(require_login(&session_with(Role::Customer)).is_ok());
    }

    #[test]
    fn test_require_role_checks_login_first() {
        let err = require_role(&SessionRecord::anonymous(), &[Role::Customer]).unwrap_err();
        // Anonymous goes to the login page, not the forbidden page
        assert_eq!(err, Denial::NotLoggedIn);
    }

    #[test]
    fn test_require_role_redirects_to_forbidden() {
        let err = require_role(&session_with(Role::Customer), &[Role::Admin]).unwrap_err();
        assert_eq!(err, Denial::InsufficientRole);
        assert_eq!(err.redirect_target(), FORBIDDEN_PATH);
    }

    #[test]
    fn test_staff_passes_customer_areas() {
        assert!(require_role(&session_with(Role::Staff), &[Role::Customer]).is_ok());
        assert!(require_role(&session_with(Role::Staff), &[Role::Staff]).is_ok());
        assert!(require_role(&session_with(Role::Staff), &[Role::Admin]).is_err());
    }

    #[test]
    fn test_admin_passes_everything() {
        for required in [&[Role::Customer][..], &[Role::Staff], &[Role::Admin]] {
            assert!(require_role(&session_with(Role::Admin), required).is_ok());
        }
    }
}
