//! Application Configuration
//!
//! Configuration for the auth application layer.

use std::net::IpAddr;
use std::time::Duration;

use platform::cookie::{CookieConfig, SameSite};
use platform::proxy::ProxyTrust;

/// Auth application configuration
///
/// Lockout duration and session lifetime are deliberately independent
/// knobs; one governs failed-login suspension, the other authenticated
/// session age.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// Maximum authenticated session age (1 hour)
    pub session_lifetime: Duration,
    /// Cookie lifetime when "remember me" is checked (30 days)
    pub remember_me_lifetime: Duration,
    /// Failed logins before the account locks
    pub lockout_threshold: u32,
    /// How long a locked account stays locked (30 minutes)
    pub lockout_duration: Duration,
    /// SameSite policy for the session cookie
    pub cookie_same_site: SameSite,
    /// True when this process terminates TLS itself
    pub direct_tls: bool,
    /// Peers whose X-Forwarded-* headers are honored; None trusts all
    pub trusted_proxies: Option<Vec<IpAddr>>,
    /// Development switch: include raw error detail in responses
    pub expose_error_detail: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "shop_session".to_string(),
            session_lifetime: Duration::from_secs(3600),
            remember_me_lifetime: Duration::from_secs(30 * 24 * 3600),
            lockout_threshold: 5,
            lockout_duration: Duration::from_secs(1800),
            cookie_same_site: SameSite::Lax,
            direct_tls: false,
            trusted_proxies: None,
            expose_error_detail: false,
        }
    }
}

impl AuthConfig {
    /// Create config for development (raw error detail shown)
    pub fn development() -> Self {
        Self {
            expose_error_detail: true,
            ..Default::default()
        }
    }

    /// Session lifetime in whole seconds
    pub fn session_lifetime_secs(&self) -> i64 {
        self.session_lifetime.as_secs() as i64
    }

    /// Session lifetime as a chrono duration (for timestamp math)
    pub fn session_lifetime_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_lifetime_secs())
    }

    /// Lockout duration as a chrono duration
    pub fn lockout_duration_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.lockout_duration.as_secs() as i64)
    }

    /// Forwarded-header trust policy for this deployment
    pub fn proxy_trust(&self) -> ProxyTrust {
        match &self.trusted_proxies {
            Some(peers) => ProxyTrust::allow_list(peers.clone()),
            None => ProxyTrust::trust_all(),
        }
    }

    /// Session cookie template; `secure` is decided per request from
    /// TLS detection
    pub fn cookie_config(&self, secure: bool) -> CookieConfig {
        CookieConfig {
            name: self.session_cookie_name.clone(),
            secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: Some(self.session_lifetime_secs()),
        }
    }
}
