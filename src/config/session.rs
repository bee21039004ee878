//! Session cookie contract.
//!
//! The proxy itself never reads or writes sessions; this is a passive
//! configuration value handed to the wiring layer that mounts the proxy.
//! The defaults here are the contract: no resave, no uninitialized saves,
//! rolling renewal, 30-minute expiry, http-only, same-site strict, and a
//! secure flag that is forced on outside development mode.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::schema::RuntimeMode;

/// Session options as supplied in configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Secret used to sign the session ID. When absent, a random secret is
    /// generated at startup; it is ephemeral, so a restart invalidates all
    /// existing sessions.
    pub secret: Option<String>,

    /// Re-save unchanged sessions on every request.
    pub resave: bool,

    /// Persist sessions that were never written to.
    pub save_uninitialized: bool,

    /// Renew the cookie expiry on every request.
    pub rolling: bool,

    /// Cookie attributes.
    pub cookie: CookieOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            secret: None,
            resave: false,
            save_uninitialized: false,
            rolling: true,
            cookie: CookieOptions::default(),
        }
    }
}

/// Session cookie attributes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieOptions {
    /// Cookie lifetime in seconds.
    pub max_age_secs: u64,

    /// Hide the cookie from client-side scripts.
    pub http_only: bool,

    /// HTTPS-only cookie. Forced true outside development mode.
    pub secure: bool,

    /// SameSite attribute.
    pub same_site: SameSite,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            max_age_secs: 30 * 60,
            http_only: true,
            secure: false,
            same_site: SameSite::Strict,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// Session options after startup-time resolution.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub secret: String,
    /// True when the secret was generated rather than configured.
    pub ephemeral_secret: bool,
    pub resave: bool,
    pub save_uninitialized: bool,
    pub rolling: bool,
    pub cookie: CookieOptions,
}

impl SessionOptions {
    /// Resolve the session contract for the given runtime mode.
    ///
    /// Generates a random signing secret when none is configured and forces
    /// the secure flag outside development mode.
    pub fn resolve(self, mode: RuntimeMode) -> ResolvedSession {
        let ephemeral_secret = self.secret.is_none();
        let secret = self
            .secret
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if ephemeral_secret {
            tracing::warn!(
                "No session secret configured; using an ephemeral secret. \
                 A restart will invalidate all existing sessions"
            );
        }

        let mut cookie = self.cookie;
        if mode != RuntimeMode::Development {
            cookie.secure = true; // https only
        }

        ResolvedSession {
            secret,
            ephemeral_secret,
            resave: self.resave,
            save_uninitialized: self.save_uninitialized,
            rolling: self.rolling,
            cookie,
        }
    }
}
