//! Pluggable authentication for the scheduler HTTP transport.
//!
//! An [`AuthProvider`] hands the transport a [`Credentials`] value (or nothing)
//! and supplies the diagnostic printed when the scheduler rejects them. The
//! transport resolves credentials per request host, so one provider works for
//! every scheduler a session fails over to.

mod netrc;

pub use netrc::{default_netrc_path, Netrc, NetrcEntry};

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Basic username/password pair applied to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Transport-layer credentials produced by an [`AuthProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// The same basic credentials for every host.
    Basic(BasicCredentials),
    /// Basic credentials looked up per host in a netrc file.
    Netrc { path: PathBuf },
}

impl Credentials {
    /// Credentials to send to `host`, if any apply.
    pub fn basic_for_host(&self, host: &str) -> Option<BasicCredentials> {
        match self {
            Credentials::Basic(basic) => Some(basic.clone()),
            Credentials::Netrc { path } => {
                let netrc = match Netrc::load(path) {
                    Ok(n) => n,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), "cannot read netrc: {}", e);
                        return None;
                    }
                };
                let entry = netrc.authenticators(host)?;
                Some(BasicCredentials {
                    username: entry.login.clone().or_else(|| entry.account.clone())?,
                    password: entry.password.clone().unwrap_or_default(),
                })
            }
        }
    }
}

/// Authentication strategy used by the scheduler client.
pub trait AuthProvider: Send + Sync {
    /// Stable identifier, e.g. `"BASIC"` or `"UNAUTHENTICATED"`.
    fn mechanism(&self) -> &str;

    /// Credentials for the HTTP transport; `None` sends requests unauthenticated.
    fn auth(&self) -> Option<Credentials>;

    /// Help text logged and surfaced when the scheduler rejects the credentials.
    fn failed_auth_message(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InsecureAuth;

impl AuthProvider for InsecureAuth {
    fn mechanism(&self) -> &str {
        "UNAUTHENTICATED"
    }

    fn auth(&self) -> Option<Credentials> {
        None
    }

    fn failed_auth_message(&self) -> String {
        String::new()
    }
}

/// HTTP basic auth with credentials taken from a netrc file.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    netrc_file: PathBuf,
}

impl BasicAuth {
    pub fn new(netrc_file: impl Into<PathBuf>) -> Self {
        Self {
            netrc_file: netrc_file.into(),
        }
    }

    pub fn netrc_file(&self) -> &std::path::Path {
        &self.netrc_file
    }
}

impl AuthProvider for BasicAuth {
    fn mechanism(&self) -> &str {
        "BASIC"
    }

    fn auth(&self) -> Option<Credentials> {
        Some(Credentials::Netrc {
            path: self.netrc_file.clone(),
        })
    }

    fn failed_auth_message(&self) -> String {
        format!(
            "Communication with the scheduler is unauthorized; check the credentials in {}.",
            self.netrc_file.display()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("unknown auth mechanism {0:?}")]
    UnknownMechanism(String),
    #[error("no netrc file available for BASIC auth (HOME is not set)")]
    NoNetrc,
}

/// Builds the provider a cluster's `auth_mechanism` names.
pub type AuthFactory = Arc<dyn Fn(&str) -> Result<Arc<dyn AuthProvider>, AuthError> + Send + Sync>;

/// Default mechanism registry: `UNAUTHENTICATED` and `BASIC` (`~/.netrc`).
pub fn get_auth_handler(mechanism: &str) -> Result<Arc<dyn AuthProvider>, AuthError> {
    match mechanism.to_ascii_uppercase().as_str() {
        "UNAUTHENTICATED" => Ok(Arc::new(InsecureAuth)),
        "BASIC" => {
            let path = default_netrc_path().ok_or(AuthError::NoNetrc)?;
            Ok(Arc::new(BasicAuth::new(path)))
        }
        _ => Err(AuthError::UnknownMechanism(mechanism.to_string())),
    }
}

/// [`get_auth_handler`] as an [`AuthFactory`].
pub fn default_auth_factory() -> AuthFactory {
    Arc::new(get_auth_handler)
}
