//! Per-connection HTTP session defaults (headers sent with every request).

use std::collections::BTreeMap;
use std::sync::Arc;

/// Header asking the receiving scheduler to serve the request itself instead of
/// redirecting it to the elected leader. Shared with the scheduler's API.
pub const BYPASS_LEADER_REDIRECT_HEADER_NAME: &str = "Bypass-Leader-Redirect";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpSession {
    headers: BTreeMap<String, String>,
}

impl HttpSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any existing value under the same name
    /// (names compare case-insensitively).
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Builds a fresh session each time a transport opens.
pub type SessionFactory = Arc<dyn Fn() -> HttpSession + Send + Sync>;

pub fn bypass_leader_redirect_session_factory(should_bypass: bool) -> SessionFactory {
    Arc::new(move || {
        let mut session = HttpSession::new();
        if should_bypass {
            session.set_header(BYPASS_LEADER_REDIRECT_HEADER_NAME, "true");
        }
        session
    })
}
