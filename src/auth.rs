//! Per-call credentials for the mail provider.
//!
//! The core never looks credentials up from ambient session state —
//! every operation takes an `AccessCredentials` argument, which keeps
//! the fetch path stateless and testable. Token refresh is the
//! caller's problem.

use secrecy::{ExposeSecret, SecretString};

/// An OAuth access token (and optional refresh token) for one request.
#[derive(Clone)]
pub struct AccessCredentials {
    access_token: SecretString,
    refresh_token: Option<SecretString>,
}

impl AccessCredentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            refresh_token: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(SecretString::from(refresh_token.into()));
        self
    }

    /// The bearer token for `Authorization` headers.
    pub fn bearer(&self) -> &str {
        self.access_token.expose_secret()
    }

    pub fn has_token(&self) -> bool {
        !self.bearer().is_empty()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|t| t.expose_secret())
    }
}

impl std::fmt::Debug for AccessCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCredentials")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_exposes_token() {
        let creds = AccessCredentials::new("ya29.token");
        assert_eq!(creds.bearer(), "ya29.token");
        assert!(creds.has_token());
    }

    #[test]
    fn empty_token_detected() {
        let creds = AccessCredentials::new("");
        assert!(!creds.has_token());
    }

    #[test]
    fn debug_redacts_secrets() {
        let creds = AccessCredentials::new("secret").with_refresh_token("also-secret");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[redacted]"));
    }
}
