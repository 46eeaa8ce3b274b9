// Session context - bearer token injected into every remote call
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Opaque bearer token issued by the auth service.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// The session has no token, or the remote side refused it.
/// Callers should send the user back to the login entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("session expired, log in again")]
pub struct SessionExpired;

/// Shared handle to the current session token.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    token: Arc<RwLock<Option<BearerToken>>>,
}

impl SessionContext {
    pub fn new(token: Option<BearerToken>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token)),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Result<BearerToken, SessionExpired> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SessionExpired)
    }

    pub fn is_active(&self) -> bool {
        self.token.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    pub fn sign_in(&self, token: BearerToken) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_is_expired() {
        let session = SessionContext::anonymous();
        assert_eq!(session.token(), Err(SessionExpired));
        assert!(!session.is_active());
    }

    #[test]
    fn test_clear_is_visible_to_clones() {
        let session = SessionContext::new(Some(BearerToken::new("abc")));
        let other = session.clone();
        assert_eq!(other.token().unwrap().header_value(), "Bearer abc");

        session.clear();
        assert!(other.token().is_err());
    }

    #[test]
    fn test_sign_in_after_expiry_restores_session() {
        let session = SessionContext::anonymous();
        let other = session.clone();

        session.sign_in(BearerToken::new("fresh"));
        assert!(other.is_active());
        assert_eq!(other.token().unwrap().as_str(), "fresh");
    }

    #[test]
    fn test_debug_hides_token() {
        assert_eq!(format!("{:?}", BearerToken::new("secret")), "BearerToken(***)");
    }
}
