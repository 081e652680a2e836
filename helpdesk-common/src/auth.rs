use std::fmt;

/// Name of the header the backend reads the session token from.
pub const AUTH_HEADER: &str = "X-Auth-Token";

/// Credentials for talking to the backend. Handed to the client explicitly;
/// nothing in this crate reads tokens from ambient storage.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthContext {
    token: Option<String>,
}

impl AuthContext {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: (!token.is_empty()).then_some(token),
        }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

// Keep tokens out of logs.
impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token {
            Some(_) => write!(f, "AuthContext(<token>)"),
            None => write!(f, "AuthContext(anonymous)"),
        }
    }
}
