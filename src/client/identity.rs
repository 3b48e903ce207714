use std::fmt;

/// Routing identity of one client session.
///
/// Rendered as a single `"{session_name}-{client_id}"` token, which is what
/// the server sees as the socket address and what every log line carries.
/// Immutable for the life of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    session_name: String,
    client_id: u32,
}

impl SessionIdentity {
    pub fn new(session_name: impl Into<String>, client_id: u32) -> Self {
        Self {
            session_name: session_name.into(),
            client_id,
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn client_id(&self) -> u32 {
        self.client_id
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.session_name, self.client_id)
    }
}

/// Plain username/password pair presented in the greeting frame.
/// Derived from the session name and session key of the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainCredentials {
    pub username: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_rendering() {
        let identity = SessionIdentity::new("test", 0);
        assert_eq!(identity.to_string(), "test-0");
        assert_eq!(identity.session_name(), "test");
        assert_eq!(identity.client_id(), 0);
    }

    #[test]
    fn test_identity_rendering_multi_digit() {
        let identity = SessionIdentity::new("stored-session", 42);
        assert_eq!(identity.to_string(), "stored-session-42");
    }
}
