//! Handles credentials for the service endpoint.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// How to authenticate against the server.
///
/// The server does not follow the HTTP challenge/response model, so the
/// Authorization header is attached up front on every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Call anonymously; no Authorization header is sent.
    Anonymous,
    /// Basic authentication, attached to every request.
    Basic {
        /// The username to authenticate with.
        username: String,
        /// The password to authenticate with.
        password: String,
    },
}

impl Credentials {
    /// Builds credentials from optional settings.  Unless both values are
    /// present the result is [`Credentials::Anonymous`].
    pub fn new<T: Into<String>, U: Into<String>>(
        username: Option<T>,
        password: Option<U>,
    ) -> Self {
        match (username, password) {
            (Some(username), Some(password)) => Credentials::Basic {
                username: username.into(),
                password: password.into(),
            },
            _ => Credentials::Anonymous,
        }
    }

    /// The value of the Authorization header, if one should be sent.
    pub fn authorization(&self) -> Option<String> {
        match self {
            Credentials::Anonymous => None,
            Credentials::Basic { username, password } => {
                let encoded = BASE64.encode(format!("{}:{}", username, password));
                Some(format!("Basic {}", encoded))
            }
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Anonymous => f.write_str("Anonymous"),
            Credentials::Basic { username, .. } => f
                .debug_map()
                .entry(&"username", username)
                .entry(&"password", &"******")
                .finish(),
        }
    }
}

#[test]
fn test_basic_authorization() {
    let credentials = Credentials::new(Some("user"), Some("pass"));
    assert_eq!(
        credentials.authorization().as_deref(),
        Some("Basic dXNlcjpwYXNz")
    );
}

#[test]
fn test_anonymous_sends_nothing() {
    assert_eq!(Credentials::Anonymous.authorization(), None);
}

#[test]
fn test_partial_credentials_are_anonymous() {
    assert_eq!(
        Credentials::new(Some("user"), None::<String>),
        Credentials::Anonymous
    );
    assert_eq!(
        Credentials::new(None::<String>, Some("pass")),
        Credentials::Anonymous
    );
}
