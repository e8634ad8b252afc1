use secrecy::SecretString;

/// Username/password pair sent as a standard `Authorization: Basic` header.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: SecretString,
}

/// Credentials for authenticating with the Lokal daemon.
///
/// Basic auth and the API token are independent: either, both, or neither
/// may be set. The token travels in `X-Auth-Token`, the basic pair in
/// `Authorization`, so the daemon sees both when both are configured.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub basic: Option<BasicAuth>,
    pub api_token: Option<SecretString>,
}

impl Credentials {
    /// Credentials carrying only a username/password pair.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::default().with_basic(username, password)
    }

    /// Credentials carrying only an API token.
    pub fn api_token(token: impl Into<String>) -> Self {
        Self::default().with_api_token(token)
    }

    pub fn with_basic(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic = Some(BasicAuth {
            username: username.into(),
            password: SecretString::from(password.into()),
        });
        self
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::from(token.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.basic.is_none() && self.api_token.is_none()
    }

    /// Overlay `other` onto `self`: parts present in `other` replace ours,
    /// absent parts leave ours untouched.
    pub(crate) fn overlay(&mut self, other: Credentials) {
        if other.basic.is_some() {
            self.basic = other.basic;
        }
        if other.api_token.is_some() {
            self.api_token = other.api_token;
        }
    }
}
