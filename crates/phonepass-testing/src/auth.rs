//! Bearer credential helpers for HTTP tests.

use http::HeaderValue;

use phonepass_auth_types::token::generate_token_key;

/// Token key presented on test requests.
pub struct MockBearer {
    pub key: String,
}

impl MockBearer {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// A well-formed key that no token store knows about.
    pub fn random() -> Self {
        Self::new(generate_token_key())
    }

    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {}", self.key)).unwrap()
    }
}
