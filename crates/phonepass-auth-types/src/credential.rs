//! `Authorization: Bearer` extractor.

use axum::extract::FromRequestParts;
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use http::request::Parts;
use http::{HeaderMap, StatusCode};

use crate::token::is_well_formed;

/// Well-formed bearer key from `Authorization`, if any.
pub fn bearer_key(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_owned())
        .filter(|key| is_well_formed(key))
}

/// Raw bearer token key presented by the client.
///
/// Returns 401 if the header is absent, uses another scheme, or the key is
/// not shaped like a token issued by the accounts service. Resolving the key
/// to a user is left to the service that owns token storage.
#[derive(Debug, Clone)]
pub struct BearerCredential(pub String);

impl<S> FromRequestParts<S> for BearerCredential
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let key = bearer_key(&parts.headers);

        async move {
            let key = key.ok_or(StatusCode::UNAUTHORIZED)?;
            Ok(Self(key))
        }
    }
}
