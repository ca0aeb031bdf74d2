use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use phonepass_auth_types::credential::bearer_key;

use crate::domain::types::User;
use crate::error::AccountsServiceError;
use crate::state::AppState;
use crate::usecase::token::AuthenticateUseCase;

/// The active user owning the presented bearer token.
///
/// Missing, malformed or unknown keys and inactive users are all INVALID_TOKEN.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AccountsServiceError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let key = bearer_key(&parts.headers);
        let usecase = AuthenticateUseCase {
            tokens: state.auth_token_repo(),
            users: state.user_repo(),
        };

        async move {
            let key = key.ok_or(AccountsServiceError::InvalidToken)?;
            let user = usecase.execute(&key).await?;
            Ok(Self(user))
        }
    }
}
