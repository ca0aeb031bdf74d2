use chrono::Utc;
use uuid::Uuid;

use phonepass_auth_types::token::generate_token_key;

use crate::domain::repository::{AuthTokenRepository, UserRepository};
use crate::domain::types::{AuthToken, User};
use crate::error::AccountsServiceError;

// ── TokenIssuer ──────────────────────────────────────────────────────────────

/// Get-or-create bearer tokens. Concurrent verifications for one user all
/// receive the same stored key.
pub struct TokenIssuer<T: AuthTokenRepository> {
    pub tokens: T,
}

impl<T: AuthTokenRepository> TokenIssuer<T> {
    pub async fn issue(&self, user_id: Uuid) -> Result<AuthToken, AccountsServiceError> {
        let candidate = AuthToken {
            key: generate_token_key(),
            user_id,
            created_at: Utc::now(),
        };
        self.tokens.get_or_create(&candidate).await
    }
}

// ── Authenticate ─────────────────────────────────────────────────────────────

/// Resolve a presented bearer key to an active user.
pub struct AuthenticateUseCase<T, U>
where
    T: AuthTokenRepository,
    U: UserRepository,
{
    pub tokens: T,
    pub users: U,
}

impl<T, U> AuthenticateUseCase<T, U>
where
    T: AuthTokenRepository,
    U: UserRepository,
{
    pub async fn execute(&self, key: &str) -> Result<User, AccountsServiceError> {
        let token = self
            .tokens
            .find_by_key(key)
            .await?
            .ok_or(AccountsServiceError::InvalidToken)?;
        let user = self
            .users
            .find_by_id(token.user_id)
            .await?
            .ok_or(AccountsServiceError::InvalidToken)?;
        if !user.is_active {
            return Err(AccountsServiceError::InvalidToken);
        }
        Ok(user)
    }
}
