use chrono::Utc;

use phonepass_domain::code::OtpCode;
use phonepass_domain::phone::PhoneNumber;

use crate::domain::repository::{AuthCodeRepository, AuthTokenRepository, UserRepository};
use crate::domain::types::AuthToken;
use crate::error::AccountsServiceError;
use crate::usecase::otp::{CodeCheck, OtpLifecycle};
use crate::usecase::token::TokenIssuer;

// ── VerifyCode ───────────────────────────────────────────────────────────────

pub struct VerifyCodeInput {
    pub phone_number: String,
    pub code: String,
}

/// Exchange a phone number and one-time code for a bearer token.
pub struct VerifyCodeUseCase<U, A, T>
where
    U: UserRepository,
    A: AuthCodeRepository,
    T: AuthTokenRepository,
{
    pub users: U,
    pub otp: OtpLifecycle<A>,
    pub issuer: TokenIssuer<T>,
}

impl<U, A, T> VerifyCodeUseCase<U, A, T>
where
    U: UserRepository,
    A: AuthCodeRepository,
    T: AuthTokenRepository,
{
    pub async fn execute(&self, input: VerifyCodeInput) -> Result<AuthToken, AccountsServiceError> {
        let phone = PhoneNumber::parse(&input.phone_number)
            .map_err(|_| AccountsServiceError::InvalidPhoneNumber)?;
        let code = OtpCode::parse(&input.code).map_err(|_| AccountsServiceError::InvalidCodeFormat)?;

        let user = self
            .users
            .find_by_phone(phone.as_str())
            .await?
            .ok_or(AccountsServiceError::UserNotFound)?;

        let now = Utc::now();
        let auth_code = match self.otp.check(user.id, code.as_str(), now).await? {
            CodeCheck::Valid(auth_code) => auth_code,
            CodeCheck::Expired | CodeCheck::Missing => {
                return Err(AccountsServiceError::InvalidCode);
            }
        };
        // Losing a race with another verification of the same code lands here.
        if !self.otp.consume(&auth_code, now).await? {
            return Err(AccountsServiceError::InvalidCode);
        }

        if !user.is_active {
            tracing::info!(user_id = %user.id, "verification for disabled user");
            return Err(AccountsServiceError::UserDisabled);
        }
        if !user.is_verified {
            self.users.mark_verified(user.id).await?;
        }

        self.issuer.issue(user.id).await
    }
}
