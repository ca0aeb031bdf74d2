use chrono::Utc;

use phonepass_domain::phone::PhoneNumber;

use crate::domain::repository::{AuthCodeRepository, UserRepository};
use crate::domain::types::User;
use crate::error::AccountsServiceError;
use crate::usecase::directory::UserDirectory;
use crate::usecase::otp::OtpLifecycle;

// ── RequestCode ──────────────────────────────────────────────────────────────

pub struct RequestCodeInput {
    pub phone_number: String,
}

pub struct RequestCodeOutput {
    pub user: User,
    pub created: bool,
}

/// Fetch or create the account for a phone number and issue a fresh code.
/// Delivery happens later through the outbox; the code is never returned here.
pub struct RequestCodeUseCase<U, A>
where
    U: UserRepository,
    A: AuthCodeRepository,
{
    pub directory: UserDirectory<U>,
    pub otp: OtpLifecycle<A>,
}

impl<U, A> RequestCodeUseCase<U, A>
where
    U: UserRepository,
    A: AuthCodeRepository,
{
    pub async fn execute(
        &self,
        input: RequestCodeInput,
    ) -> Result<RequestCodeOutput, AccountsServiceError> {
        let phone = PhoneNumber::parse(&input.phone_number)
            .map_err(|_| AccountsServiceError::InvalidPhoneNumber)?;

        let (user, created) = self.directory.get_or_create_by_phone(&phone).await?;
        let code = self.otp.issue(&user, Utc::now()).await?;

        tracing::info!(user_id = %user.id, code_id = %code.id, created, "login code issued");
        Ok(RequestCodeOutput { user, created })
    }
}
