use anyhow::anyhow;
use chrono::Utc;

use phonepass_domain::code::generate_referral_code;
use phonepass_domain::phone::PhoneNumber;

use crate::domain::repository::UserRepository;
use crate::domain::types::{CodeAssignment, InsertOutcome, REFERRAL_CODE_ATTEMPTS, User};
use crate::error::AccountsServiceError;

/// Phone-keyed account lookup with atomic creation.
///
/// Creation is an insert that does nothing on a phone conflict, so racing
/// logins for one number converge on a single row. Referral codes are
/// attached in the same insert; a collision on the unique referral code
/// retries with a fresh one.
pub struct UserDirectory<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> UserDirectory<R> {
    /// Returns the user and whether this call created it.
    pub async fn get_or_create_by_phone(
        &self,
        phone: &PhoneNumber,
    ) -> Result<(User, bool), AccountsServiceError> {
        for _ in 0..REFERRAL_CODE_ATTEMPTS {
            let candidate = User::new(
                phone.as_str().to_owned(),
                Some(generate_referral_code().into_inner()),
                Utc::now(),
            );
            match self.repo.insert_if_absent(&candidate).await? {
                InsertOutcome::Inserted => return Ok((candidate, true)),
                InsertOutcome::PhoneTaken => {
                    let existing = self
                        .repo
                        .find_by_phone(phone.as_str())
                        .await?
                        .ok_or_else(|| anyhow!("user missing after phone conflict"))?;
                    let existing = self.ensure_referral_code(existing).await?;
                    return Ok((existing, false));
                }
                InsertOutcome::ReferralCodeTaken => {
                    tracing::debug!("referral code collision on insert, retrying");
                }
            }
        }
        Err(anyhow!("no free referral code after {REFERRAL_CODE_ATTEMPTS} attempts").into())
    }

    /// Assign a referral code to a user that has none. No-op otherwise.
    pub async fn ensure_referral_code(&self, user: User) -> Result<User, AccountsServiceError> {
        if user.referral_code.is_some() {
            return Ok(user);
        }
        for _ in 0..REFERRAL_CODE_ATTEMPTS {
            let code = generate_referral_code();
            match self.repo.assign_referral_code(user.id, code.as_str()).await? {
                CodeAssignment::Assigned => {
                    return Ok(User {
                        referral_code: Some(code.into_inner()),
                        ..user
                    });
                }
                // A concurrent request won; read back what it stored.
                CodeAssignment::AlreadySet => {
                    return self
                        .repo
                        .find_by_id(user.id)
                        .await?
                        .ok_or(AccountsServiceError::UserNotFound);
                }
                CodeAssignment::CodeTaken => {
                    tracing::debug!(user_id = %user.id, "referral code collision, retrying");
                }
            }
        }
        Err(anyhow!("no free referral code after {REFERRAL_CODE_ATTEMPTS} attempts").into())
    }
}
