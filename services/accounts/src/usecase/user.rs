use uuid::Uuid;
use validator::Validate;

use crate::domain::repository::UserRepository;
use crate::domain::types::{Profile, ProfileUpdate, User};
use crate::error::AccountsServiceError;
use crate::usecase::referral::attach_referral;

async fn load_profile<R: UserRepository>(
    repo: &R,
    user: User,
) -> Result<Profile, AccountsServiceError> {
    let referred_by = match user.referred_by {
        Some(referrer_id) => repo.find_by_id(referrer_id).await?.map(|r| r.phone_number),
        None => None,
    };
    let referrals = repo.list_referrals(user.id).await?;
    Ok(Profile {
        user,
        referred_by,
        referrals,
    })
}

// ── GetProfile ───────────────────────────────────────────────────────────────

pub struct GetProfileUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> GetProfileUseCase<R> {
    pub async fn execute(&self, user_id: Uuid) -> Result<Profile, AccountsServiceError> {
        let user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(AccountsServiceError::UserNotFound)?;
        load_profile(&self.repo, user).await
    }
}

// ── UpdateProfile ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Validate)]
pub struct UpdateProfileInput {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    /// Referral code of the user who referred this one. Blank counts as absent.
    pub referred_by_code: Option<String>,
}

pub struct UpdateProfileUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> UpdateProfileUseCase<R> {
    pub async fn execute(
        &self,
        user: User,
        input: UpdateProfileInput,
    ) -> Result<Profile, AccountsServiceError> {
        let referred_by_code = input
            .referred_by_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty());
        let update = ProfileUpdate {
            email: input.email.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
        };
        if update.is_empty() && referred_by_code.is_none() {
            return Err(AccountsServiceError::MissingData);
        }
        input.validate().map_err(|e| {
            if e.field_errors().contains_key("email") {
                AccountsServiceError::InvalidEmail
            } else {
                AccountsServiceError::InvalidName
            }
        })?;

        // Referral first: a bad code rejects the whole request before anything is written.
        if let Some(code) = referred_by_code {
            attach_referral(&self.repo, &user, code).await?;
        }
        if !update.is_empty() {
            self.repo.update_profile(user.id, &update).await?;
        }

        let refreshed = self
            .repo
            .find_by_id(user.id)
            .await?
            .ok_or(AccountsServiceError::UserNotFound)?;
        load_profile(&self.repo, refreshed).await
    }
}
