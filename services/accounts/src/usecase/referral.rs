use phonepass_domain::code::ReferralCode;

use crate::domain::repository::UserRepository;
use crate::domain::types::{ReferralOutcome, User};
use crate::error::AccountsServiceError;

/// Attaches a referrer to a user at most once.
///
/// Once `referred_by` is set every later attach is a silent no-op, even with
/// a different or invalid code.
pub struct ReferralLinker<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> ReferralLinker<R> {
    pub async fn attach(
        &self,
        target: &User,
        submitted_code: &str,
    ) -> Result<ReferralOutcome, AccountsServiceError> {
        attach_referral(&self.repo, target, submitted_code).await
    }
}

/// Link `target` to the owner of `submitted_code` unless it already has a referrer.
pub async fn attach_referral<R: UserRepository>(
    repo: &R,
    target: &User,
    submitted_code: &str,
) -> Result<ReferralOutcome, AccountsServiceError> {
    if target.referred_by.is_some() {
        return Ok(ReferralOutcome::AlreadyReferred);
    }

    let code = ReferralCode::parse(submitted_code)
        .map_err(|_| AccountsServiceError::InvalidReferralCode)?;
    let referrer = repo
        .find_by_referral_code(code.as_str())
        .await?
        .ok_or(AccountsServiceError::InvalidReferralCode)?;
    if referrer.id == target.id {
        return Err(AccountsServiceError::SelfReferral);
    }

    // Conditional on `referred_by IS NULL`, so a concurrent attach cannot overwrite.
    if repo.set_referrer_if_unset(target.id, referrer.id).await? {
        tracing::info!(user_id = %target.id, referrer_id = %referrer.id, "referral attached");
        Ok(ReferralOutcome::Attached {
            referrer_id: referrer.id,
        })
    } else {
        Ok(ReferralOutcome::AlreadyReferred)
    }
}
