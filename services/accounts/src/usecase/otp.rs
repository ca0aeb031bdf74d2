use anyhow::Context as _;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use phonepass_domain::code::generate_otp_code;

use crate::domain::repository::AuthCodeRepository;
use crate::domain::types::{AuthCode, OTP_ISSUED_EVENT, OtpIssuedPayload, OutboxEvent, User};
use crate::error::AccountsServiceError;

/// Result of looking up a submitted code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeCheck {
    /// Active and inside the expiry window.
    Valid(AuthCode),
    /// Was active but too old; it has now been deactivated.
    Expired,
    /// No active code with that value for the user.
    Missing,
}

/// Issues, checks and consumes one-time codes.
///
/// An issued code is `ACTIVE` until it is either found past the expiry
/// window or consumed by a successful verification; both transitions set
/// `is_active = false` and neither is reversible.
pub struct OtpLifecycle<A: AuthCodeRepository> {
    pub auth_codes: A,
    /// Expiry window in seconds.
    pub expire_secs: i64,
}

impl<A: AuthCodeRepository> OtpLifecycle<A> {
    pub fn window(&self) -> Duration {
        Duration::seconds(self.expire_secs)
    }

    /// Create and store a new code for `user` along with its delivery event.
    /// Every login attempt gets one; earlier codes stay active until they
    /// expire or are consumed.
    pub async fn issue(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<AuthCode, AccountsServiceError> {
        let code = AuthCode {
            id: Uuid::new_v4(),
            user_id: user.id,
            code: generate_otp_code().into_inner(),
            is_active: true,
            created_at: now,
        };
        let payload = OtpIssuedPayload {
            phone_number: user.phone_number.clone(),
            code: code.code.clone(),
        };
        let event = OutboxEvent {
            id: Uuid::new_v4(),
            kind: OTP_ISSUED_EVENT.to_owned(),
            payload: serde_json::to_value(&payload).context("serialize otp payload")?,
            idempotency_key: format!("{OTP_ISSUED_EVENT}:{}", code.id),
        };

        self.auth_codes.create_with_outbox(&code, &event).await?;
        Ok(code)
    }

    /// Look up the most recent active `code` for `user_id` and apply the expiry rule.
    pub async fn check(
        &self,
        user_id: Uuid,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<CodeCheck, AccountsServiceError> {
        let Some(found) = self.auth_codes.find_latest_active(user_id, code).await? else {
            return Ok(CodeCheck::Missing);
        };
        if found.is_fresh(now, self.window()) {
            return Ok(CodeCheck::Valid(found));
        }
        self.auth_codes.deactivate(found.id).await?;
        Ok(CodeCheck::Expired)
    }

    /// Fails closed: anything but a fresh active code is `false`.
    pub async fn validate(
        &self,
        user_id: Uuid,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AccountsServiceError> {
        Ok(matches!(
            self.check(user_id, code, now).await?,
            CodeCheck::Valid(_)
        ))
    }

    /// Atomically deactivate a still-fresh code. Only one caller ever gets `true`.
    pub async fn consume(
        &self,
        code: &AuthCode,
        now: DateTime<Utc>,
    ) -> Result<bool, AccountsServiceError> {
        self.auth_codes.consume(code.id, now - self.window()).await
    }
}
