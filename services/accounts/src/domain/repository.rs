#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{
    AuthCode, AuthToken, CodeAssignment, InsertOutcome, OutboxEvent, PendingEvent, ProfileUpdate,
    User,
};
use crate::error::AccountsServiceError;

/// Repository for user accounts.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AccountsServiceError>;

    async fn find_by_phone(&self, phone_number: &str)
    -> Result<Option<User>, AccountsServiceError>;

    async fn find_by_referral_code(
        &self,
        code: &str,
    ) -> Result<Option<User>, AccountsServiceError>;

    /// Insert `user` unless its phone number is already registered.
    /// Never overwrites an existing row.
    async fn insert_if_absent(&self, user: &User) -> Result<InsertOutcome, AccountsServiceError>;

    /// Set `referral_code` only where it is still null.
    async fn assign_referral_code(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<CodeAssignment, AccountsServiceError>;

    /// Set `referred_by` only where it is still null. Returns `false` if it was already set.
    async fn set_referrer_if_unset(
        &self,
        user_id: Uuid,
        referrer_id: Uuid,
    ) -> Result<bool, AccountsServiceError>;

    async fn mark_verified(&self, user_id: Uuid) -> Result<(), AccountsServiceError>;

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<(), AccountsServiceError>;

    /// Phone numbers of users referred by `user_id`, oldest first.
    async fn list_referrals(&self, user_id: Uuid) -> Result<Vec<String>, AccountsServiceError>;
}

/// Repository for one-time codes.
pub trait AuthCodeRepository: Send + Sync {
    /// Insert a new code and an outbox event atomically (same transaction).
    async fn create_with_outbox(
        &self,
        code: &AuthCode,
        event: &OutboxEvent,
    ) -> Result<(), AccountsServiceError>;

    /// Most recently created active code matching `(user_id, code)`.
    async fn find_latest_active(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<Option<AuthCode>, AccountsServiceError>;

    /// Deactivate a code if it is still active and was created at or after
    /// `not_before`. Single conditional update; returns `true` only for the
    /// caller that flipped it.
    async fn consume(
        &self,
        id: Uuid,
        not_before: DateTime<Utc>,
    ) -> Result<bool, AccountsServiceError>;

    /// Deactivate a code regardless of age. Returns `false` if it was already inactive.
    async fn deactivate(&self, id: Uuid) -> Result<bool, AccountsServiceError>;
}

/// Repository for bearer tokens.
pub trait AuthTokenRepository: Send + Sync {
    /// Store `candidate` unless the user already has a token; return the stored one.
    async fn get_or_create(
        &self,
        candidate: &AuthToken,
    ) -> Result<AuthToken, AccountsServiceError>;

    async fn find_by_key(&self, key: &str) -> Result<Option<AuthToken>, AccountsServiceError>;
}

/// Repository for the transactional outbox.
pub trait OutboxRepository: Send + Sync {
    /// Claim up to `limit` due events, pushing their next attempt to `lease_until`
    /// so concurrent dispatchers skip them.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<PendingEvent>, AccountsServiceError>;

    async fn mark_processed(&self, id: Uuid, attempts: i32) -> Result<(), AccountsServiceError>;

    async fn mark_retry(
        &self,
        id: Uuid,
        attempts: i32,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), AccountsServiceError>;

    async fn mark_failed(
        &self,
        id: Uuid,
        attempts: i32,
        error: &str,
    ) -> Result<(), AccountsServiceError>;
}

/// Out-of-band OTP delivery (SMS gateway or similar).
pub trait Notifier: Send + Sync {
    async fn deliver(&self, phone_number: &str, code: &str) -> anyhow::Result<()>;
}
