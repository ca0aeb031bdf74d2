use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account keyed by phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub phone_number: String,
    pub referral_code: Option<String>,
    pub referred_by: Option<Uuid>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A fresh, unverified, active account.
    pub fn new(phone_number: String, referral_code: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            phone_number,
            referral_code,
            referred_by: None,
            email: None,
            first_name: None,
            last_name: None,
            is_verified: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One-time code issued to a user. Never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AuthCode {
    /// Whether the code is still inside the expiry window at `now`.
    /// A code exactly `window` old is still fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.created_at <= window
    }
}

/// Opaque bearer token, one per user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub key: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Outbox event for async delivery (e.g. OTP SMS).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub idempotency_key: String,
}

/// Outbox event claimed by the dispatcher.
#[derive(Debug, Clone)]
pub struct PendingEvent {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    /// Delivery attempts made before this one.
    pub attempts: i32,
}

/// Payload of an [`OTP_ISSUED_EVENT`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpIssuedPayload {
    pub phone_number: String,
    pub code: String,
}

/// Result of inserting a user that may already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Another row already owns the phone number.
    PhoneTaken,
    /// The candidate referral code belongs to someone else.
    ReferralCodeTaken,
}

/// Result of assigning a referral code to a user that may already have one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeAssignment {
    Assigned,
    AlreadySet,
    CodeTaken,
}

/// Outcome of a referral attach request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralOutcome {
    Attached { referrer_id: Uuid },
    /// `referred_by` was already set; nothing changed.
    AlreadyReferred,
}

/// Partial profile update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.first_name.is_none() && self.last_name.is_none()
    }
}

/// User with referral relationships resolved to phone numbers.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub referred_by: Option<String>,
    pub referrals: Vec<String>,
}

/// Outbox event kind written when a code is issued.
pub const OTP_ISSUED_EVENT: &str = "otp_issued";

/// Delivery attempts before an outbox event is marked failed.
pub const MAX_DELIVERY_ATTEMPTS: i32 = 5;

/// Fresh referral codes tried before giving up on a collision streak.
pub const REFERRAL_CODE_ATTEMPTS: usize = 8;
