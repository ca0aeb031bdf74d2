pub mod directory;
pub mod login;
pub mod otp;
pub mod outbox;
pub mod referral;
pub mod token;
pub mod user;
pub mod verify;
