//! Referral and one-time codes.
//!
//! Both kinds are five characters drawn uniformly from a fixed alphabet.
//! Generation uses the thread-local CSPRNG; uniqueness is not guaranteed
//! here and is left to the caller.

use std::fmt;

use rand::RngExt;

/// Length of both referral and one-time codes.
pub const CODE_LEN: usize = 5;

/// Referral code alphabet (16 symbols).
pub const REFERRAL_ALPHABET: &[u8] = b"123456789ABCDEFG";

/// One-time code alphabet (9 symbols, no zero).
pub const OTP_ALPHABET: &[u8] = b"123456789";

/// Errors returned when parsing a submitted code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeFormatError {
    #[error("code must be exactly 5 characters")]
    InvalidLength,
    #[error("code contains invalid character {0:?}")]
    InvalidCharacter(char),
}

fn generate_from(alphabet: &[u8]) -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

fn check_shape(value: &str, alphabet: &[u8]) -> Result<(), CodeFormatError> {
    if value.chars().count() != CODE_LEN {
        return Err(CodeFormatError::InvalidLength);
    }
    match value.chars().find(|c| !c.is_ascii() || !alphabet.contains(&(*c as u8))) {
        Some(bad) => Err(CodeFormatError::InvalidCharacter(bad)),
        None => Ok(()),
    }
}

/// Shareable code identifying a user as a referrer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferralCode(String);

impl ReferralCode {
    /// Parse a submitted referral code. Lowercase input is accepted.
    pub fn parse(input: &str) -> Result<Self, CodeFormatError> {
        let upper = input.trim().to_ascii_uppercase();
        check_shape(&upper, REFERRAL_ALPHABET)?;
        Ok(Self(upper))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Numeric one-time passcode delivered out of band.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct OtpCode(String);

impl OtpCode {
    pub fn parse(input: &str) -> Result<Self, CodeFormatError> {
        let trimmed = input.trim();
        check_shape(trimmed, OTP_ALPHABET)?;
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

// Keep code values out of Debug output (and therefore out of logs).
impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(*****)")
    }
}

/// Generate a new referral code.
pub fn generate_referral_code() -> ReferralCode {
    ReferralCode(generate_from(REFERRAL_ALPHABET))
}

/// Generate a new one-time code.
pub fn generate_otp_code() -> OtpCode {
    OtpCode(generate_from(OTP_ALPHABET))
}
