//! Phone number domain type.

/// Minimum number of digits after the `+` sign.
const MIN_DIGITS: usize = 8;

/// Maximum number of digits after the `+` sign (E.164 limit).
const MAX_DIGITS: usize = 15;

/// Errors returned by [`PhoneNumber::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhoneNumberError {
    #[error("phone number is empty")]
    Empty,
    #[error("phone number must start with a country code prefix")]
    MissingCountryCode,
    #[error("phone number contains invalid character {0:?}")]
    InvalidCharacter(char),
    #[error("phone number must have between 8 and 15 digits")]
    InvalidLength,
}

/// Canonical E.164 phone number (`+` followed by digits only).
///
/// Acts as the login identifier, so two inputs that normalise to the same
/// string refer to the same account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse and normalise user input.
    ///
    /// Spaces, dashes, dots and parentheses are stripped; a leading `00`
    /// international prefix is rewritten to `+`.
    ///
    /// ```
    /// use phonepass_domain::phone::PhoneNumber;
    ///
    /// let phone = PhoneNumber::parse("+1 (555) 123-4567").unwrap();
    /// assert_eq!(phone.as_str(), "+15551234567");
    /// ```
    pub fn parse(input: &str) -> Result<Self, PhoneNumberError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(PhoneNumberError::Empty);
        }

        let rest = if let Some(rest) = trimmed.strip_prefix('+') {
            rest
        } else if let Some(rest) = trimmed.strip_prefix("00") {
            rest
        } else {
            return Err(PhoneNumberError::MissingCountryCode);
        };

        let mut digits = String::with_capacity(MAX_DIGITS + 1);
        digits.push('+');
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                other => return Err(PhoneNumberError::InvalidCharacter(other)),
            }
        }

        let count = digits.len() - 1;
        if !(MIN_DIGITS..=MAX_DIGITS).contains(&count) {
            return Err(PhoneNumberError::InvalidLength);
        }
        // Country codes never start with 0.
        if digits.as_bytes()[1] == b'0' {
            return Err(PhoneNumberError::MissingCountryCode);
        }

        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
