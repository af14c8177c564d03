use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::validation::ValidationError;

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+\d{3}\d{9}$").expect("phone number pattern is a valid regex")
});

#[derive(Clone, PartialEq, Eq, Hash)]
/// Africa's Talking API key (`apiKey` header).
///
/// Invariant: non-empty after trimming. `Debug` never prints the value.
pub struct ApiKey(String);

impl ApiKey {
    /// Name used in validation errors and the request header.
    pub const FIELD: &'static str = "apiKey";

    /// Number of trailing characters revealed by [`ApiKey::redacted_suffix`].
    pub const VISIBLE_SUFFIX: usize = 4;

    /// Create a validated [`ApiKey`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the key for use in the request header.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the key in characters.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Never true for a key built through [`ApiKey::new`], which rejects blank input.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last few characters of the key, safe to show in diagnostics.
    pub fn redacted_suffix(&self) -> String {
        let skip = self.len().saturating_sub(Self::VISIBLE_SUFFIX);
        self.0.chars().skip(skip).collect()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(***{})", self.redacted_suffix())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Africa's Talking application username (`username`).
///
/// Invariant: non-empty after trimming.
pub struct Username(String);

impl Username {
    /// Form field name used by Africa's Talking (`username`).
    pub const FIELD: &'static str = "username";

    /// Username reserved for the Africa's Talking sandbox environment.
    pub const SANDBOX: &'static str = "sandbox";

    /// Create a validated [`Username`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated username.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the sandbox account.
    pub fn is_sandbox(&self) -> bool {
        self.0 == Self::SANDBOX
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Sender id or short code (`from`).
///
/// Invariant: non-empty after trimming. The value must be registered on the account.
pub struct SenderId(String);

impl SenderId {
    /// Form field name used by Africa's Talking (`from`).
    pub const FIELD: &'static str = "from";

    /// Create a validated [`SenderId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Absent or blank input means "use the account's default sender".
    pub fn parse_optional(value: Option<&str>) -> Option<Self> {
        value.and_then(|raw| Self::new(raw).ok())
    }

    /// Borrow the validated sender id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// SMS message text (`message`).
///
/// Invariant: non-empty after trimming and at most [`MessageText::MAX_CHARS`] characters.
/// The original value (including whitespace) is preserved.
pub struct MessageText(String);

impl MessageText {
    /// Form field name used by Africa's Talking (`message`).
    pub const FIELD: &'static str = "message";

    /// Single-part SMS limit enforced before anything reaches the vendor.
    pub const MAX_CHARS: usize = 160;

    /// Create validated message text.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        let actual = value.chars().count();
        if actual > Self::MAX_CHARS {
            return Err(ValidationError::MessageTooLong {
                max: Self::MAX_CHARS,
                actual,
            });
        }
        Ok(Self(value))
    }

    /// Borrow the message text as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Destination phone number (`to`).
///
/// Invariant: `+`, a 3-digit country prefix, then exactly 9 digits (e.g. `+250798922640`).
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Form field name used by Africa's Talking (`to`).
    pub const FIELD: &'static str = "to";

    /// Create a validated phone number. Surrounding whitespace is ignored.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        if !PHONE_PATTERN.is_match(trimmed) {
            return Err(ValidationError::InvalidPhoneNumber {
                input: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The number in `+<prefix><digits>` form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Per-recipient status code returned by the messaging API.
///
/// This value is preserved as-is even when the code is unknown to this crate.
pub struct StatusCode(i32);

impl StatusCode {
    /// Construct a status code from its integer representation.
    pub fn new(code: i32) -> Self {
        Self(code)
    }

    /// Get the integer code as provided by the vendor.
    pub fn as_i32(self) -> i32 {
        self.0
    }

    /// Map this code to a known status code variant, if one exists.
    pub fn known_kind(self) -> Option<KnownStatusCode> {
        KnownStatusCode::from_code(self.0)
    }

    /// Returns `true` if the vendor took the message for delivery.
    pub fn is_accepted(self) -> bool {
        matches!(self.known_kind(), Some(kind) if kind.is_accepted())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
/// Known per-recipient status codes.
///
/// Unknown codes are preserved as [`StatusCode`] and return `None` from [`KnownStatusCode::from_code`].
pub enum KnownStatusCode {
    Processed,
    Sent,
    Queued,
    RiskHold,
    InvalidSenderId,
    InvalidPhoneNumber,
    UnsupportedNumberType,
    InsufficientBalance,
    UserInBlacklist,
    CouldNotRoute,
    DoNotDisturbRejection,
    InternalServerError,
    GatewayError,
    RejectedByGateway,
}

impl KnownStatusCode {
    /// Convert a raw integer code into a known variant.
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            100 => Self::Processed,
            101 => Self::Sent,
            102 => Self::Queued,
            401 => Self::RiskHold,
            402 => Self::InvalidSenderId,
            403 => Self::InvalidPhoneNumber,
            404 => Self::UnsupportedNumberType,
            405 => Self::InsufficientBalance,
            406 => Self::UserInBlacklist,
            407 => Self::CouldNotRoute,
            409 => Self::DoNotDisturbRejection,
            500 => Self::InternalServerError,
            501 => Self::GatewayError,
            502 => Self::RejectedByGateway,
            _ => return None,
        })
    }

    /// Whether the vendor accepted the message (processed, sent or queued).
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Processed | Self::Sent | Self::Queued)
    }
}
