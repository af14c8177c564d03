use crate::domain::validation::ValidationError;
use crate::domain::value::{MessageText, PhoneNumber, SenderId};

/// A single outbound SMS ready to hand to the vendor.
///
/// `enqueue` asks the vendor to queue the message for asynchronous delivery, so a
/// successful send only means the vendor accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendSms {
    to: PhoneNumber,
    message: MessageText,
    from: Option<SenderId>,
    enqueue: bool,
}

impl SendSms {
    /// Build a request with queued delivery enabled.
    pub fn new(to: PhoneNumber, message: MessageText, from: Option<SenderId>) -> Self {
        Self {
            to,
            message,
            from,
            enqueue: true,
        }
    }

    /// Validate raw request fields in order: presence, phone format, message length.
    ///
    /// The first failing check wins; later checks are not evaluated.
    pub fn from_fields(
        to: Option<&str>,
        message: Option<&str>,
        from: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let (Some(to), Some(message)) = (non_blank(to), non_blank(message)) else {
            return Err(ValidationError::MissingFields);
        };
        let to = PhoneNumber::new(to)?;
        let message = MessageText::new(message)?;
        Ok(Self::new(to, message, SenderId::parse_optional(from)))
    }

    pub fn to(&self) -> &PhoneNumber {
        &self.to
    }

    pub fn message(&self) -> &MessageText {
        &self.message
    }

    pub fn from(&self) -> Option<&SenderId> {
        self.from.as_ref()
    }

    pub fn enqueue(&self) -> bool {
        self.enqueue
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
