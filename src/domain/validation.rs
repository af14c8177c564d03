use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty { field: &'static str },
    MissingFields,
    InvalidPhoneNumber { input: String },
    MessageTooLong { max: usize, actual: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::MissingFields => {
                write!(f, "missing required fields: 'to' and 'message' are required")
            }
            Self::InvalidPhoneNumber { input } => write!(
                f,
                "invalid phone number format: {input} (expected +<country code><9 digits>, e.g. +250798922640)"
            ),
            Self::MessageTooLong { max, actual } => {
                write!(f, "message too long: {actual} characters (max {max})")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
