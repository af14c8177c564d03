//! HTTP gateway that forwards outbound SMS to Africa's Talking and accepts
//! delivery-report callbacks.
//!
//! The crate is layered the same way top to bottom: a domain layer of strong
//! types, a transport layer for the vendor's wire format, a client layer that
//! performs the HTTP call, and a small axum server that validates requests and
//! wraps the vendor's answer, unchanged, in a JSON envelope.
//!
//! A successful send only means the provider queued the message (`enqueue=1`).
//! Delivery outcomes arrive later on `POST /delivery`.
//!
//! ```rust,no_run
//! use sms_gateway::{AfricasTalkingClient, ApiKey, SendSms, Username};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AfricasTalkingClient::new(Username::new("sandbox")?, ApiKey::new("...")?);
//!     let request = SendSms::from_fields(Some("+250798922640"), Some("hello"), None)?;
//!     let response = client.send(&request).await?;
//!     println!("accepted: {}", response.accepted_count());
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod domain;
pub mod server;
pub mod telemetry;
mod transport;

pub use client::{AfricasTalkingClient, AfricasTalkingClientBuilder, SmsError, SmsSender};
pub use config::{Config, ConfigError, Environment};
pub use domain::{
    ApiKey, DeliveryReport, KnownStatusCode, MessageText, PhoneNumber, Recipient, SendSms,
    SendSmsResponse, SenderId, StatusCode, Username, ValidationError,
};
