use serde::Deserialize;
use serde_json::value::RawValue;

use crate::domain::{
    MessageText, PhoneNumber, Recipient, SendSms, SendSmsResponse, SenderId, StatusCode, Username,
};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),
}

// Only the fields the gateway reads; everything else stays in the raw body.
#[derive(Debug, Deserialize)]
struct SendSmsJsonResponse {
    #[serde(rename = "SMSMessageData")]
    sms_message_data: SmsMessageDataJson,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SmsMessageDataJson {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    recipients: Vec<RecipientJson>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipientJson {
    status_code: i32,
    #[serde(default)]
    number: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    message_id: Option<String>,
}

impl From<RecipientJson> for Recipient {
    fn from(value: RecipientJson) -> Self {
        Self {
            status_code: StatusCode::new(value.status_code),
            number: value.number,
            status: value.status,
            message_id: value.message_id,
        }
    }
}

pub fn encode_send_sms_form(username: &Username, request: &SendSms) -> Vec<(String, String)> {
    let mut params = vec![
        (Username::FIELD.to_owned(), username.as_str().to_owned()),
        (PhoneNumber::FIELD.to_owned(), request.to().as_str().to_owned()),
        (
            MessageText::FIELD.to_owned(),
            request.message().as_str().to_owned(),
        ),
    ];
    if let Some(from) = request.from() {
        params.push((SenderId::FIELD.to_owned(), from.as_str().to_owned()));
    }
    if request.enqueue() {
        params.push(("enqueue".to_owned(), "1".to_owned()));
    }
    params
}

pub fn decode_send_sms_json_response(json: &str) -> Result<SendSmsResponse, TransportError> {
    let raw: Box<RawValue> = serde_json::from_str(json)?;
    let parsed: SendSmsJsonResponse = serde_json::from_str(raw.get())?;
    let data = parsed.sms_message_data;

    Ok(SendSmsResponse::new(
        raw,
        data.message,
        data.recipients.into_iter().map(Recipient::from).collect(),
    ))
}
