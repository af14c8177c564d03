use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;

use crate::domain::value::StatusCode;

/// Vendor acknowledgement for a send request.
///
/// Keeps the vendor's JSON exactly as received and serialises back to it, so
/// relayed payloads carry every field the vendor sent. The typed view
/// (`message`, `recipients`) only covers what the gateway itself reads.
/// Acceptance here means the message was queued, not that it was delivered.
#[derive(Debug, Clone)]
pub struct SendSmsResponse {
    raw: Box<RawValue>,
    message: Option<String>,
    recipients: Vec<Recipient>,
}

impl SendSmsResponse {
    pub fn new(raw: Box<RawValue>, message: Option<String>, recipients: Vec<Recipient>) -> Self {
        Self {
            raw,
            message,
            recipients,
        }
    }

    /// The vendor body, byte for byte.
    pub fn raw(&self) -> &RawValue {
        &self.raw
    }

    /// `SMSMessageData.Message`, when the vendor sent one.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Number of recipients the vendor took for delivery.
    pub fn accepted_count(&self) -> usize {
        self.recipients
            .iter()
            .filter(|r| r.status_code.is_accepted())
            .count()
    }
}

impl Serialize for SendSmsResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub status_code: StatusCode,
    pub number: String,
    pub status: String,
    pub message_id: Option<String>,
}

/// Delivery status notification posted by the vendor to the callback URL.
///
/// Every field is optional; the callback is acknowledged whatever it contains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub network_code: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub retry_count: Option<u32>,
}

/// Callbacks send `retryCount` as either a number or a numeric string.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_response_serialises_to_the_vendor_body() {
        let body = r#"{"SMSMessageData":{"Recipients":[{"statusCode":101,"number":"+250798922640","status":"Success","cost":0.80,"messageParts":1,"messageId":"ATXid_1"}]}}"#;
        let response = SendSmsResponse::new(
            RawValue::from_string(body.to_owned()).unwrap(),
            None,
            vec![Recipient {
                status_code: StatusCode::new(101),
                number: "+250798922640".to_owned(),
                status: "Success".to_owned(),
                message_id: Some("ATXid_1".to_owned()),
            }],
        );

        assert_eq!(serde_json::to_string(&response).unwrap(), body);
        assert_eq!(response.message(), None);
        assert_eq!(response.accepted_count(), 1);
    }

    #[test]
    fn delivery_report_accepts_string_retry_count() {
        let report: DeliveryReport = serde_json::from_str(
            r#"{"id":"ATXid_1","status":"Success","phoneNumber":"+250798922640","retryCount":"2"}"#,
        )
        .unwrap();
        assert_eq!(report.id.as_deref(), Some("ATXid_1"));
        assert_eq!(report.phone_number.as_deref(), Some("+250798922640"));
        assert_eq!(report.retry_count, Some(2));
        assert_eq!(report.failure_reason, None);
    }

    #[test]
    fn delivery_report_tolerates_empty_object() {
        let report: DeliveryReport = serde_json::from_str("{}").unwrap();
        assert_eq!(report, DeliveryReport::default());
    }
}
