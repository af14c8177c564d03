//! Client layer: orchestrates transport calls and maps transport ↔ domain.

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::domain::{ApiKey, SendSms, SendSmsResponse, Username};

const DEFAULT_ENDPOINT: &str = "https://api.africastalking.com/version1/messaging";
const SANDBOX_ENDPOINT: &str = "https://api.sandbox.africastalking.com/version1/messaging";

/// Boxed future returned by the object-safe traits in this module.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone)]
struct HttpResponse {
    status: u16,
    body: String,
}

trait HttpTransport: Send + Sync {
    fn post_form<'a>(
        &'a self,
        url: &'a str,
        api_key: &'a str,
        params: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>>;
}

#[derive(Debug, Clone)]
struct ReqwestTransport {
    client: reqwest::Client,
}

impl HttpTransport for ReqwestTransport {
    fn post_form<'a>(
        &'a self,
        url: &'a str,
        api_key: &'a str,
        params: Vec<(String, String)>,
    ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
        Box::pin(async move {
            let response = self
                .client
                .post(url)
                .header(ApiKey::FIELD, api_key)
                .header(reqwest::header::ACCEPT, "application/json")
                .form(&params)
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(HttpResponse { status, body })
        })
    }
}

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`AfricasTalkingClient`].
///
/// This error preserves:
/// - HTTP-level failures (non-2xx status or transport failures),
/// - malformed vendor responses and bad endpoint configuration.
pub enum SmsError {
    /// HTTP client / transport failure (DNS, TLS, timeouts, etc).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// Non-successful HTTP status code returned by the vendor.
    #[error("unexpected HTTP status: {status}")]
    HttpStatus { status: u16, body: Option<String> },

    /// Response body could not be parsed as the expected format.
    #[error("parse error: {0}")]
    Parse(#[source] Box<dyn StdError + Send + Sync>),

    /// A configured endpoint is not an absolute http(s) URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl SmsError {
    /// Raw vendor output worth surfacing to operators, if any.
    pub fn diagnostic(&self) -> Option<String> {
        match self {
            Self::HttpStatus { body, .. } => body.clone(),
            Self::Transport(source) | Self::Parse(source) => Some(format!("{source:?}")),
            Self::InvalidEndpoint(_) => None,
        }
    }
}

/// Something that can hand a validated [`SendSms`] to an SMS provider.
///
/// The HTTP layer depends on this trait rather than on a concrete client.
pub trait SmsSender: Send + Sync {
    fn send_sms<'a>(
        &'a self,
        request: SendSms,
    ) -> BoxFuture<'a, Result<SendSmsResponse, SmsError>>;
}

#[derive(Debug, Clone)]
/// Builder for [`AfricasTalkingClient`].
///
/// Use this when you need to customize the endpoint, timeout, or user-agent.
pub struct AfricasTalkingClientBuilder {
    username: Username,
    api_key: ApiKey,
    endpoint: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl AfricasTalkingClientBuilder {
    /// Create a builder with the default endpoint and no timeout/user-agent override.
    pub fn new(username: Username, api_key: ApiKey) -> Self {
        Self {
            username,
            api_key,
            endpoint: None,
            timeout: None,
            user_agent: None,
        }
    }

    /// Override the messaging endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set an HTTP client timeout applied to the entire request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the HTTP `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build an [`AfricasTalkingClient`].
    pub fn build(self) -> Result<AfricasTalkingClient, SmsError> {
        let endpoint = match self.endpoint {
            Some(endpoint) => validate_endpoint(&endpoint)?,
            None => default_endpoint(&self.username).to_owned(),
        };

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        let client = builder
            .build()
            .map_err(|err| SmsError::Transport(Box::new(err)))?;

        Ok(AfricasTalkingClient {
            username: self.username,
            api_key: self.api_key,
            endpoint,
            http: Arc::new(ReqwestTransport { client }),
        })
    }
}

#[derive(Clone)]
/// High-level Africa's Talking SMS client.
///
/// This type orchestrates form encoding, the HTTP call, and response parsing.
/// By default it posts to `https://api.africastalking.com/version1/messaging`, or to the
/// sandbox host when the username is `sandbox`.
///
/// Every send is queued (`enqueue=1`): a successful response means the vendor accepted
/// the message, not that it reached the handset. Failed calls are never retried.
pub struct AfricasTalkingClient {
    username: Username,
    api_key: ApiKey,
    endpoint: String,
    http: Arc<dyn HttpTransport>,
}

impl AfricasTalkingClient {
    /// Create a client using the default endpoint for `username`.
    ///
    /// For more customization, use [`AfricasTalkingClient::builder`].
    pub fn new(username: Username, api_key: ApiKey) -> Self {
        Self {
            endpoint: default_endpoint(&username).to_owned(),
            username,
            api_key,
            http: Arc::new(ReqwestTransport {
                client: reqwest::Client::new(),
            }),
        }
    }

    /// Start building a client with custom settings.
    pub fn builder(username: Username, api_key: ApiKey) -> AfricasTalkingClientBuilder {
        AfricasTalkingClientBuilder::new(username, api_key)
    }

    /// Messaging endpoint this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send an SMS message.
    ///
    /// Errors:
    /// - [`SmsError::Transport`] when the request could not be completed,
    /// - [`SmsError::HttpStatus`] for non-2xx HTTP responses,
    /// - [`SmsError::Parse`] when the body is not the expected JSON.
    pub async fn send(&self, request: &SendSms) -> Result<SendSmsResponse, SmsError> {
        let params = crate::transport::encode_send_sms_form(&self.username, request);

        let response = self
            .http
            .post_form(&self.endpoint, self.api_key.as_str(), params)
            .await
            .map_err(SmsError::Transport)?;

        if !(200..=299).contains(&response.status) {
            let body = if response.body.trim().is_empty() {
                None
            } else {
                Some(response.body)
            };
            return Err(SmsError::HttpStatus {
                status: response.status,
                body,
            });
        }

        crate::transport::decode_send_sms_json_response(&response.body)
            .map_err(|err| SmsError::Parse(Box::new(err)))
    }
}

impl SmsSender for AfricasTalkingClient {
    fn send_sms<'a>(
        &'a self,
        request: SendSms,
    ) -> BoxFuture<'a, Result<SendSmsResponse, SmsError>> {
        Box::pin(async move { self.send(&request).await })
    }
}

impl std::fmt::Debug for AfricasTalkingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AfricasTalkingClient")
            .field("username", &self.username)
            .field("api_key", &self.api_key)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

fn default_endpoint(username: &Username) -> &'static str {
    if username.is_sandbox() {
        SANDBOX_ENDPOINT
    } else {
        DEFAULT_ENDPOINT
    }
}

fn validate_endpoint(raw: &str) -> Result<String, SmsError> {
    let url = Url::parse(raw.trim()).map_err(|err| SmsError::InvalidEndpoint(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SmsError::InvalidEndpoint(format!(
            "unsupported scheme: {}",
            url.scheme()
        )));
    }
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crate::domain::{KnownStatusCode, SendSms};

    use super::*;

    #[derive(Debug, Clone)]
    struct FakeTransport {
        state: Arc<Mutex<FakeTransportState>>,
    }

    #[derive(Debug)]
    struct FakeTransportState {
        last_url: Option<String>,
        last_api_key: Option<String>,
        last_params: Vec<(String, String)>,
        calls: usize,
        response_status: u16,
        response_body: String,
    }

    impl FakeTransport {
        fn new(response_status: u16, response_body: impl Into<String>) -> Self {
            Self {
                state: Arc::new(Mutex::new(FakeTransportState {
                    last_url: None,
                    last_api_key: None,
                    last_params: Vec::new(),
                    calls: 0,
                    response_status,
                    response_body: response_body.into(),
                })),
            }
        }

        fn last_request(&self) -> (Option<String>, Option<String>, Vec<(String, String)>) {
            let state = self.state.lock().unwrap();
            (
                state.last_url.clone(),
                state.last_api_key.clone(),
                state.last_params.clone(),
            )
        }

        fn calls(&self) -> usize {
            self.state.lock().unwrap().calls
        }
    }

    impl HttpTransport for FakeTransport {
        fn post_form<'a>(
            &'a self,
            url: &'a str,
            api_key: &'a str,
            params: Vec<(String, String)>,
        ) -> BoxFuture<'a, Result<HttpResponse, Box<dyn StdError + Send + Sync>>> {
            Box::pin(async move {
                let (status, body) = {
                    let mut state = self.state.lock().unwrap();
                    state.last_url = Some(url.to_owned());
                    state.last_api_key = Some(api_key.to_owned());
                    state.last_params = params;
                    state.calls += 1;
                    (state.response_status, state.response_body.clone())
                };
                Ok(HttpResponse { status, body })
            })
        }
    }

    fn assert_param(params: &[(String, String)], key: &str, value: &str) {
        assert!(
            params.iter().any(|(k, v)| k == key && v == value),
            "missing param {key}={value}; got: {params:?}"
        );
    }

    fn make_client(transport: FakeTransport) -> AfricasTalkingClient {
        AfricasTalkingClient {
            username: Username::new("acme").unwrap(),
            api_key: ApiKey::new("test_key").unwrap(),
            endpoint: "https://example.invalid/version1/messaging".to_owned(),
            http: Arc::new(transport),
        }
    }

    fn hello() -> SendSms {
        SendSms::from_fields(Some("+250798922640"), Some("hello"), None).unwrap()
    }

    #[tokio::test]
    async fn send_includes_credentials_and_parses_ok_response() {
        let json = r#"
        {
          "SMSMessageData": {
            "Message": "Sent to 1/1 Total Cost: RWF 20.0000",
            "Recipients": [
              {
                "statusCode": 102,
                "number": "+250798922640",
                "status": "Success",
                "cost": "RWF 20.0000",
                "messageId": "ATXid_abc123"
              }
            ]
          }
        }
        "#;

        let transport = FakeTransport::new(201, json);
        let client = make_client(transport.clone());

        let response = client.send(&hello()).await.unwrap();
        assert_eq!(response.accepted_count(), 1);
        assert_eq!(
            response.recipients()[0].status_code.known_kind(),
            Some(KnownStatusCode::Queued)
        );

        let (url, api_key, params) = transport.last_request();
        assert_eq!(
            url.as_deref(),
            Some("https://example.invalid/version1/messaging")
        );
        assert_eq!(api_key.as_deref(), Some("test_key"));
        assert_param(&params, "username", "acme");
        assert_param(&params, "to", "+250798922640");
        assert_param(&params, "message", "hello");
        assert_param(&params, "enqueue", "1");
    }

    #[tokio::test]
    async fn send_maps_non_success_http_status() {
        let transport = FakeTransport::new(401, "The supplied authentication is invalid");
        let client = make_client(transport.clone());

        let err = client.send(&hello()).await.unwrap_err();
        assert!(matches!(
            err,
            SmsError::HttpStatus {
                status: 401,
                body: Some(_)
            }
        ));
        assert_eq!(
            err.diagnostic().as_deref(),
            Some("The supplied authentication is invalid")
        );
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn send_maps_empty_http_body_to_none() {
        let transport = FakeTransport::new(503, "   ");
        let client = make_client(transport);

        let err = client.send(&hello()).await.unwrap_err();
        assert!(matches!(
            err,
            SmsError::HttpStatus {
                status: 503,
                body: None
            }
        ));
    }

    #[tokio::test]
    async fn send_maps_invalid_json_to_parse_error() {
        let transport = FakeTransport::new(200, "{ not json }");
        let client = make_client(transport);

        let err = client.send(&hello()).await.unwrap_err();
        assert!(matches!(err, SmsError::Parse(_)));
    }

    #[tokio::test]
    async fn sms_sender_delegates_to_send() {
        let transport = FakeTransport::new(
            200,
            r#"{"SMSMessageData":{"Message":"Sent to 1/1","Recipients":[]}}"#,
        );
        let client = make_client(transport.clone());
        let sender: Arc<dyn SmsSender> = Arc::new(client);

        let response = sender.send_sms(hello()).await.unwrap();
        assert_eq!(response.message(), Some("Sent to 1/1"));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn gateway_relays_provider_body_unchanged() {
        use axum::body::Body;
        use axum::http::Request;
        use http_body_util::BodyExt;
        use tower::ServiceExt;

        use crate::config::Config;
        use crate::server::{AppState, router};

        let provider_body = r#"{"SMSMessageData":{"Recipients":[{"statusCode":101,"number":"+250798922640","status":"Success","cost":0.80,"messageParts":1,"messageId":"ATXid_7"}]}}"#;
        let transport = FakeTransport::new(201, provider_body);
        let client = make_client(transport.clone());
        let config = Config::from_lookup(|var| match var {
            "USERNAME" => Some("acme".to_owned()),
            "API_KEY" => Some("test_key".to_owned()),
            _ => None,
        })
        .unwrap();
        let endpoint = client.endpoint().to_owned();
        let app = router(Arc::new(AppState::new(&config, Arc::new(client), endpoint)));

        let response = app
            .oneshot(
                Request::post("/")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"to":"+250798922640","message":"Hello","from":"  ACME  "}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["enqueued"], true);
        assert_eq!(
            json["data"],
            serde_json::from_str::<serde_json::Value>(provider_body).unwrap()
        );

        let (_, api_key, params) = transport.last_request();
        assert_eq!(api_key.as_deref(), Some("test_key"));
        assert_param(&params, "from", "ACME");
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn sandbox_username_selects_sandbox_endpoint() {
        let client = AfricasTalkingClient::new(
            Username::new("sandbox").unwrap(),
            ApiKey::new("key").unwrap(),
        );
        assert_eq!(client.endpoint(), SANDBOX_ENDPOINT);

        let client =
            AfricasTalkingClient::new(Username::new("acme").unwrap(), ApiKey::new("key").unwrap());
        assert_eq!(client.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn builder_endpoint_override_is_validated() {
        let client = AfricasTalkingClient::builder(
            Username::new("acme").unwrap(),
            ApiKey::new("key").unwrap(),
        )
        .endpoint("http://127.0.0.1:8080/version1/messaging")
        .build()
        .unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:8080/version1/messaging");

        let err = AfricasTalkingClient::builder(
            Username::new("acme").unwrap(),
            ApiKey::new("key").unwrap(),
        )
        .endpoint("ftp://example.invalid/messaging")
        .build()
        .unwrap_err();
        assert!(matches!(err, SmsError::InvalidEndpoint(_)));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let client = make_client(FakeTransport::new(200, "{}"));
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("test_key"));
        assert!(rendered.contains("***_key"));
    }
}
