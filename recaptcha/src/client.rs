//! `siteverify` transport.
//!
//! [`SiteVerifyTransport`] is the seam between the verdict policy and the
//! network. [`HttpTransport`] is the production implementation; tests swap in
//! fakes to exercise transport failures without sockets.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use url::Url;

use crate::{ProviderResponse, SecretKey};

/// Canonical Google reCAPTCHA verification endpoint.
pub const SITEVERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const CONNECT_TIMEOUT_SECS: u64 = 5;

const MAX_ERROR_BODY_BYTES: usize = 4 * 1024;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Request(String),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid provider response: {0}")]
    Decode(String),
}

impl TransportError {
    fn from_reqwest(error: &reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Request(error_chain(error))
        }
    }
}

/// Render an error and its `source()` chain as `outer: inner: root`.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Performs one `siteverify` exchange.
pub trait SiteVerifyTransport: Send + Sync {
    fn post_form(
        &self,
        secret: &SecretKey,
        token: &str,
    ) -> impl Future<Output = Result<ProviderResponse, TransportError>> + Send;
}

/// Endpoint and timeout settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub endpoint: String,
    pub timeout: Duration,
    /// Permit plain-HTTP endpoints (loopback mock servers).
    pub allow_insecure_endpoint: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: SITEVERIFY_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            allow_insecure_endpoint: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("invalid siteverify endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        source: url::ParseError,
    },
    #[error("siteverify endpoint {0:?} must use https")]
    InsecureEndpoint(String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientBuildError> {
        let endpoint =
            Url::parse(&settings.endpoint).map_err(|source| ClientBuildError::InvalidEndpoint {
                endpoint: settings.endpoint.clone(),
                source,
            })?;
        if endpoint.scheme() != "https" && !settings.allow_insecure_endpoint {
            return Err(ClientBuildError::InsecureEndpoint(settings.endpoint.clone()));
        }

        let client = base_client_builder(settings.timeout)
            .https_only(!settings.allow_insecure_endpoint)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            timeout: settings.timeout,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn base_client_builder(timeout: Duration) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(timeout.min(Duration::from_secs(CONNECT_TIMEOUT_SECS)))
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
}

fn encode_form(secret: &SecretKey, token: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("secret", secret.expose_secret())
        .append_pair("response", token)
        .finish()
}

async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

impl SiteVerifyTransport for HttpTransport {
    async fn post_form(
        &self,
        secret: &SecretKey,
        token: &str,
    ) -> Result<ProviderResponse, TransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
            .body(encode_form(secret, token))
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_capped_error_body(response).await;
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(&e, self.timeout))?;

        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }
}
