//! # HTTP Retrieval
//!
//! A thin asynchronous client for the backend's read-only JSON endpoints.
//! One call, one GET, one decoded array; transport and payload failures are
//! reported as typed errors and retrying is left entirely to the polling
//! engine, which re-issues fetches at its own cadence.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::endpoints::Endpoint;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "FactoryWatch/1.0";

/// Failure modes of a single fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The configured base URL (or a joined path) is not a valid URL.
    #[error("invalid base url: {0}")]
    BadUrl(String),

    /// The request never produced a usable response (DNS, connect, timeout).
    #[error("transport failure: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("unexpected status {0}")]
    Status(StatusCode),

    /// The body could not be decoded as the expected array shape.
    #[error("malformed payload: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Asynchronous client bound to one backend base URL.
///
/// The inner `reqwest::Client` is reused across all calls to leverage
/// connection pooling, and carries a request timeout so a hung backend
/// cannot stall a poll cycle indefinitely.
pub struct ApiClient {
    inner: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Creates a client for the given base URL, e.g. `http://localhost:8080/`.
    ///
    /// A missing trailing slash is tolerated; it is appended so relative
    /// endpoint paths join below the base rather than replacing its last
    /// segment.
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url =
            Url::parse(&normalized).map_err(|e| FetchError::BadUrl(format!("{normalized}: {e}")))?;

        let inner = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { inner, base_url })
    }

    /// Fetches one endpoint and decodes the body as a JSON array of `T`.
    ///
    /// The body is read as raw bytes first so a shape mismatch surfaces as
    /// [`FetchError::Parse`] rather than being folded into the transport
    /// error type.
    pub async fn fetch_array<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
    ) -> Result<Vec<T>, FetchError> {
        let url = self
            .base_url
            .join(endpoint.path())
            .map_err(|e| FetchError::BadUrl(format!("{}: {e}", endpoint.path())))?;

        let response = self.inner.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// The base URL this client was constructed with.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dto::CloudInvDto;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serves exactly one canned HTTP response on a random local port.
    fn one_shot_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind random port");
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        format!("http://{addr}")
    }

    #[tokio::test]
    async fn decodes_a_json_array() {
        let base = one_shot_server(
            "HTTP/1.1 200 OK",
            r#"[{"className":"Desc_IronIngot_C","name":"Iron Ingot","amount":420}]"#,
        );
        let client = ApiClient::new(&base).unwrap();

        let items: Vec<CloudInvDto> = client.fetch_array(Endpoint::CloudInv).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Iron Ingot");
        assert_eq!(items[0].amount, 420);
    }

    #[tokio::test]
    async fn non_success_status_is_a_status_error() {
        let base = one_shot_server("HTTP/1.1 503 Service Unavailable", "[]");
        let client = ApiClient::new(&base).unwrap();

        let result = client.fetch_array::<CloudInvDto>(Endpoint::CloudInv).await;
        match result {
            Err(FetchError::Status(code)) => assert_eq!(code.as_u16(), 503),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let base = one_shot_server("HTTP/1.1 200 OK", r#"{"not":"an array"}"#);
        let client = ApiClient::new(&base).unwrap();

        let result = client.fetch_array::<CloudInvDto>(Endpoint::CloudInv).await;
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn base_url_gets_a_trailing_slash() {
        let client = ApiClient::new("http://localhost:8080").unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(FetchError::BadUrl(_))
        ));
    }
}
