use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Prefix shared by most failure messages shown in the transcript
pub const GENERIC_ERROR_PREFIX: &str = "An error occurred while processing your request. ";

pub const TIMEOUT_MESSAGE: &str =
    "The request took too long to complete. The AI model might be busy. Please try again in a few moments.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Successful `/chat` response body
#[derive(Debug, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub agent_used: Option<u32>,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

#[derive(Deserialize)]
struct HealthBody {
    status: String,
}

/// Closed taxonomy of `/chat` failures. Every failed send maps to exactly
/// one of these before it reaches the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendFailure {
    /// Backend answered with a non-success status, possibly with a detail message
    ServerError { status: u16, detail: Option<String> },
    /// The 60s request budget elapsed
    Timeout,
    /// Request went out but no response came back (connection drop, refused, DNS)
    NoResponse,
    /// Local failure before or outside the request itself
    ClientFault(String),
}

impl SendFailure {
    /// Text surfaced to the user in the error turn
    pub fn user_message(&self) -> String {
        match self {
            SendFailure::ServerError { status, detail } => match detail {
                Some(detail) => format!("{GENERIC_ERROR_PREFIX}{detail}"),
                None => format!("{GENERIC_ERROR_PREFIX}Server responded with: {status}"),
            },
            SendFailure::Timeout => TIMEOUT_MESSAGE.to_string(),
            SendFailure::NoResponse => format!(
                "{GENERIC_ERROR_PREFIX}No response received from server. Please check if the backend server is running."
            ),
            SendFailure::ClientFault(message) => format!("{GENERIC_ERROR_PREFIX}{message}"),
        }
    }
}

/// Map a transport error onto the failure taxonomy. This is the single place
/// that inspects `reqwest::Error` shapes; callers only see `SendFailure`.
pub fn classify_send_error(err: &reqwest::Error) -> SendFailure {
    if err.is_timeout() {
        SendFailure::Timeout
    } else if err.is_builder() {
        SendFailure::ClientFault(err.to_string())
    } else if err.is_connect() || err.is_request() {
        SendFailure::NoResponse
    } else {
        SendFailure::ClientFault(err.to_string())
    }
}

/// HTTP client for the agent-routing backend
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    chat_timeout: Duration,
}

impl BackendClient {
    pub fn new(base_url: &str, chat_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            chat_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe `GET /health`. Ok only for a 2xx reply whose body reports
    /// `status: "healthy"`; every other outcome is an error.
    pub async fn check_health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "health endpoint returned {}",
                response.status()
            ));
        }

        let body: HealthBody = response.json().await?;
        if body.status != "healthy" {
            return Err(anyhow!("unexpected health status: {}", body.status));
        }

        Ok(())
    }

    /// Submit one message to `POST /chat` under the configured timeout.
    /// Non-success statuses become `ServerError` with the backend's detail
    /// message when one is present.
    pub async fn send_chat(&self, message: &str) -> Result<ChatReply, SendFailure> {
        let url = format!("{}/chat", self.base_url);

        let result = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .timeout(self.chat_timeout)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                let failure = classify_send_error(&err);
                log::warn!("chat request failed ({failure:?}): {err}");
                return Err(failure);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.detail);
            log::warn!("chat request rejected with status {status}");
            return Err(SendFailure::ServerError {
                status: status.as_u16(),
                detail,
            });
        }

        response
            .json::<ChatReply>()
            .await
            .map_err(|err| SendFailure::ClientFault(err.to_string()))
    }
}


/// Transport-level tests against a canned-response socket, so the
/// classification is checked against real reqwest errors.
#[cfg(test)]
mod http_tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener};
    use std::thread;

    /// Serve exactly one connection: read the full request, write `response`
    /// verbatim (with an optional delay first), then close.
    fn one_shot_server(response: Option<String>, delay: Option<Duration>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_request(&mut stream);
            if let Some(delay) = delay {
                thread::sleep(delay);
            }
            if let Some(response) = response {
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
        });

        addr
    }

    fn read_request(stream: &mut std::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                return;
            }
        }
    }

    fn json_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn client_for(addr: SocketAddr, timeout: Duration) -> BackendClient {
        BackendClient::new(&format!("http://{addr}"), timeout)
    }

    #[tokio::test]
    async fn healthy_status_body_passes_the_probe() {
        let addr = one_shot_server(
            Some(json_response("200 OK", r#"{"status":"healthy","message":"Server is operational"}"#)),
            None,
        );
        let client = client_for(addr, Duration::from_secs(5));
        client.check_health().await.unwrap();
    }

    #[tokio::test]
    async fn non_healthy_status_body_fails_the_probe() {
        let addr = one_shot_server(
            Some(json_response("200 OK", r#"{"status":"degraded"}"#)),
            None,
        );
        let client = client_for(addr, Duration::from_secs(5));
        assert!(client.check_health().await.is_err());
    }

    #[tokio::test]
    async fn probe_fails_on_server_error_status() {
        let addr = one_shot_server(
            Some(json_response("500 Internal Server Error", r#"{"detail":"agent down"}"#)),
            None,
        );
        let client = client_for(addr, Duration::from_secs(5));
        assert!(client.check_health().await.is_err());
    }

    #[tokio::test]
    async fn chat_success_parses_response_and_agent() {
        let addr = one_shot_server(
            Some(json_response("200 OK", r#"{"response":"8","agent_used":3}"#)),
            None,
        );
        let client = client_for(addr, Duration::from_secs(5));
        let reply = client.send_chat("Calculate 5 + 3").await.unwrap();
        assert_eq!(reply.response, "8");
        assert_eq!(reply.agent_used, Some(3));
    }

    #[tokio::test]
    async fn chat_server_error_carries_detail() {
        let addr = one_shot_server(
            Some(json_response("500 Internal Server Error", r#"{"detail":"model not loaded"}"#)),
            None,
        );
        let client = client_for(addr, Duration::from_secs(5));
        let failure = client.send_chat("hello").await.unwrap_err();
        assert_eq!(
            failure,
            SendFailure::ServerError {
                status: 500,
                detail: Some("model not loaded".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn chat_server_error_without_body_keeps_status() {
        let addr = one_shot_server(Some(json_response("502 Bad Gateway", "")), None);
        let client = client_for(addr, Duration::from_secs(5));
        let failure = client.send_chat("hello").await.unwrap_err();
        assert_eq!(
            failure,
            SendFailure::ServerError {
                status: 502,
                detail: None,
            }
        );
    }

    #[tokio::test]
    async fn refused_connection_classifies_as_no_response() {
        // Bind then drop to get a port with nothing listening
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let client = client_for(addr, Duration::from_secs(5));
        let failure = client.send_chat("hello").await.unwrap_err();
        assert_eq!(failure, SendFailure::NoResponse);
    }

    #[tokio::test]
    async fn stalled_server_classifies_as_timeout() {
        let addr = one_shot_server(None, Some(Duration::from_secs(2)));
        let client = client_for(addr, Duration::from_millis(200));
        let failure = client.send_chat("hello").await.unwrap_err();
        assert_eq!(failure, SendFailure::Timeout);
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_client_fault() {
        let addr = one_shot_server(Some(json_response("200 OK", "not json")), None);
        let client = client_for(addr, Duration::from_secs(5));
        let failure = client.send_chat("hello").await.unwrap_err();
        assert!(matches!(failure, SendFailure::ClientFault(_)));
    }
}
