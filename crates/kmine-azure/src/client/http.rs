//! Shared request plumbing for the completion clients.

use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Azure error envelope: `{"error": {"code": "...", "message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Builds an HTTP client with the given request timeout.
pub(crate) fn build_http(timeout: std::time::Duration) -> Result<reqwest::Client> {
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("kmine/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(http)
}

/// Sends a request and decodes a JSON success body.
pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await?;
    let response = check_status(response).await?;
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Turns a non-success response into [`Error::Api`].
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::api(status.as_u16(), error_message(&body)))
}

/// Extracts the most useful message from an error body.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: ErrorBody {
                message: Some(message),
                ..
            },
        }) => message,
        Ok(ErrorEnvelope {
            error: ErrorBody {
                code: Some(code), ..
            },
        }) => code,
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_message_field() {
        let body = r#"{"error":{"code":"429","message":"Rate limit is exceeded."}}"#;
        assert_eq!(error_message(body), "Rate limit is exceeded.");
    }

    #[test]
    fn error_message_falls_back_to_code() {
        let body = r#"{"error":{"code":"DeploymentNotFound"}}"#;
        assert_eq!(error_message(body), "DeploymentNotFound");
    }

    #[test]
    fn error_message_passes_through_plain_text() {
        assert_eq!(error_message(" Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_message(""), "empty response body");
    }
}
