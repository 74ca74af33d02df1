//! Shared HTTP plumbing for the remote clients.

use super::RemoteError;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

pub(crate) struct RequestClient {
    client: Client,
    base_url: String,
    /// Application name used in diagnostics, e.g. "Radarr".
    app: &'static str,
    headers: Vec<(&'static str, String)>,
}

impl RequestClient {
    pub(crate) fn new(
        base_url: &str,
        app: &'static str,
        headers: Vec<(&'static str, String)>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app,
            headers,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and decode the body as JSON.
    pub(crate) async fn get_json(&self, path: &str) -> Result<Value, RemoteError> {
        let mut request = self.client.get(self.url(path));
        for (name, value) in &self.headers {
            request = request.header(*name, value);
        }

        tracing::trace!("GET {}{}", self.base_url, path);
        let response = request.send().await.map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.status_error(status, response).await);
        }

        let body = response.bytes().await.map_err(map_send_error)?;
        serde_json::from_slice(&body).map_err(|_| {
            RemoteError::InvalidResponse(format!(
                "Invalid response from server! Check if {} is a valid {} API endpoint.",
                self.base_url, self.app
            ))
        })
    }

    async fn status_error(&self, status: StatusCode, response: Response) -> RemoteError {
        let url = response.url().clone();
        let message = match status.as_u16() {
            400 => {
                let text = response.text().await.unwrap_or_default();
                format!("Bad Request, possibly a bug. {}", text.trim())
            }
            401 => format!(
                "Unauthorized. Please ensure a valid {} API key is used.",
                self.app
            ),
            403 => format!(
                "Access restricted. Please ensure the {} API key has correct permissions.",
                self.app
            ),
            404 => format!("Resource not found: {}", url),
            405 => format!("The endpoint {} is not allowed", url),
            500 => {
                let text = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<Value>(&text)
                    .ok()
                    .and_then(|body| body.get("message")?.as_str().map(str::to_string))
                    .unwrap_or(text);
                if message.trim().is_empty() {
                    "Internal Server Error: Unknown Error Occurred.".to_string()
                } else {
                    format!("Internal Server Error: {}", message.trim())
                }
            }
            502 => format!(
                "Bad Gateway. Check if your server at {} is accessible.",
                url
            ),
            code => format!(
                "Unexpected status {} from {}, not a {} instance.",
                code, self.base_url, self.app
            ),
        };

        RemoteError::Connection(message)
    }
}

fn map_send_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout("Timeout occurred while connecting to API.".to_string())
    } else if e.is_connect() {
        RemoteError::Connection("Connection refused while connecting to API.".to_string())
    } else {
        RemoteError::Connection("Unable to connect to API. Check your connection.".to_string())
    }
}
