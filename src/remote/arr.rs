use super::request::RequestClient;
use super::{MediaSource, RemoteError};
use crate::config::ConnectionConfig;
use serde_json::Value;
use std::time::Duration;
use trailarr_common::SourceKind;

struct BaseArrClient {
    http: RequestClient,
    app: &'static str,
}

impl BaseArrClient {
    fn new(config: &ConnectionConfig, kind: SourceKind, timeout: Duration) -> Self {
        let app = kind.app_name();
        let http = RequestClient::new(
            &config.url,
            app,
            vec![("X-Api-Key", config.api_key.clone())],
            timeout,
        );
        Self { http, app }
    }

    fn url(path: &str) -> String {
        format!("/api/v3{}", path)
    }

    async fn system_status(&self) -> Result<String, RemoteError> {
        let body = self.http.get_json(&Self::url("/system/status")).await?;

        let app_name = body.get("appName").and_then(Value::as_str);
        let version = body.get("version").and_then(Value::as_str);

        match (app_name, version) {
            (Some(app_name), Some(version)) if app_name.eq_ignore_ascii_case(self.app) => Ok(
                format!("{} Connection Successful! Version: {}", app_name, version),
            ),
            _ => Err(RemoteError::InvalidResponse(format!(
                "Invalid host or API key, not a {} instance.",
                self.app
            ))),
        }
    }

    async fn list(&self, path: &str) -> Result<Vec<Value>, RemoteError> {
        match self.http.get_json(&Self::url(path)).await? {
            Value::Array(items) => Ok(items),
            _ => Err(RemoteError::InvalidResponse(format!(
                "Invalid response from {}: expected a list of media",
                self.app
            ))),
        }
    }
}

pub struct RadarrClient(BaseArrClient);

impl RadarrClient {
    pub fn new(config: &ConnectionConfig, timeout: Duration) -> Self {
        Self(BaseArrClient::new(config, SourceKind::Radarr, timeout))
    }
}

#[async_trait::async_trait]
impl MediaSource for RadarrClient {
    async fn system_status(&self) -> Result<String, RemoteError> {
        self.0.system_status().await
    }

    async fn all_media(&self) -> Result<Vec<Value>, RemoteError> {
        self.0.list("/movie").await
    }
}

pub struct SonarrClient(BaseArrClient);

impl SonarrClient {
    pub fn new(config: &ConnectionConfig, timeout: Duration) -> Self {
        Self(BaseArrClient::new(config, SourceKind::Sonarr, timeout))
    }
}

#[async_trait::async_trait]
impl MediaSource for SonarrClient {
    async fn system_status(&self) -> Result<String, RemoteError> {
        self.0.system_status().await
    }

    async fn all_media(&self) -> Result<Vec<Value>, RemoteError> {
        self.0.list("/series").await
    }
}
