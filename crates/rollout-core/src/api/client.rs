//! HTTP implementation of the backend contract.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use super::{ApiError, ConsoleApi};
use crate::config::ConsoleConfig;
use crate::types::{
    Assessment, CreateTaskInput, ErrorCatalogItem, ExecuteScanInput, ExecuteScanResponse,
    ExportFormat, InstallerUpload, MetricsSummary, RecordScanInput, RunRef, Task,
    TaskDeploymentDetail,
};

const API_KEY_HEADER: &str = "X-API-Key";

/// JSON-over-HTTP client for the deployment controller.
#[derive(Debug, Clone)]
pub struct HttpConsoleApi {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpConsoleApi {
    /// Create a client for the given base URL.
    ///
    /// An absent or empty API key omits the auth header.
    pub fn new(base_url: Url, api_key: Option<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rollout/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }

    pub fn from_config(config: &ConsoleConfig) -> Result<Self, ApiError> {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        debug!(%method, %url, "backend request");
        let builder = self.client.request(method, url);
        match &self.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder, fallback: &str) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::status(status.as_u16(), &body, fallback))
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::send(builder, "Request failed").await?;
        let value = response.json::<T>().await?;
        Ok(value)
    }
}

#[async_trait]
impl ConsoleApi for HttpConsoleApi {
    async fn create_task(&self, input: &CreateTaskInput) -> Result<Task, ApiError> {
        Self::send_json(self.request(Method::POST, "/api/tasks").json(input)).await
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, ApiError> {
        Self::send_json(self.request(Method::GET, "/api/tasks")).await
    }

    async fn create_run(&self, task_id: &str) -> Result<RunRef, ApiError> {
        let path = format!("/api/tasks/{}/runs", task_id);
        Self::send_json(self.request(Method::POST, &path)).await
    }

    async fn update_run(&self, run_id: &str, status: &str) -> Result<RunRef, ApiError> {
        let path = format!("/api/runs/{}", run_id);
        let body = serde_json::json!({ "status": status });
        Self::send_json(self.request(Method::PATCH, &path).json(&body)).await
    }

    async fn record_scan(&self, input: &RecordScanInput) -> Result<(), ApiError> {
        Self::send(
            self.request(Method::POST, "/api/scans").json(input),
            "Request failed",
        )
        .await?;
        Ok(())
    }

    async fn metrics(&self) -> Result<MetricsSummary, ApiError> {
        Self::send_json(self.request(Method::GET, "/api/metrics")).await
    }

    async fn error_catalog(&self) -> Result<Vec<ErrorCatalogItem>, ApiError> {
        Self::send_json(self.request(Method::GET, "/api/errors")).await
    }

    async fn assessments(&self) -> Result<Vec<Assessment>, ApiError> {
        Self::send_json(self.request(Method::GET, "/api/assessments")).await
    }

    async fn task_deployments(
        &self,
        task_id: &str,
    ) -> Result<Vec<TaskDeploymentDetail>, ApiError> {
        let path = format!("/api/tasks/{}/deployments", task_id);
        Self::send_json(self.request(Method::GET, &path)).await
    }

    async fn export_report(
        &self,
        task_id: &str,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ApiError> {
        let path = format!("/api/tasks/{}/exports/{}", task_id, format.as_str());
        let response = Self::send(self.request(Method::GET, &path), "Export failed").await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn execute_scan(
        &self,
        input: &ExecuteScanInput,
    ) -> Result<ExecuteScanResponse, ApiError> {
        Self::send_json(self.request(Method::POST, "/api/scans/execute").json(input)).await
    }

    async fn upload_installer(&self, path: &Path) -> Result<InstallerUpload, ApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| ApiError::Io(format!("Failed to read {}: {}", path.display(), err)))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "installer.bin".to_string());

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = Self::send(
            self.request(Method::POST, "/api/uploads/installer")
                .multipart(form),
            "Upload failed",
        )
        .await?;
        let upload = response.json::<InstallerUpload>().await?;
        Ok(upload)
    }
}
