//! HTTP gateway to the video pipeline backend
//!
//! Provides a trait-based abstraction over the remote REST API so the
//! workflow can be driven against a mock in tests without a running backend.

use crate::api::{
    AnalysisResult, GenerationStatus, PhotoFile, PhotoUploadResponse, Project, StylePreference,
};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde_json::json;
use std::time::Duration;
use url::Url;

/// Remote pipeline operations consumed by the workflow
///
/// One method per backend endpoint. Implementations must not retry on their
/// own; retry and failure policy belongs to the caller.
#[async_trait]
pub trait PipelineGateway: Send + Sync {
    /// Create a new remote project
    async fn create_project(&self, title: Option<&str>) -> Result<Project>;

    /// Fetch a project's current record
    async fn get_project(&self, project_id: &str) -> Result<Project>;

    /// Upload photos to a project, preserving their order
    async fn upload_photos(
        &self,
        project_id: &str,
        photos: &[PhotoFile],
    ) -> Result<PhotoUploadResponse>;

    /// Attach the narrative and style to a project
    async fn set_narrative(
        &self,
        project_id: &str,
        narrative: &str,
        style: StylePreference,
    ) -> Result<()>;

    /// Kick off photo analysis
    async fn start_analysis(&self, project_id: &str) -> Result<AnalysisResult>;

    /// Kick off video generation
    async fn start_generation(&self, project_id: &str) -> Result<()>;

    /// Query generation status
    async fn generation_status(&self, project_id: &str) -> Result<GenerationStatus>;

    /// Delete a remote project
    async fn delete_project(&self, project_id: &str) -> Result<()>;
}

/// reqwest-backed implementation of [`PipelineGateway`]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    /// Create a new gateway from API configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        // Url::join treats the last path segment as a file unless the base
        // ends with a slash.
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Map a non-success response into a structured gateway error
    async fn failure(response: Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Error::Gateway {
            code: Some(status.as_u16()),
            message: failure_message(status, &body),
        }
    }

    async fn expect_ok(response: Response) -> Result<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::failure(response).await)
        }
    }
}

#[async_trait]
impl PipelineGateway for HttpGateway {
    async fn create_project(&self, title: Option<&str>) -> Result<Project> {
        let response = self
            .client
            .post(self.endpoint("projects")?)
            .json(&json!({ "title": title }))
            .send()
            .await?;
        Ok(Self::expect_ok(response).await?.json().await?)
    }

    async fn get_project(&self, project_id: &str) -> Result<Project> {
        let response = self
            .client
            .get(self.endpoint(&format!("projects/{project_id}"))?)
            .send()
            .await?;
        Ok(Self::expect_ok(response).await?.json().await?)
    }

    async fn upload_photos(
        &self,
        project_id: &str,
        photos: &[PhotoFile],
    ) -> Result<PhotoUploadResponse> {
        let mut form = Form::new();
        for photo in photos {
            let part = Part::bytes(photo.bytes.clone())
                .file_name(photo.filename.clone())
                .mime_str(&photo.content_type())
                .map_err(|e| Error::Config(format!("Invalid photo MIME type: {e}")))?;
            form = form.part("files", part);
        }

        let response = self
            .client
            .post(self.endpoint(&format!("projects/{project_id}/photos"))?)
            .multipart(form)
            .send()
            .await?;
        Ok(Self::expect_ok(response).await?.json().await?)
    }

    async fn set_narrative(
        &self,
        project_id: &str,
        narrative: &str,
        style: StylePreference,
    ) -> Result<()> {
        let response = self
            .client
            .put(self.endpoint(&format!("projects/{project_id}/narrative"))?)
            .json(&json!({ "narrative": narrative, "style": style }))
            .send()
            .await?;
        Self::expect_ok(response).await?;
        Ok(())
    }

    async fn start_analysis(&self, project_id: &str) -> Result<AnalysisResult> {
        let response = self
            .client
            .post(self.endpoint(&format!("projects/{project_id}/analyze"))?)
            .send()
            .await?;
        Ok(Self::expect_ok(response).await?.json().await?)
    }

    async fn start_generation(&self, project_id: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint(&format!("projects/{project_id}/generate"))?)
            .send()
            .await?;
        Self::expect_ok(response).await?;
        Ok(())
    }

    async fn generation_status(&self, project_id: &str) -> Result<GenerationStatus> {
        let response = self
            .client
            .get(self.endpoint(&format!("projects/{project_id}/status"))?)
            .send()
            .await?;
        Ok(Self::expect_ok(response).await?.json().await?)
    }

    async fn delete_project(&self, project_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.endpoint(&format!("projects/{project_id}"))?)
            .send()
            .await?;
        Self::expect_ok(response).await?;
        Ok(())
    }
}

/// The most specific failure message a response offers.
///
/// The backend reports failures as `{ "detail": "..." }`; prefer that over
/// the raw body, and the raw body over a bare status code.
fn failure_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
        .unwrap_or_else(|| {
            if body.is_empty() {
                format!("Request failed with status {status}")
            } else {
                body.to_string()
            }
        })
}
