//! Typed surface of the remote video pipeline API.
//!
//! Request/response shapes for the REST backend plus the [`PipelineGateway`]
//! trait the rest of the crate consumes, so the HTTP transport can be swapped
//! for a mock in tests.

pub mod gateway;

pub use gateway::{HttpGateway, PipelineGateway};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status shared by projects and generation status reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    Draft,
    Analyzing,
    Generating,
    Completed,
    Failed,
}

impl PipelineStatus {
    /// Check if no further remote transitions are expected
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStatus::Completed | PipelineStatus::Failed)
    }

    /// Check if the remote pipeline is actively working
    pub fn is_active(&self) -> bool {
        matches!(self, PipelineStatus::Analyzing | PipelineStatus::Generating)
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStatus::Draft => "draft",
            PipelineStatus::Analyzing => "analyzing",
            PipelineStatus::Generating => "generating",
            PipelineStatus::Completed => "completed",
            PipelineStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Presentation style applied to the generated video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StylePreference {
    Romantic,
    Nostalgic,
    Happy,
    #[default]
    Emotional,
    Cinematic,
}

impl fmt::Display for StylePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StylePreference::Romantic => "romantic",
            StylePreference::Nostalgic => "nostalgic",
            StylePreference::Happy => "happy",
            StylePreference::Emotional => "emotional",
            StylePreference::Cinematic => "cinematic",
        };
        write!(f, "{s}")
    }
}

/// An image payload queued for upload, in final video order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl PhotoFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// MIME type guessed from the filename extension
    pub fn content_type(&self) -> String {
        mime_guess::from_path(&self.filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

/// A remote video project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: Option<String>,
    pub status: PipelineStatus,
    pub photo_count: usize,
    pub narrative: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Point-in-time generation status for a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationStatus {
    pub project_id: String,
    pub status: PipelineStatus,
    /// 0-100
    pub progress: u8,
    pub message: String,
    #[serde(default)]
    pub video_url: Option<String>,
}

/// One photo as accepted by the upload endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedPhoto {
    pub id: String,
    pub filename: String,
}

/// Response to a multi-photo upload
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoUploadResponse {
    #[serde(default)]
    pub message: String,
    pub photos: Vec<UploadedPhoto>,
}

/// Per-photo AI analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoAnalysis {
    pub photo_id: String,
    pub people: serde_json::Value,
    pub setting: serde_json::Value,
    pub mood: String,
    pub colors: Vec<String>,
    pub key_elements: Vec<String>,
}

/// Result of analyzing every photo in a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub project_id: String,
    pub photos: Vec<PhotoAnalysis>,
    pub overall_theme: String,
    pub suggested_narrative_arc: String,
    pub emotional_journey: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_status_classification() {
        assert!(PipelineStatus::Completed.is_terminal());
        assert!(PipelineStatus::Failed.is_terminal());
        assert!(!PipelineStatus::Generating.is_terminal());

        assert!(PipelineStatus::Analyzing.is_active());
        assert!(PipelineStatus::Generating.is_active());
        assert!(!PipelineStatus::Draft.is_active());
        assert!(!PipelineStatus::Completed.is_active());
    }

    #[test]
    fn test_status_wire_format() {
        let json = r#"{
            "project_id": "abc",
            "status": "generating",
            "progress": 60,
            "message": "rendering scenes"
        }"#;
        let status: GenerationStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.status, PipelineStatus::Generating);
        assert_eq!(status.progress, 60);
        assert_eq!(status.video_url, None);

        let round = serde_json::to_value(&status).unwrap();
        assert_eq!(round["status"], "generating");
    }

    #[test]
    fn test_project_deserializes_null_fields() {
        let json = r#"{
            "id": "p1",
            "title": null,
            "status": "draft",
            "photo_count": 0,
            "narrative": null,
            "video_url": null,
            "created_at": "2025-06-01T10:00:00Z",
            "completed_at": null
        }"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.status, PipelineStatus::Draft);
        assert!(project.title.is_none());
        assert!(project.completed_at.is_none());
    }
}
