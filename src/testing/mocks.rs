//! Mock implementations for testing

use crate::api::{
    AnalysisResult, GenerationStatus, PhotoFile, PhotoUploadResponse, PipelineGateway,
    PipelineStatus, Project, StylePreference, UploadedPhoto,
};
use crate::error::Result;
use crate::session::{SessionEvent, SessionId, SessionObserver};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Build a canned project record
pub fn sample_project(id: &str, status: PipelineStatus) -> Project {
    Project {
        id: id.to_string(),
        title: Some("My Shorts".to_string()),
        status,
        photo_count: 0,
        narrative: None,
        video_url: None,
        created_at: Utc::now(),
        completed_at: None,
    }
}

/// Build a canned analysis result
pub fn sample_analysis(project_id: &str) -> AnalysisResult {
    AnalysisResult {
        project_id: project_id.to_string(),
        photos: Vec::new(),
        overall_theme: "a day at the beach".to_string(),
        suggested_narrative_arc: "arrival, play, sunset".to_string(),
        emotional_journey: vec!["anticipation".to_string(), "joy".to_string()],
    }
}

/// Build a generation status report
pub fn status_report(
    project_id: &str,
    status: PipelineStatus,
    progress: u8,
    message: &str,
    video_url: Option<&str>,
) -> GenerationStatus {
    GenerationStatus {
        project_id: project_id.to_string(),
        status,
        progress,
        message: message.to_string(),
        video_url: video_url.map(String::from),
    }
}

#[derive(Default)]
struct ScriptedResponses {
    create_project: VecDeque<Result<Project>>,
    get_project: VecDeque<Result<Project>>,
    upload_photos: VecDeque<Result<PhotoUploadResponse>>,
    set_narrative: VecDeque<Result<()>>,
    start_analysis: VecDeque<Result<AnalysisResult>>,
    start_generation: VecDeque<Result<()>>,
    generation_status: VecDeque<Result<GenerationStatus>>,
    delete_project: VecDeque<Result<()>>,
}

/// Mock implementation of [`PipelineGateway`] with scripted responses.
///
/// Every endpoint succeeds with canned data unless a response has been
/// queued for it; queued responses are consumed in order. Status queries
/// repeat the last delivered status once their queue runs dry, matching a
/// backend that keeps reporting its steady state.
pub struct MockGateway {
    responses: Mutex<ScriptedResponses>,
    last_status: Mutex<Option<GenerationStatus>>,
    calls: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(ScriptedResponses::default()),
            last_status: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_create_project(&self, result: Result<Project>) {
        self.responses.lock().unwrap().create_project.push_back(result);
    }

    pub fn queue_get_project(&self, result: Result<Project>) {
        self.responses.lock().unwrap().get_project.push_back(result);
    }

    pub fn queue_upload_photos(&self, result: Result<PhotoUploadResponse>) {
        self.responses.lock().unwrap().upload_photos.push_back(result);
    }

    pub fn queue_set_narrative(&self, result: Result<()>) {
        self.responses.lock().unwrap().set_narrative.push_back(result);
    }

    pub fn queue_start_analysis(&self, result: Result<AnalysisResult>) {
        self.responses.lock().unwrap().start_analysis.push_back(result);
    }

    pub fn queue_start_generation(&self, result: Result<()>) {
        self.responses.lock().unwrap().start_generation.push_back(result);
    }

    pub fn queue_status(&self, result: Result<GenerationStatus>) {
        self.responses.lock().unwrap().generation_status.push_back(result);
    }

    pub fn queue_delete_project(&self, result: Result<()>) {
        self.responses.lock().unwrap().delete_project.push_back(result);
    }

    /// Every recorded call, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times the named endpoint was hit
    pub fn call_count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.as_str() == name)
            .count()
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelineGateway for MockGateway {
    async fn create_project(&self, title: Option<&str>) -> Result<Project> {
        self.record("create_project");
        let scripted = self.responses.lock().unwrap().create_project.pop_front();
        match scripted {
            Some(result) => result,
            None => {
                let mut project = sample_project("project-1", PipelineStatus::Draft);
                project.title = title.map(String::from);
                Ok(project)
            }
        }
    }

    async fn get_project(&self, project_id: &str) -> Result<Project> {
        self.record("get_project");
        let scripted = self.responses.lock().unwrap().get_project.pop_front();
        match scripted {
            Some(result) => result,
            None => Ok(sample_project(project_id, PipelineStatus::Draft)),
        }
    }

    async fn upload_photos(
        &self,
        _project_id: &str,
        photos: &[PhotoFile],
    ) -> Result<PhotoUploadResponse> {
        self.record("upload_photos");
        let scripted = self.responses.lock().unwrap().upload_photos.pop_front();
        match scripted {
            Some(result) => result,
            None => Ok(PhotoUploadResponse {
                message: format!("{} photos uploaded", photos.len()),
                photos: photos
                    .iter()
                    .enumerate()
                    .map(|(i, photo)| UploadedPhoto {
                        id: format!("photo-{i}"),
                        filename: photo.filename.clone(),
                    })
                    .collect(),
            }),
        }
    }

    async fn set_narrative(
        &self,
        _project_id: &str,
        _narrative: &str,
        _style: StylePreference,
    ) -> Result<()> {
        self.record("set_narrative");
        let scripted = self.responses.lock().unwrap().set_narrative.pop_front();
        scripted.unwrap_or(Ok(()))
    }

    async fn start_analysis(&self, project_id: &str) -> Result<AnalysisResult> {
        self.record("start_analysis");
        let scripted = self.responses.lock().unwrap().start_analysis.pop_front();
        match scripted {
            Some(result) => result,
            None => Ok(sample_analysis(project_id)),
        }
    }

    async fn start_generation(&self, _project_id: &str) -> Result<()> {
        self.record("start_generation");
        let scripted = self.responses.lock().unwrap().start_generation.pop_front();
        scripted.unwrap_or(Ok(()))
    }

    async fn generation_status(&self, project_id: &str) -> Result<GenerationStatus> {
        self.record("generation_status");
        let scripted = self.responses.lock().unwrap().generation_status.pop_front();
        match scripted {
            Some(result) => {
                if let Ok(status) = &result {
                    *self.last_status.lock().unwrap() = Some(status.clone());
                }
                result
            }
            None => {
                let last = self.last_status.lock().unwrap().clone();
                Ok(last.unwrap_or_else(|| {
                    status_report(project_id, PipelineStatus::Generating, 50, "working", None)
                }))
            }
        }
    }

    async fn delete_project(&self, _project_id: &str) -> Result<()> {
        self.record("delete_project");
        let scripted = self.responses.lock().unwrap().delete_project.pop_front();
        scripted.unwrap_or(Ok(()))
    }
}

/// Observer that records every event it sees
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }

    /// The (progress, message) pairs of every milestone seen, in order
    pub fn milestones(&self) -> Vec<(u8, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::Milestone { progress, message } => Some((progress, message)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SessionObserver for RecordingObserver {
    async fn on_event(&self, _session_id: &SessionId, event: &SessionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
