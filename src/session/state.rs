//! Session state machine implementation

use super::SessionId;
use crate::api::{GenerationStatus, PhotoFile, PipelineStatus, StylePreference};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum photos required to leave the upload step
pub const MIN_PHOTOS: usize = 3;
/// Photos beyond this count are ignored
pub const MAX_PHOTOS: usize = 10;
/// Minimum narrative length (in characters) required to start processing
pub const MIN_NARRATIVE_CHARS: usize = 20;

/// User-facing workflow steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Upload,
    Narrative,
    Processing,
    Complete,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::Upload => "upload",
            Step::Narrative => "narrative",
            Step::Processing => "processing",
            Step::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Latest known pipeline status for the session's project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: PipelineStatus,
    /// 0-100
    pub progress: u8,
    pub message: String,
    pub video_url: Option<String>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            status: PipelineStatus::Draft,
            progress: 0,
            message: String::new(),
            video_url: None,
        }
    }
}

/// One end-to-end video generation attempt
///
/// Fields are private so every mutation goes through the transition methods
/// below; an ungated forward transition is a no-op, never an error.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    step: Step,
    title: Option<String>,
    photos: Vec<PhotoFile>,
    narrative: String,
    style: StylePreference,
    project_id: Option<String>,
    status: StatusSnapshot,
    error: Option<String>,
}

impl Session {
    /// Create an empty session at the upload step
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            step: Step::Upload,
            title: None,
            photos: Vec::new(),
            narrative: String::new(),
            style: StylePreference::default(),
            project_id: None,
            status: StatusSnapshot::default(),
            error: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn photos(&self) -> &[PhotoFile] {
        &self.photos
    }

    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    pub fn style(&self) -> StylePreference {
        self.style
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn status(&self) -> &StatusSnapshot {
        &self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn video_url(&self) -> Option<&str> {
        self.status.video_url.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Add a photo, preserving order. Returns false once the cap is reached.
    pub fn add_photo(&mut self, photo: PhotoFile) -> bool {
        if self.photos.len() >= MAX_PHOTOS {
            return false;
        }
        self.photos.push(photo);
        true
    }

    /// Add photos in order; anything beyond the cap is dropped
    pub fn add_photos(&mut self, photos: impl IntoIterator<Item = PhotoFile>) {
        for photo in photos {
            if !self.add_photo(photo) {
                break;
            }
        }
    }

    pub fn set_narrative(&mut self, narrative: impl Into<String>) {
        self.narrative = narrative.into();
    }

    pub fn set_style(&mut self, style: StylePreference) {
        self.style = style;
    }

    /// Whether the current step's forward guard is satisfied
    pub fn can_proceed(&self) -> bool {
        match self.step {
            Step::Upload => self.photos.len() >= MIN_PHOTOS,
            Step::Narrative => self.narrative.chars().count() >= MIN_NARRATIVE_CHARS,
            Step::Processing | Step::Complete => false,
        }
    }

    /// Advance to the next step if the guard allows it.
    ///
    /// Returns the new step on success, None when the guard rejected the
    /// transition or there is no forward transition from the current step.
    pub fn advance(&mut self) -> Option<Step> {
        if !self.can_proceed() {
            return None;
        }
        self.step = match self.step {
            Step::Upload => Step::Narrative,
            Step::Narrative => Step::Processing,
            Step::Processing | Step::Complete => return None,
        };
        Some(self.step)
    }

    /// Go back from the narrative step, keeping photos and narrative intact
    pub fn back(&mut self) -> Option<Step> {
        match self.step {
            Step::Narrative => {
                self.step = Step::Upload;
                Some(self.step)
            }
            _ => None,
        }
    }

    /// Associate the remote project created for this attempt
    pub fn assign_project(&mut self, project_id: String) {
        self.project_id = Some(project_id);
    }

    /// Record a locally-assigned progress milestone
    pub fn record_milestone(&mut self, status: PipelineStatus, progress: u8, message: &str) {
        self.status = StatusSnapshot {
            status,
            progress,
            message: message.to_string(),
            video_url: None,
        };
    }

    /// Fold a remote-reported status into the session.
    ///
    /// Progress never decreases while the pipeline is active; a stale or
    /// out-of-order reading keeps the highest value seen for this project.
    pub fn apply_remote_status(&mut self, remote: &GenerationStatus) {
        let progress = if remote.status.is_active() {
            remote.progress.max(self.status.progress)
        } else {
            remote.progress
        };
        self.status = StatusSnapshot {
            status: remote.status,
            progress,
            message: remote.message.clone(),
            video_url: remote.video_url.clone(),
        };
        if remote.status == PipelineStatus::Failed {
            self.error = Some(if remote.message.is_empty() {
                "Generation failed".to_string()
            } else {
                remote.message.clone()
            });
        }
    }

    /// Transition to the complete step.
    ///
    /// Only legal from processing with a completed status carrying a video
    /// URL; anything else is a no-op.
    pub fn complete(&mut self) -> bool {
        let has_video = self
            .status
            .video_url
            .as_deref()
            .is_some_and(|url| !url.is_empty());
        if self.step == Step::Processing
            && self.status.status == PipelineStatus::Completed
            && has_video
        {
            self.step = Step::Complete;
            true
        } else {
            false
        }
    }

    /// Freeze the attempt in a failed state; only reset leaves it
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.status = StatusSnapshot {
            status: PipelineStatus::Failed,
            progress: 0,
            message: "Generation failed".to_string(),
            video_url: None,
        };
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Whether the status poller is allowed to run
    pub fn is_polling_active(&self) -> bool {
        self.project_id.is_some() && self.status.status.is_active()
    }

    /// Whether this attempt has reached an end state (success or frozen failure)
    pub fn is_terminal(&self) -> bool {
        self.step == Step::Complete || (self.step == Step::Processing && self.error.is_some())
    }

    /// Restore the session to its initial values, including a fresh ID.
    /// The stale project identifier is never reused by a later attempt.
    pub fn reset(&mut self) {
        *self = Session::new();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(name: &str) -> PhotoFile {
        PhotoFile::new(name, vec![0u8; 4])
    }

    fn session_with_photos(count: usize) -> Session {
        let mut session = Session::new();
        for i in 0..count {
            session.add_photo(photo(&format!("photo-{i}.jpg")));
        }
        session
    }

    #[test]
    fn test_upload_guard_requires_three_photos() {
        let mut session = session_with_photos(2);
        assert!(!session.can_proceed());
        assert_eq!(session.advance(), None);
        assert_eq!(session.step(), Step::Upload);

        session.add_photo(photo("third.jpg"));
        assert_eq!(session.advance(), Some(Step::Narrative));
    }

    #[test]
    fn test_photo_cap_is_enforced() {
        let mut session = session_with_photos(MAX_PHOTOS);
        assert!(!session.add_photo(photo("over.jpg")));
        assert_eq!(session.photos().len(), MAX_PHOTOS);

        session.add_photos(vec![photo("a.jpg"), photo("b.jpg")]);
        assert_eq!(session.photos().len(), MAX_PHOTOS);
    }

    #[test]
    fn test_photo_order_is_preserved() {
        let mut session = Session::new();
        session.add_photos(vec![photo("first.jpg"), photo("second.jpg"), photo("third.jpg")]);
        let names: Vec<_> = session.photos().iter().map(|p| p.filename.as_str()).collect();
        assert_eq!(names, ["first.jpg", "second.jpg", "third.jpg"]);
    }

    #[test]
    fn test_narrative_guard_requires_twenty_chars() {
        let mut session = session_with_photos(3);
        session.advance();
        session.set_narrative("too short");
        assert_eq!(session.advance(), None);
        assert_eq!(session.step(), Step::Narrative);

        session.set_narrative("a narrative that is long enough to pass");
        assert_eq!(session.advance(), Some(Step::Processing));
    }

    #[test]
    fn test_back_preserves_inputs() {
        let mut session = session_with_photos(3);
        session.advance();
        session.set_narrative("some text");
        assert_eq!(session.back(), Some(Step::Upload));
        assert_eq!(session.photos().len(), 3);
        assert_eq!(session.narrative(), "some text");

        // back is only defined from the narrative step
        assert_eq!(session.back(), None);
    }

    #[test]
    fn test_no_forward_transition_from_processing() {
        let mut session = session_with_photos(3);
        session.advance();
        session.set_narrative("a narrative that is long enough to pass");
        session.advance();
        assert_eq!(session.step(), Step::Processing);
        assert!(!session.can_proceed());
        assert_eq!(session.advance(), None);
    }

    #[test]
    fn test_remote_progress_never_decreases_while_active() {
        let mut session = Session::new();
        session.assign_project("p1".to_string());
        session.apply_remote_status(&GenerationStatus {
            project_id: "p1".to_string(),
            status: PipelineStatus::Generating,
            progress: 80,
            message: "rendering".to_string(),
            video_url: None,
        });
        session.apply_remote_status(&GenerationStatus {
            project_id: "p1".to_string(),
            status: PipelineStatus::Generating,
            progress: 60,
            message: "rendering".to_string(),
            video_url: None,
        });
        assert_eq!(session.status().progress, 80);
    }

    #[test]
    fn test_remote_failure_sets_error() {
        let mut session = Session::new();
        session.assign_project("p1".to_string());
        session.apply_remote_status(&GenerationStatus {
            project_id: "p1".to_string(),
            status: PipelineStatus::Failed,
            progress: 40,
            message: "scene rendering crashed".to_string(),
            video_url: None,
        });
        assert_eq!(session.error(), Some("scene rendering crashed"));
        assert!(!session.is_polling_active());
    }

    #[test]
    fn test_complete_requires_video_url() {
        let mut session = session_with_photos(3);
        session.advance();
        session.set_narrative("a narrative that is long enough to pass");
        session.advance();
        session.assign_project("p1".to_string());

        session.apply_remote_status(&GenerationStatus {
            project_id: "p1".to_string(),
            status: PipelineStatus::Completed,
            progress: 100,
            message: "done".to_string(),
            video_url: None,
        });
        assert!(!session.complete());
        assert_eq!(session.step(), Step::Processing);

        session.apply_remote_status(&GenerationStatus {
            project_id: "p1".to_string(),
            status: PipelineStatus::Completed,
            progress: 100,
            message: "done".to_string(),
            video_url: Some("https://host/video.mp4".to_string()),
        });
        assert!(session.complete());
        assert_eq!(session.step(), Step::Complete);
        assert!(session.is_terminal());
    }

    #[test]
    fn test_mark_failed_freezes_at_processing() {
        let mut session = session_with_photos(3);
        session.advance();
        session.set_narrative("a narrative that is long enough to pass");
        session.advance();
        session.mark_failed("backend rejected the narrative");

        assert_eq!(session.step(), Step::Processing);
        assert_eq!(session.error(), Some("backend rejected the narrative"));
        assert_eq!(session.status().status, PipelineStatus::Failed);
        assert_eq!(session.status().progress, 0);
        assert!(session.is_terminal());
    }

    #[test]
    fn test_reset_restores_initial_values() {
        let mut session = session_with_photos(4);
        let old_id = session.id().clone();
        session.set_title("My Shorts");
        session.advance();
        session.set_narrative("a narrative that is long enough to pass");
        session.advance();
        session.assign_project("p1".to_string());
        session.mark_failed("boom");

        session.reset();
        assert_eq!(session.step(), Step::Upload);
        assert!(session.photos().is_empty());
        assert_eq!(session.narrative(), "");
        assert_eq!(session.style(), StylePreference::Emotional);
        assert_eq!(session.title(), None);
        assert_eq!(session.project_id(), None);
        assert_eq!(session.status(), &StatusSnapshot::default());
        assert_eq!(session.error(), None);
        // a fresh attempt gets a fresh identity
        assert_ne!(session.id(), &old_id);
    }
}
