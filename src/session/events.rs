//! Event-driven session observation

use super::SessionId;
use crate::api::GenerationStatus;
use crate::session::state::Step;
use async_trait::async_trait;

/// Events emitted as a session moves through the workflow
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The user-facing step changed
    StepChanged { step: Step },
    /// The orchestrator recorded a local progress milestone
    Milestone { progress: u8, message: String },
    /// The poller folded in a fresh remote status
    StatusUpdated { status: GenerationStatus },
    /// The video is ready
    Completed { video_url: String },
    /// The attempt failed; only reset leaves this state
    Failed { error: String },
    /// The session was reset to its initial values
    Reset,
}

impl SessionEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            SessionEvent::StepChanged { step } => format!("Step changed to {step}"),
            SessionEvent::Milestone { progress, message } => {
                if message.is_empty() {
                    format!("Progress {progress}%")
                } else {
                    format!("Progress {progress}%: {message}")
                }
            }
            SessionEvent::StatusUpdated { status } => {
                format!("Remote status {} at {}%", status.status, status.progress)
            }
            SessionEvent::Completed { video_url } => format!("Video ready at {video_url}"),
            SessionEvent::Failed { error } => format!("Attempt failed: {error}"),
            SessionEvent::Reset => "Session reset".to_string(),
        }
    }
}

/// Observer notified of session events
///
/// Implementations must be cheap; they run inline on the workflow's path.
#[async_trait]
pub trait SessionObserver: Send + Sync {
    async fn on_event(&self, session_id: &SessionId, event: &SessionEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_descriptions() {
        let event = SessionEvent::Milestone {
            progress: 10,
            message: "Uploading photos...".to_string(),
        };
        assert_eq!(event.description(), "Progress 10%: Uploading photos...");

        let event = SessionEvent::Milestone {
            progress: 0,
            message: String::new(),
        };
        assert_eq!(event.description(), "Progress 0%");

        let event = SessionEvent::Failed {
            error: "narrative too explicit".to_string(),
        };
        assert_eq!(event.description(), "Attempt failed: narrative too explicit");
    }
}
