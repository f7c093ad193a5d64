//! Sequential execution of the remote pipeline steps

use super::{notify_observers, ObserverList};
use crate::api::{PipelineGateway, PipelineStatus};
use crate::error::{Error, Result};
use crate::session::{Session, SessionEvent};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Runs the five remote operations that take a validated session from draft
/// to "generation started".
///
/// The operations are strictly ordered; each must complete before the next
/// begins, because remote project state is relationship-ordered. The first
/// failure aborts the chain with no retry and no rollback of the steps
/// already applied remotely.
pub struct PipelineOrchestrator {
    gateway: Arc<dyn PipelineGateway>,
}

impl PipelineOrchestrator {
    pub fn new(gateway: Arc<dyn PipelineGateway>) -> Self {
        Self { gateway }
    }

    /// Execute the pipeline, recording a fixed progress milestone before
    /// each remote call.
    ///
    /// Consumes the session's photos, narrative, and style read-only; writes
    /// only the project id and the status snapshot. On failure the session is
    /// marked failed and left at the processing step, and the error is
    /// returned to the caller.
    pub async fn run(
        &self,
        session: &Arc<RwLock<Session>>,
        observers: &ObserverList,
    ) -> Result<()> {
        let (session_id, title, photos, narrative, style) = {
            let s = session.read().await;
            (
                s.id().clone(),
                s.title().map(String::from),
                s.photos().to_vec(),
                s.narrative().to_string(),
                s.style(),
            )
        };

        self.milestone(session, observers, PipelineStatus::Draft, 0, "").await;
        let project = match self.gateway.create_project(title.as_deref()).await {
            Ok(project) => project,
            Err(e) => return self.abort(session, observers, e).await,
        };
        info!(session = %session_id, project = %project.id, "Created remote project");
        session.write().await.assign_project(project.id.clone());

        self.milestone(
            session,
            observers,
            PipelineStatus::Analyzing,
            10,
            "Uploading photos...",
        )
        .await;
        match self.gateway.upload_photos(&project.id, &photos).await {
            Ok(uploaded) => debug!(count = uploaded.photos.len(), "Photos uploaded"),
            Err(e) => return self.abort(session, observers, e).await,
        }

        self.milestone(
            session,
            observers,
            PipelineStatus::Analyzing,
            20,
            "Saving narrative...",
        )
        .await;
        if let Err(e) = self
            .gateway
            .set_narrative(&project.id, &narrative, style)
            .await
        {
            return self.abort(session, observers, e).await;
        }

        self.milestone(
            session,
            observers,
            PipelineStatus::Analyzing,
            30,
            "Analyzing photos...",
        )
        .await;
        match self.gateway.start_analysis(&project.id).await {
            Ok(analysis) => {
                debug!(theme = %analysis.overall_theme, "Photo analysis complete")
            }
            Err(e) => return self.abort(session, observers, e).await,
        }

        self.milestone(
            session,
            observers,
            PipelineStatus::Generating,
            50,
            "Generating video...",
        )
        .await;
        if let Err(e) = self.gateway.start_generation(&project.id).await {
            return self.abort(session, observers, e).await;
        }

        info!(session = %session_id, project = %project.id, "Generation started");
        Ok(())
    }

    async fn milestone(
        &self,
        session: &Arc<RwLock<Session>>,
        observers: &ObserverList,
        status: PipelineStatus,
        progress: u8,
        message: &str,
    ) {
        let session_id = {
            let mut s = session.write().await;
            s.record_milestone(status, progress, message);
            s.id().clone()
        };
        notify_observers(
            observers,
            &session_id,
            &SessionEvent::Milestone {
                progress,
                message: message.to_string(),
            },
        )
        .await;
    }

    /// Mark the session failed with the most specific message available and
    /// propagate the original error.
    async fn abort(
        &self,
        session: &Arc<RwLock<Session>>,
        observers: &ObserverList,
        error: Error,
    ) -> Result<()> {
        let mut message = error.user_message();
        if message.is_empty() {
            message = "Something went wrong".to_string();
        }
        warn!("Pipeline aborted: {message}");

        let session_id = {
            let mut s = session.write().await;
            s.mark_failed(&message);
            s.id().clone()
        };
        notify_observers(
            observers,
            &session_id,
            &SessionEvent::Failed { error: message },
        )
        .await;
        Err(error)
    }
}
