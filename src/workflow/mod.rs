//! Workflow driver for one video generation attempt
//!
//! Wires the session state machine to the remote pipeline: user actions
//! validate and advance the session, entering the processing step runs the
//! [`PipelineOrchestrator`], and a successful orchestration hands control to
//! the [`StatusPoller`] until the remote side reports a terminal outcome.

pub mod orchestrator;
pub mod poller;

pub use orchestrator::PipelineOrchestrator;
pub use poller::{PollContext, StatusPoller};

use crate::api::{PhotoFile, PipelineGateway, StylePreference};
use crate::session::{Session, SessionEvent, SessionId, SessionObserver, Step};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::debug;

/// Observers registered with a workflow, shared with its background tasks
pub type ObserverList = Arc<RwLock<Vec<Arc<dyn SessionObserver>>>>;

/// Terminal result of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Completed { video_url: String },
    Failed { error: String },
}

/// Drives a single session from photo selection to a finished video.
///
/// One attempt at a time: a failed attempt must be reset before the workflow
/// accepts new input.
pub struct Workflow {
    session: Arc<RwLock<Session>>,
    gateway: Arc<dyn PipelineGateway>,
    observers: ObserverList,
    poller: StatusPoller,
    outcome_tx: watch::Sender<Option<WorkflowOutcome>>,
}

impl Workflow {
    /// Create a workflow over the given gateway, polling at `poll_interval`
    pub fn new(gateway: Arc<dyn PipelineGateway>, poll_interval: Duration) -> Self {
        let (outcome_tx, _) = watch::channel(None);
        Self {
            session: Arc::new(RwLock::new(Session::new())),
            gateway,
            observers: Arc::new(RwLock::new(Vec::new())),
            poller: StatusPoller::new(poll_interval),
            outcome_tx,
        }
    }

    /// Shared handle to the session state
    pub fn session(&self) -> Arc<RwLock<Session>> {
        self.session.clone()
    }

    /// Register an observer for session events
    pub async fn add_observer(&self, observer: Arc<dyn SessionObserver>) {
        self.observers.write().await.push(observer);
    }

    pub async fn current_step(&self) -> Step {
        self.session.read().await.step()
    }

    pub async fn can_proceed(&self) -> bool {
        self.session.read().await.can_proceed()
    }

    pub async fn set_title(&self, title: impl Into<String>) {
        self.session.write().await.set_title(title);
    }

    pub async fn add_photo(&self, photo: PhotoFile) -> bool {
        self.session.write().await.add_photo(photo)
    }

    pub async fn add_photos(&self, photos: impl IntoIterator<Item = PhotoFile> + Send) {
        self.session.write().await.add_photos(photos);
    }

    pub async fn set_narrative(&self, narrative: impl Into<String> + Send) {
        self.session.write().await.set_narrative(narrative);
    }

    pub async fn set_style(&self, style: StylePreference) {
        self.session.write().await.set_style(style);
    }

    /// Attempt the forward transition for the current step.
    ///
    /// A guard rejection leaves the step untouched; the calling surface is
    /// expected to have disabled the action in that case. Entering the
    /// processing step runs the pipeline and, on success, starts polling.
    /// Returns the step after the action.
    pub async fn next(&self) -> Step {
        let advanced = self.session.write().await.advance();
        let Some(step) = advanced else {
            return self.current_step().await;
        };

        self.notify(&SessionEvent::StepChanged { step }).await;
        if step == Step::Processing {
            self.start_processing().await;
        }
        step
    }

    /// Go back from the narrative step; photos and narrative are kept
    pub async fn back(&self) -> Step {
        let moved = self.session.write().await.back();
        if let Some(step) = moved {
            self.notify(&SessionEvent::StepChanged { step }).await;
            step
        } else {
            self.current_step().await
        }
    }

    /// Tear down polling and restore the session to its initial values
    pub async fn reset(&self) {
        self.poller.stop();
        self.session.write().await.reset();
        let _ = self.outcome_tx.send(None);
        self.notify(&SessionEvent::Reset).await;
    }

    /// Await the terminal outcome of the current attempt
    pub async fn wait_for_outcome(&self) -> WorkflowOutcome {
        let mut rx = self.outcome_tx.subscribe();
        loop {
            let current = rx.borrow().clone();
            if let Some(outcome) = current {
                return outcome;
            }
            // sender lives as long as self, so changed() cannot fail here
            let _ = rx.changed().await;
        }
    }

    /// Whether the status poller currently has a live task
    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    async fn start_processing(&self) {
        self.session.write().await.clear_error();
        let _ = self.outcome_tx.send(None);

        let orchestrator = PipelineOrchestrator::new(self.gateway.clone());
        match orchestrator.run(&self.session, &self.observers).await {
            Ok(()) => {
                self.poller.start(PollContext {
                    session: self.session.clone(),
                    gateway: self.gateway.clone(),
                    observers: self.observers.clone(),
                    outcome: self.outcome_tx.clone(),
                });
            }
            Err(e) => {
                debug!("Pipeline run failed: {e}");
                let error = {
                    let session = self.session.read().await;
                    session.error().unwrap_or("Generation failed").to_string()
                };
                let _ = self.outcome_tx.send(Some(WorkflowOutcome::Failed { error }));
            }
        }
    }

    async fn notify(&self, event: &SessionEvent) {
        let session_id = self.session.read().await.id().clone();
        notify_observers(&self.observers, &session_id, event).await;
    }
}

/// Fan an event out to every registered observer
pub(crate) async fn notify_observers(
    observers: &ObserverList,
    session_id: &SessionId,
    event: &SessionEvent,
) {
    let observers = observers.read().await;
    for observer in observers.iter() {
        observer.on_event(session_id, event).await;
    }
}
