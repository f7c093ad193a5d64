//! Recurring generation status polling with an explicit start/stop contract

use super::{notify_observers, ObserverList, WorkflowOutcome};
use crate::api::{PipelineGateway, PipelineStatus};
use crate::session::{Session, SessionEvent, Step};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Everything the polling task needs, captured at start time
pub struct PollContext {
    pub session: Arc<RwLock<Session>>,
    pub gateway: Arc<dyn PipelineGateway>,
    pub observers: ObserverList,
    pub outcome: watch::Sender<Option<WorkflowOutcome>>,
}

/// Polls remote generation status on a fixed period while the session is in
/// an active phase, folding each reading into the session until a terminal
/// status is observed.
///
/// `start` replaces any previous task; `stop` is idempotent and must be
/// called on every reset and teardown path so no recurring task outlives its
/// session. Dropping the poller aborts the task as well.
pub struct StatusPoller {
    period: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl StatusPoller {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            handle: Mutex::new(None),
        }
    }

    /// Spawn the recurring poll task, stopping any previous one first
    pub fn start(&self, ctx: PollContext) {
        self.stop();
        let period = self.period;
        let handle = tokio::spawn(async move {
            poll_loop(period, ctx).await;
        });
        *self.handle.lock().unwrap() = Some(handle);
    }

    /// Abort the poll task if one is live. Safe to call repeatedly.
    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().unwrap().take() {
            handle.abort();
        }
    }

    /// Whether a poll task is currently live
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The recurring tick body. One task, one query at a time: a query slower
/// than the period delays the next tick instead of overlapping it.
async fn poll_loop(period: Duration, ctx: PollContext) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let (session_id, project_id) = {
            let session = ctx.session.read().await;
            if !session.is_polling_active() {
                debug!(session = %session.id(), "Polling guard no longer holds, stopping");
                return;
            }
            let project_id = match session.project_id() {
                Some(id) => id.to_string(),
                None => return,
            };
            (session.id().clone(), project_id)
        };

        // Transient transport faults are contained here: log and wait for
        // the next tick rather than surfacing an error.
        let status = match ctx.gateway.generation_status(&project_id).await {
            Ok(status) => status,
            Err(e) => {
                warn!(project = %project_id, "Status query failed, will retry: {e}");
                continue;
            }
        };

        ctx.session.write().await.apply_remote_status(&status);

        match status.status {
            PipelineStatus::Completed => {
                let video_url = status
                    .video_url
                    .as_deref()
                    .filter(|url| !url.is_empty())
                    .map(String::from);
                match video_url {
                    Some(url) => {
                        ctx.session.write().await.complete();
                        notify_observers(
                            &ctx.observers,
                            &session_id,
                            &SessionEvent::StepChanged {
                                step: Step::Complete,
                            },
                        )
                        .await;
                        notify_observers(
                            &ctx.observers,
                            &session_id,
                            &SessionEvent::Completed {
                                video_url: url.clone(),
                            },
                        )
                        .await;
                        let _ = ctx
                            .outcome
                            .send(Some(WorkflowOutcome::Completed { video_url: url }));
                    }
                    None => {
                        // Terminal on the remote side but nothing to show;
                        // surface the inconsistency instead of spinning.
                        let message = "Generation finished without a video".to_string();
                        ctx.session.write().await.mark_failed(&message);
                        notify_observers(
                            &ctx.observers,
                            &session_id,
                            &SessionEvent::Failed {
                                error: message.clone(),
                            },
                        )
                        .await;
                        let _ = ctx
                            .outcome
                            .send(Some(WorkflowOutcome::Failed { error: message }));
                    }
                }
                return;
            }
            PipelineStatus::Failed => {
                let error = {
                    let session = ctx.session.read().await;
                    session.error().unwrap_or("Generation failed").to_string()
                };
                notify_observers(
                    &ctx.observers,
                    &session_id,
                    &SessionEvent::Failed {
                        error: error.clone(),
                    },
                )
                .await;
                let _ = ctx.outcome.send(Some(WorkflowOutcome::Failed { error }));
                return;
            }
            _ => {
                notify_observers(
                    &ctx.observers,
                    &session_id,
                    &SessionEvent::StatusUpdated { status },
                )
                .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mocks::MockGateway;

    fn context(session: Session) -> (PollContext, Arc<MockGateway>) {
        let gateway = Arc::new(MockGateway::new());
        let (outcome, _) = watch::channel(None);
        (
            PollContext {
                session: Arc::new(RwLock::new(session)),
                gateway: gateway.clone(),
                observers: Arc::new(RwLock::new(Vec::new())),
                outcome,
            },
            gateway,
        )
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let poller = StatusPoller::new(Duration::from_millis(10));
        poller.stop();
        poller.stop();
        assert!(!poller.is_running());
    }

    #[tokio::test]
    async fn test_task_exits_when_guard_does_not_hold() {
        // a draft session with no project never activates the guard
        let (ctx, gateway) = context(Session::new());
        let poller = StatusPoller::new(Duration::from_millis(10));
        poller.start(ctx);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!poller.is_running());
        assert_eq!(gateway.call_count("generation_status"), 0);
    }

    #[tokio::test]
    async fn test_restart_replaces_previous_task() {
        let (ctx_a, _) = context(Session::new());
        let (ctx_b, _) = context(Session::new());
        let poller = StatusPoller::new(Duration::from_millis(500));
        poller.start(ctx_a);
        assert!(poller.is_running());
        poller.start(ctx_b);
        assert!(poller.is_running());
        poller.stop();
        assert!(!poller.is_running());
    }
}
