use super::InteractionRecorder;
use crate::domain::{InteractionEvent, RecordOutcome};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

enum Job {
    Record(InteractionEvent),
    Flush(oneshot::Sender<()>),
}

/// Enqueues post-commit interactions. Never blocks and never fails the caller.
#[derive(Clone)]
pub struct InteractionScheduler {
    tx: mpsc::Sender<Job>,
}

impl InteractionScheduler {
    pub fn schedule(&self, event: InteractionEvent) {
        match self.tx.try_send(Job::Record(event)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(event_id = %event.event_id, "Interaction queue full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(event_id = %event.event_id, "Interaction worker stopped, dropping event");
            }
        }
    }

    /// Resolves once every event scheduled before this call has been handled.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Job::Flush(done_tx)).await.is_err() {
            return;
        }
        let _ = done_rx.await;
    }
}

pub struct InteractionWorker {
    recorder: InteractionRecorder,
    rx: mpsc::Receiver<Job>,
    max_attempts: u32,
    base_delay: Duration,
}

impl InteractionWorker {
    /// Starts the worker on the current runtime. It stops once every
    /// scheduler clone has been dropped and the queue is drained.
    pub fn spawn(
        recorder: InteractionRecorder,
        capacity: usize,
        max_attempts: u32,
        base_delay: Duration,
    ) -> (InteractionScheduler, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = Self {
            recorder,
            rx,
            max_attempts: max_attempts.max(1),
            base_delay,
        };
        let handle = tokio::spawn(worker.run());
        (InteractionScheduler { tx }, handle)
    }

    async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            match job {
                Job::Record(event) => self.deliver(event).await,
                Job::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        tracing::debug!("Interaction worker stopped");
    }

    async fn deliver(&self, event: InteractionEvent) {
        let mut attempt = 1;
        loop {
            match self.recorder.record(event).await {
                Ok(RecordOutcome::Recorded | RecordOutcome::AlreadyRecorded) => return,
                Err(e) if attempt < self.max_attempts => {
                    let delay = self.base_delay.saturating_mul(1 << (attempt - 1).min(16));
                    tracing::warn!(
                        event_id = %event.event_id,
                        attempt,
                        error = %e,
                        "Recording interaction failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        event_id = %event.event_id,
                        action = %event.action,
                        performer_id = %event.performer_id,
                        author_id = %event.author_id,
                        error = %e,
                        "Giving up on interaction"
                    );
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InteractionAction, TargetKind};
    use crate::test_support::TestApp;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_flush_waits_for_scheduled_events() {
        let app = TestApp::new().await;
        let voter = app.user("voter").await;
        let author = app.user("author").await;

        for _ in 0..3 {
            app.ctx.interactions.schedule(InteractionEvent::new(
                InteractionAction::Upvote,
                TargetKind::Answer,
                Uuid::new_v4(),
                voter,
                author,
            ));
        }
        app.ctx.interactions.flush().await;

        assert_eq!(app.reputation(voter).await, 6);
        assert_eq!(app.reputation(author).await, 30);
    }

    #[tokio::test]
    async fn test_schedule_after_worker_stops_is_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let scheduler = InteractionScheduler { tx };

        scheduler.schedule(InteractionEvent::new(
            InteractionAction::Post,
            TargetKind::Question,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        ));
        scheduler.flush().await;
    }
}
