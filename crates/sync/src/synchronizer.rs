//! The job status synchronizer.
//!
//! One [`JobSynchronizer`] belongs to one screen. Each call to
//! [`start`](JobSynchronizer::start) spawns a run for a job id:
//!
//! ```text
//! CHECKING --terminal--> TERMINAL
//!    |
//!    v
//! SUBSCRIBING --ack--> SUBSCRIBED --terminal update--> TERMINAL
//!    ^   |                 |
//!    |   error or no ack   channel error
//!    |   (<= max)          |
//!    +---+-----------------+
//!        |
//!        error (> max)
//!        v
//!     POLLING --terminal--> TERMINAL
//! ```
//!
//! A run is a single sequential task, so the subscription is always
//! closed before polling begins. Every state write carries the run's
//! generation; [`reset`](JobSynchronizer::reset) bumps the generation
//! under the channel lock, which makes late writes from a torn-down run
//! no-ops.

use std::sync::Arc;
use std::time::Duration;

use signaldesk_core::job::JobRecord;
use signaldesk_core::ports::{ChangeFeed, FeedEvent, JobStore, JobSubscription};
use signaldesk_core::types::JobId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::backoff::{retry_delay, should_retry, SyncConfig};
use crate::view::{JobView, SyncPhase};

/// How long [`JobSynchronizer::shutdown`] waits for a run to exit.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Keeps a [`JobView`] consistent with a remote job record.
pub struct JobSynchronizer {
    store: Arc<dyn JobStore>,
    feed: Arc<dyn ChangeFeed>,
    config: SyncConfig,
    view: Arc<watch::Sender<JobView>>,
    active: Option<ActiveRun>,
}

/// Handles owned for the lifetime of one run.
struct ActiveRun {
    job_id: JobId,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl JobSynchronizer {
    pub fn new(store: Arc<dyn JobStore>, feed: Arc<dyn ChangeFeed>, config: SyncConfig) -> Self {
        let (view, _) = watch::channel(JobView::default());
        Self {
            store,
            feed,
            config,
            view: Arc::new(view),
            active: None,
        }
    }

    /// Receive every published [`JobView`] change.
    pub fn watch(&self) -> watch::Receiver<JobView> {
        self.view.subscribe()
    }

    /// Current snapshot.
    pub fn view(&self) -> JobView {
        self.view.borrow().clone()
    }

    /// Job id of the current run, if any.
    pub fn job_id(&self) -> Option<&str> {
        self.active.as_ref().map(|run| run.job_id.as_str())
    }

    /// Whether a run is still doing network work.
    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|run| !run.handle.is_finished())
    }

    /// Start tracking `job_id`, tearing down any previous run first.
    pub fn start(&mut self, job_id: impl Into<JobId>) {
        let job_id = job_id.into();
        self.teardown();

        let mut generation = 0;
        self.view.send_modify(|view| {
            generation = view.generation + 1;
            *view = JobView::started(job_id.clone(), generation);
        });

        let cancel = CancellationToken::new();
        let run = Run {
            job_id: job_id.clone(),
            store: Arc::clone(&self.store),
            feed: Arc::clone(&self.feed),
            config: self.config.clone(),
            view: Arc::clone(&self.view),
            generation,
        };
        let run_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            tracing::info!(job_id = %run.job_id, "Job tracking started");
            tokio::select! {
                _ = run_cancel.cancelled() => {
                    tracing::info!(job_id = %run.job_id, "Job tracking cancelled");
                }
                _ = run.drive() => {
                    tracing::info!(job_id = %run.job_id, "Job tracking finished");
                }
            }
        });

        self.active = Some(ActiveRun {
            job_id,
            cancel,
            handle,
        });
    }

    /// Cancel the current run and return to `NO_JOB`.
    pub fn reset(&mut self) {
        self.teardown();
        self.view.send_modify(|view| {
            *view = JobView::cleared(view.generation + 1);
        });
    }

    /// Cancel the current run and wait for its task to exit.
    pub async fn shutdown(&mut self) {
        if let Some(run) = self.active.take() {
            tracing::info!(job_id = %run.job_id, "Stopping job tracking");
            run.cancel.cancel();
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, run.handle).await.is_err() {
                tracing::debug!(job_id = %run.job_id, "Job tracking did not stop in time");
            }
        }
        self.view.send_modify(|view| {
            *view = JobView::cleared(view.generation + 1);
        });
    }

    fn teardown(&mut self) {
        if let Some(run) = self.active.take() {
            tracing::debug!(job_id = %run.job_id, "Tearing down job tracking");
            run.cancel.cancel();
            run.handle.abort();
        }
    }
}

impl Drop for JobSynchronizer {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Wait until the view observed by `rx` reaches a terminal phase.
///
/// Returns `None` if the run is reset or replaced first, or if the
/// synchronizer is dropped.
pub async fn wait_for_terminal(rx: &mut watch::Receiver<JobView>) -> Option<JobView> {
    let generation = rx.borrow().generation;
    let view = rx
        .wait_for(|view| view.generation != generation || view.is_terminal())
        .await
        .ok()?
        .clone();
    (view.generation == generation && view.is_terminal()).then_some(view)
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// How a subscription attempt ended.
enum SubscriptionEnd {
    /// A terminal status was observed; tracking is done.
    Terminal,
    /// The feed failed and the attempt counts against the retry cap.
    Failed(String),
}

/// State of one tracking run, moved into its task.
struct Run {
    job_id: JobId,
    store: Arc<dyn JobStore>,
    feed: Arc<dyn ChangeFeed>,
    config: SyncConfig,
    view: Arc<watch::Sender<JobView>>,
    generation: u64,
}

impl Run {
    async fn drive(&self) {
        if self.check().await {
            return;
        }
        if self.follow_feed().await {
            return;
        }
        self.poll().await;
    }

    /// CHECKING: one immediate fetch. Returns `true` if already terminal.
    async fn check(&self) -> bool {
        self.set_phase(SyncPhase::Checking);
        self.fetch_and_apply().await
    }

    /// SUBSCRIBING / SUBSCRIBED. Returns `true` once terminal, `false`
    /// when retries are exhausted and polling should take over.
    async fn follow_feed(&self) -> bool {
        let mut retries = 0u32;
        let mut acknowledged_before = false;

        loop {
            self.set_phase(SyncPhase::Subscribing);

            match self
                .subscribe_once(&mut retries, &mut acknowledged_before)
                .await
            {
                SubscriptionEnd::Terminal => return true,
                SubscriptionEnd::Failed(reason) => {
                    retries += 1;
                    self.publish(|view| view.subscribe_retries = retries);

                    if !should_retry(retries, &self.config) {
                        tracing::warn!(
                            job_id = %self.job_id,
                            retries,
                            error = %reason,
                            "Subscription retries exhausted, falling back to polling",
                        );
                        return false;
                    }

                    let delay = retry_delay(retries, &self.config);
                    tracing::warn!(
                        job_id = %self.job_id,
                        attempt = retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %reason,
                        "Subscription failed, retrying",
                    );
                    self.publish(|view| {
                        view.notice = Some(format!(
                            "Live updates unavailable, retrying in {}s",
                            delay.as_secs()
                        ));
                    });
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn subscribe_once(
        &self,
        retries: &mut u32,
        acknowledged_before: &mut bool,
    ) -> SubscriptionEnd {
        let mut subscription = match self.feed.subscribe(&self.job_id).await {
            Ok(sub) => sub,
            Err(e) => return SubscriptionEnd::Failed(e.to_string()),
        };

        let mut acknowledged = false;
        loop {
            let event = if acknowledged {
                subscription.next_event().await
            } else {
                let waited =
                    tokio::time::timeout(self.config.subscribe_timeout, subscription.next_event())
                        .await;
                match waited {
                    Ok(event) => event,
                    Err(_) => {
                        subscription.unsubscribe().await;
                        return SubscriptionEnd::Failed("join timed out".to_string());
                    }
                }
            };

            match event {
                Some(FeedEvent::Subscribed) => {
                    acknowledged = true;
                    tracing::info!(job_id = %self.job_id, "Subscribed to job changes");
                    *retries = 0;
                    self.publish(|view| {
                        view.phase = SyncPhase::Subscribed;
                        view.subscribe_retries = 0;
                        view.notice = None;
                    });

                    // Catch up on anything missed while the channel was down.
                    if *acknowledged_before && self.fetch_and_apply().await {
                        subscription.unsubscribe().await;
                        return SubscriptionEnd::Terminal;
                    }
                    *acknowledged_before = true;
                }
                Some(FeedEvent::Changed(record)) => {
                    tracing::debug!(
                        job_id = %self.job_id,
                        status = %record.overall_status,
                        "Job change received",
                    );
                    if self.apply(&record) {
                        subscription.unsubscribe().await;
                        return SubscriptionEnd::Terminal;
                    }
                }
                Some(FeedEvent::Error(reason)) => {
                    subscription.unsubscribe().await;
                    return SubscriptionEnd::Failed(reason);
                }
                None => {
                    return SubscriptionEnd::Failed("Subscription closed".to_string());
                }
            }
        }
    }

    /// POLLING: fetch on a fixed interval until terminal.
    async fn poll(&self) {
        self.set_phase(SyncPhase::Polling);
        self.publish(|view| view.notice = None);

        let period = self.config.poll_interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            job_id = %self.job_id,
            interval_secs = period.as_secs(),
            "Polling job status",
        );

        loop {
            interval.tick().await;
            if self.fetch_and_apply().await {
                return;
            }
        }
    }

    /// Fetch the record and apply it. Fetch errors become a notice and do
    /// not end tracking. Returns `true` if the record is terminal.
    async fn fetch_and_apply(&self) -> bool {
        match self.store.fetch_job(&self.job_id).await {
            Ok(record) => self.apply(&record),
            Err(e) => {
                tracing::warn!(job_id = %self.job_id, error = %e, "Job status fetch failed");
                self.publish(|view| {
                    view.notice = Some(format!("Could not refresh job status: {e}"));
                });
                false
            }
        }
    }

    fn apply(&self, record: &JobRecord) -> bool {
        self.publish(|view| view.apply_record(record));
        if record.is_terminal() {
            tracing::info!(
                job_id = %self.job_id,
                status = %record.overall_status,
                "Job reached terminal status",
            );
        }
        record.is_terminal()
    }

    fn set_phase(&self, phase: SyncPhase) {
        self.publish(|view| view.phase = phase);
    }

    /// Mutate the view if this run still owns it.
    fn publish(&self, update: impl FnOnce(&mut JobView)) -> bool {
        self.view.send_if_modified(|view| {
            if view.generation != self.generation {
                return false;
            }
            update(view);
            true
        })
    }
}
