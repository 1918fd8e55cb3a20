//! [`ChangeFeed`] implementation over the realtime socket.
//!
//! Each subscription owns one socket and one background task. The task
//! joins the job's channel, forwards classified frames as
//! [`FeedEvent`]s, sends heartbeats, and leaves the channel when the
//! subscription is closed or dropped. A heartbeat still unanswered when
//! the next one is due fails the subscription.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use signaldesk_core::ports::{
    ChangeFeed, FeedError, FeedEvent, JobSubscription, SessionProvider,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::auth::bearer_or_anon;
use crate::config::BackendConfig;
use crate::realtime::client::{connect, send_frame, RealtimeStream};
use crate::realtime::messages::{
    classify, heartbeat_frame, is_heartbeat_reply, job_topic, join_frame, leave_frame, parse_frame,
    ChannelMessage,
};

/// Interval between socket heartbeats.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

/// How long [`RealtimeSubscription::unsubscribe`] waits for a clean leave.
const LEAVE_TIMEOUT: Duration = Duration::from_secs(2);

/// Buffered events per subscription.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Realtime change feed for job rows.
pub struct RealtimeFeed {
    config: Arc<BackendConfig>,
    session: Arc<dyn SessionProvider>,
    heartbeat_interval: Duration,
}

impl RealtimeFeed {
    pub fn new(config: Arc<BackendConfig>, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            config,
            session,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }
}

#[async_trait]
impl ChangeFeed for RealtimeFeed {
    async fn subscribe(&self, job_id: &str) -> Result<Box<dyn JobSubscription>, FeedError> {
        let token = bearer_or_anon(self.session.as_ref(), &self.config)
            .await
            .map_err(|e| FeedError::Connection(e.to_string()))?;

        let mut ws_stream = connect(&self.config.realtime_url()).await?;

        let topic = job_topic(job_id);
        let join_ref = uuid::Uuid::new_v4().to_string();
        let join = join_frame(&topic, &self.config.jobs_table, job_id, &token, &join_ref);
        send_frame(&mut ws_stream, &join).await?;

        tracing::debug!(job_id, topic = %topic, "Joining realtime channel");

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let channel = Channel {
            topic,
            join_ref,
            heartbeat_interval: self.heartbeat_interval,
            event_tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(channel.run(ws_stream));

        Ok(Box::new(RealtimeSubscription {
            events: event_rx,
            cancel,
            task: Some(task),
        }))
    }
}

/// An open realtime subscription. Dropping it leaves the channel.
pub struct RealtimeSubscription {
    events: mpsc::Receiver<FeedEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

#[async_trait]
impl JobSubscription for RealtimeSubscription {
    async fn next_event(&mut self) -> Option<FeedEvent> {
        self.events.recv().await
    }

    async fn unsubscribe(mut self: Box<Self>) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if tokio::time::timeout(LEAVE_TIMEOUT, task).await.is_err() {
                tracing::debug!("Realtime channel did not leave in time");
            }
        }
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// Channel task
// ---------------------------------------------------------------------------

/// State of the background task driving one joined channel.
struct Channel {
    topic: String,
    join_ref: String,
    heartbeat_interval: Duration,
    event_tx: mpsc::Sender<FeedEvent>,
    cancel: CancellationToken,
}

impl Channel {
    async fn run(self, ws_stream: RealtimeStream) {
        let (mut sink, mut stream) = ws_stream.split();
        let mut heartbeat = tokio::time::interval_at(
            tokio::time::Instant::now() + self.heartbeat_interval,
            self.heartbeat_interval,
        );
        let mut next_ref: u64 = 1;
        // Ref of the last heartbeat not yet answered.
        let mut pending_heartbeat: Option<String> = None;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    next_ref += 1;
                    let leave = leave_frame(&self.topic, &next_ref.to_string(), &self.join_ref);
                    if let Err(e) = send_frame(&mut sink, &leave).await {
                        tracing::debug!(topic = %self.topic, error = %e, "Leave not delivered");
                    }
                    let _ = futures::SinkExt::close(&mut sink).await;
                    tracing::debug!(topic = %self.topic, "Left realtime channel");
                    return;
                }
                _ = heartbeat.tick() => {
                    if pending_heartbeat.is_some() {
                        self.fail("Heartbeat timed out".to_string()).await;
                        return;
                    }
                    next_ref += 1;
                    let reference = next_ref.to_string();
                    if let Err(e) = send_frame(&mut sink, &heartbeat_frame(&reference)).await {
                        self.fail(format!("Heartbeat failed: {e}")).await;
                        return;
                    }
                    pending_heartbeat = Some(reference);
                }
                msg = stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if !self.handle_text(&text, &mut pending_heartbeat).await {
                                return;
                            }
                        }
                        Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                            // Handled automatically by tungstenite.
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(topic = %self.topic, ?frame, "Realtime socket closed");
                            self.fail("Realtime socket closed".to_string()).await;
                            return;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            self.fail(format!("Realtime receive error: {e}")).await;
                            return;
                        }
                        None => {
                            self.fail("Realtime socket ended".to_string()).await;
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Handle one text frame. Returns `false` when the channel is done.
    async fn handle_text(&self, text: &str, pending_heartbeat: &mut Option<String>) -> bool {
        let frame = match parse_frame(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(
                    topic = %self.topic,
                    error = %e,
                    raw_message = %text,
                    "Failed to parse realtime frame",
                );
                return true;
            }
        };

        if pending_heartbeat
            .as_deref()
            .is_some_and(|reference| is_heartbeat_reply(&frame, reference))
        {
            *pending_heartbeat = None;
            return true;
        }

        match classify(&frame, &self.topic, &self.join_ref) {
            ChannelMessage::Joined => self.forward(FeedEvent::Subscribed).await,
            ChannelMessage::RowChanged(record) => self.forward(FeedEvent::Changed(record)).await,
            ChannelMessage::JoinRefused(reason) => {
                self.fail(format!("Join refused: {reason}")).await;
                false
            }
            ChannelMessage::ChannelError(reason) => {
                self.fail(reason).await;
                false
            }
            ChannelMessage::Closed => {
                self.fail("Channel closed by server".to_string()).await;
                false
            }
            ChannelMessage::Ignored => true,
        }
    }

    /// Forward an event. Returns `false` if the subscriber is gone.
    async fn forward(&self, event: FeedEvent) -> bool {
        self.event_tx.send(event).await.is_ok()
    }

    async fn fail(&self, reason: String) {
        tracing::warn!(topic = %self.topic, error = %reason, "Realtime channel failed");
        let _ = self.event_tx.send(FeedEvent::Error(reason)).await;
    }
}
