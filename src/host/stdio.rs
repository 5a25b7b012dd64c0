//! Native-messaging host transport over stdin/stdout.
//!
//! [`StdioHost`] implements [`HostBrowser`] against a browser shim on
//! the other end of a pair of byte streams. Outbound requests carry a
//! UUID; a read pump task dispatches inbound frames, matching replies
//! to a pending map of oneshot senders and fanning focus-change events
//! out on an unbounded channel. When the shim closes the stream, every
//! in-flight request fails with [`HostError::Closed`] and the event
//! channel closes, which winds the whole process down.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};
use uuid::Uuid;

use super::protocol::{self, HostRequest, Reply, ShimMessage};
use super::{FocusEvents, HostBrowser, HostError, Tab};

/// In-flight requests, keyed by correlation id.
type PendingMap = Arc<StdMutex<HashMap<Uuid, oneshot::Sender<Result<serde_json::Value, HostError>>>>>;

/// [`HostBrowser`] over the native-messaging stdio protocol.
pub struct StdioHost<W> {
    writer: Mutex<FramedWrite<W, LengthDelimitedCodec>>,
    pending: PendingMap,
}

impl<W> StdioHost<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Attach to the shim's byte streams and spawn the read pump.
    ///
    /// In production the streams are the process's stdin and stdout;
    /// tests substitute an in-memory duplex pipe.
    pub fn attach<R>(reader: R, writer: W) -> (Arc<Self>, FocusEvents)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let pending: PendingMap = Arc::new(StdMutex::new(HashMap::new()));

        let host = Arc::new(Self {
            writer: Mutex::new(FramedWrite::new(writer, protocol::frame_codec())),
            pending: Arc::clone(&pending),
        });

        let frames = FramedRead::new(reader, protocol::frame_codec());
        tokio::spawn(read_pump(frames, events_tx, pending));

        (host, FocusEvents { events: events_rx })
    }

    /// Send a request and wait for its correlated reply.
    async fn request(&self, request: HostRequest) -> Result<serde_json::Value, HostError> {
        let id = request.id();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending map poisoned")
            .insert(id, reply_tx);
        // Drops the pending entry if this future is cancelled (e.g. the
        // caller's lookup timeout fires) so the map cannot grow without
        // bound on a stuck shim.
        let _cleanup = PendingGuard {
            pending: &self.pending,
            id,
        };

        let payload =
            serde_json::to_vec(&request).map_err(|e| HostError::Protocol(e.to_string()))?;
        self.writer
            .lock()
            .await
            .send(Bytes::from(payload))
            .await
            .map_err(HostError::Io)?;

        match reply_rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(HostError::Closed),
        }
    }
}

#[async_trait::async_trait]
impl<W> HostBrowser for StdioHost<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn focused_window(&self) -> Result<i64, HostError> {
        let value = self
            .request(HostRequest::FocusedWindow { id: Uuid::new_v4() })
            .await?;
        serde_json::from_value(value).map_err(|e| HostError::Protocol(format!("focused_window: {e}")))
    }

    async fn window_tabs(&self, window_id: i64) -> Result<Vec<Tab>, HostError> {
        let value = self
            .request(HostRequest::WindowTabs {
                id: Uuid::new_v4(),
                window_id,
            })
            .await?;
        serde_json::from_value(value).map_err(|e| HostError::Protocol(format!("window_tabs: {e}")))
    }

    async fn group_title(&self, group_id: i64) -> Result<String, HostError> {
        let value = self
            .request(HostRequest::GroupTitle {
                id: Uuid::new_v4(),
                group_id,
            })
            .await?;
        serde_json::from_value(value).map_err(|e| HostError::Protocol(format!("group_title: {e}")))
    }

    async fn current_user(&self) -> Result<String, HostError> {
        let value = self
            .request(HostRequest::CurrentUser { id: Uuid::new_v4() })
            .await?;
        serde_json::from_value(value).map_err(|e| HostError::Protocol(format!("current_user: {e}")))
    }
}

/// Removes an abandoned request from the pending map.
struct PendingGuard<'a> {
    pending: &'a PendingMap,
    id: Uuid,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .expect("pending map poisoned")
            .remove(&self.id);
    }
}

/// Drain inbound frames until EOF or a framing error, then fail all
/// pending requests and close the event channel.
async fn read_pump<R>(
    mut frames: FramedRead<R, LengthDelimitedCodec>,
    events: mpsc::UnboundedSender<i64>,
    pending: PendingMap,
) where
    R: AsyncRead + Unpin,
{
    loop {
        match frames.next().await {
            Some(Ok(frame)) => {
                let message: ShimMessage = match serde_json::from_slice(&frame) {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::warn!(error = %e, "discarding undecodable frame from shim");
                        continue;
                    }
                };
                match message {
                    ShimMessage::FocusChanged { window_id } => {
                        if events.send(window_id).is_err() {
                            // Tracker is gone; nothing left to drive.
                            break;
                        }
                    }
                    ShimMessage::Reply(reply) => dispatch_reply(&pending, reply),
                }
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "framing error on shim stream");
                break;
            }
            None => {
                tracing::info!("shim closed the stream");
                break;
            }
        }
    }

    let mut pending = pending.lock().expect("pending map poisoned");
    for (_, reply_tx) in pending.drain() {
        let _ = reply_tx.send(Err(HostError::Closed));
    }
}

/// Hand a reply to whoever is waiting on its correlation id.
fn dispatch_reply(pending: &PendingMap, reply: Reply) {
    let waiter = pending
        .lock()
        .expect("pending map poisoned")
        .remove(&reply.id);
    let Some(reply_tx) = waiter else {
        // Caller timed out and abandoned the request, or the shim
        // answered twice. Either way there is nobody to tell.
        tracing::debug!(id = %reply.id, "reply for unknown or abandoned request");
        return;
    };

    let outcome = match (reply.result, reply.error) {
        (_, Some(error)) => Err(HostError::Rejected(error)),
        (Some(result), None) => Ok(result),
        (None, None) => Err(HostError::Protocol(
            "reply carries neither result nor error".into(),
        )),
    };
    let _ = reply_tx.send(outcome);
}
