//! Client side of the Unix socket shared with the host.
//!
//! Two background tasks own the socket halves: one decodes incoming lines
//! into [`Message`]s, the other encodes queued [`Request`]s. The
//! [`Connection`] itself only talks to channels.

use std::{
    collections::VecDeque,
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::{
    net::{
        unix::{OwnedReadHalf, OwnedWriteHalf},
        UnixStream,
    },
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tokio_util::codec::{
    AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead, FramedWrite, LinesCodec,
};

use super::protocol::{Message, Method, Notification, Request, Response, Status};
use crate::error::{ConnectionError, Result};

/// Lines longer than this are discarded unread.
const MAX_LINE_LENGTH: usize = 1 << 20;

/// Cloneable handle for sending requests without waiting for the reply.
#[derive(Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Request>,
    next_id: Arc<AtomicU64>,
}

impl Outbox {
    /// Queue a request and return its id.
    pub fn send(&self, method: Method) -> Result<u64> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("-> #{id} {}", method.name());
        self.tx
            .send(Request { id, method })
            .map_err(|_| ConnectionError::Closed)?;
        Ok(id)
    }
}

/// Open channel to the host process.
pub struct Connection {
    inbound: mpsc::Receiver<Result<Message>>,
    outbox: Outbox,
    /// Notifications that arrived while a request was waiting for its reply.
    pending: VecDeque<Notification>,
    close_tx: oneshot::Sender<()>,
    writer: JoinHandle<()>,
}

impl Connection {
    /// Connect to the host socket at `path`.
    pub async fn connect(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path).await?;
        tracing::info!("Connected to host at {}", path.display());
        Ok(Self::from_stream(stream))
    }

    /// Wrap an already connected stream. Must be called inside a tokio runtime.
    pub fn from_stream(stream: UnixStream) -> Self {
        let (reader, writer) = stream.into_split();
        let (msg_tx, msg_rx) = mpsc::channel::<Result<Message>>(16);
        let (req_tx, req_rx) = mpsc::unbounded_channel::<Request>();
        let (close_tx, close_rx) = oneshot::channel();

        tokio::spawn(read_loop(reader, msg_tx));
        let writer = tokio::spawn(write_loop(writer, req_rx, close_rx));

        Self {
            inbound: msg_rx,
            outbox: Outbox {
                tx: req_tx,
                next_id: Arc::new(AtomicU64::new(1)),
            },
            pending: VecDeque::new(),
            close_tx,
            writer,
        }
    }

    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    /// Send a request and wait for the matching response.
    pub async fn call(&mut self, method: Method) -> Result<Value> {
        let request = method.name();
        let id = self.outbox.send(method)?;
        loop {
            match self.recv().await? {
                Message::Response(response) if response.id == id => {
                    return into_result(request, response);
                }
                Message::Response(response) => log_response(&response),
                Message::Notification(notification) => {
                    tracing::debug!("Queueing {} while waiting for #{id}", notification.class());
                    self.pending.push_back(notification);
                }
            }
        }
    }

    /// Wait for the next notification. Fails with [`ConnectionError::Closed`]
    /// once the host has gone away, or with the read error that ended the
    /// connection.
    pub async fn next_notification(&mut self) -> Result<Notification> {
        if let Some(notification) = self.pending.pop_front() {
            return Ok(notification);
        }
        loop {
            match self.recv().await? {
                Message::Notification(notification) => return Ok(notification),
                Message::Response(response) => log_response(&response),
            }
        }
    }

    /// Write every request queued so far, then stop the writer.
    /// Requests sent through an [`Outbox`] afterwards fail with
    /// [`ConnectionError::Closed`].
    pub async fn close(self) {
        let Self {
            close_tx, writer, ..
        } = self;
        let _ = close_tx.send(());
        if let Err(e) = writer.await {
            tracing::error!("Writer task failed: {e}");
        }
    }

    async fn recv(&mut self) -> Result<Message> {
        match self.inbound.recv().await {
            Some(msg) => msg,
            None => Err(ConnectionError::Closed.into()),
        }
    }
}

fn into_result(request: &'static str, response: Response) -> Result<Value> {
    match response.status {
        Status::Ok => Ok(response.result),
        Status::Error => Err(ConnectionError::Rejected {
            request,
            message: response.error.unwrap_or_default(),
        }
        .into()),
    }
}

/// Replies to fire-and-forget requests end up here.
fn log_response(response: &Response) {
    match (response.status, &response.error) {
        (Status::Ok, _) => tracing::debug!("<- #{} ok", response.id),
        (Status::Error, Some(error)) => tracing::warn!("Request #{} failed: {error}", response.id),
        (Status::Error, None) => tracing::warn!("Request #{} failed", response.id),
    }
}

async fn read_loop(reader: OwnedReadHalf, msg_tx: mpsc::Sender<Result<Message>>) {
    let codec =
        AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), MAX_LINE_LENGTH);
    let mut lines = FramedRead::new(reader, codec);
    // After a decode error the stream yields `None` once, then keeps reading.
    let mut resuming = false;
    loop {
        let line = match lines.next().await {
            Some(Ok(line)) => line,
            None if resuming => {
                resuming = false;
                continue;
            }
            None => break,
            Some(Err(AnyDelimiterCodecError::MaxChunkLengthExceeded)) => {
                tracing::warn!("Skipping line longer than {MAX_LINE_LENGTH} bytes");
                resuming = true;
                continue;
            }
            Some(Err(AnyDelimiterCodecError::Io(e))) => {
                tracing::error!("Read error: {e}");
                let _ = msg_tx.send(Err(e.into())).await;
                return;
            }
        };
        resuming = false;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let msg = match serde_json::from_slice::<Message>(&line) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!("Skipping malformed message: {e}");
                continue;
            }
        };
        if msg_tx.send(Ok(msg)).await.is_err() {
            return; // Connection dropped
        }
    }
    tracing::info!("Host closed the connection");
}

async fn write_loop(
    writer: OwnedWriteHalf,
    mut req_rx: mpsc::UnboundedReceiver<Request>,
    mut close_rx: oneshot::Receiver<()>,
) {
    let mut sink = FramedWrite::new(writer, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
    let mut closing = false;
    loop {
        let request = if closing {
            req_rx.recv().await
        } else {
            tokio::select! {
                request = req_rx.recv() => request,
                // Dropping the connection counts as closing it.
                _ = &mut close_rx => {
                    closing = true;
                    req_rx.close();
                    continue;
                }
            }
        };
        let Some(request) = request else { break };
        let json = match serde_json::to_string(&request) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to encode request #{}: {e}", request.id);
                continue;
            }
        };
        if let Err(e) = sink.send(json).await {
            tracing::error!("Write error: {e}");
            break;
        }
    }
}
