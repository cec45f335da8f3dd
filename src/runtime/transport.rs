//! Boundary with the coordinator-owned transport.
//!
//! The wire mechanism (process spawning, pipes, sockets) belongs to the
//! coordinator's worker pool; this crate only fixes the payload shapes and
//! the receive/reply contract. [`ChannelTransport`] is the in-process
//! rendition used by embedders that run workers on tasks, and by tests.

use crate::worker::types::{CoordinatorRequest, WorkerReply};
use anyhow::{anyhow, Result};
use core::future::Future;
use core::pin::Pin;
use tokio::sync::mpsc;

pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Worker-side view of the coordinator conversation.
pub trait WorkerTransport: Send + 'static {
    /// Receives the next coordinator request. `None` means the coordinator
    /// closed the channel and no further requests will arrive.
    fn recv(&mut self) -> TransportFuture<'_, Option<CoordinatorRequest>>;

    /// Sends one reply back to the coordinator.
    fn send(&mut self, reply: WorkerReply) -> TransportFuture<'_, ()>;
}

/// Creates a connected in-process transport pair.
pub fn transport_channel(capacity: usize) -> (ChannelTransport, CoordinatorEnd) {
    let (request_tx, request_rx) = mpsc::channel(capacity);
    let (reply_tx, reply_rx) = mpsc::channel(capacity);
    (
        ChannelTransport {
            requests: request_rx,
            replies: reply_tx,
        },
        CoordinatorEnd {
            requests: request_tx,
            replies: reply_rx,
        },
    )
}

/// Transport backed by tokio channels.
pub struct ChannelTransport {
    requests: mpsc::Receiver<CoordinatorRequest>,
    replies: mpsc::Sender<WorkerReply>,
}

impl WorkerTransport for ChannelTransport {
    fn recv(&mut self) -> TransportFuture<'_, Option<CoordinatorRequest>> {
        Box::pin(async move { Ok(self.requests.recv().await) })
    }

    fn send(&mut self, reply: WorkerReply) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.replies
                .send(reply)
                .await
                .map_err(|_| anyhow!("coordinator reply channel closed"))
        })
    }
}

/// Coordinator-side handle of a [`ChannelTransport`] pair.
pub struct CoordinatorEnd {
    requests: mpsc::Sender<CoordinatorRequest>,
    replies: mpsc::Receiver<WorkerReply>,
}

impl CoordinatorEnd {
    pub async fn send(&self, request: CoordinatorRequest) -> Result<()> {
        self.requests
            .send(request)
            .await
            .map_err(|_| anyhow!("worker request channel closed"))
    }

    pub async fn recv(&mut self) -> Option<WorkerReply> {
        self.replies.recv().await
    }
}
