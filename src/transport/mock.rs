//! Scripted transport for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::Notify;

use super::Transport;
use crate::error::Result;

type Responder = Box<dyn FnMut(&[u8]) -> Vec<MockReply> + Send>;

/// What the mock agent does after a send.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Deliver these bytes to the next `recv`.
    Data(Bytes),
    /// Stay silent: the `recv` that takes this never completes.
    Silence,
}

struct MockState {
    sent: Vec<Bytes>,
    replies: VecDeque<MockReply>,
    responder: Option<Responder>,
}

/// In-memory transport with scripted replies.
///
/// Replies come from a queue, or from a responder closure called with each
/// sent message. A `recv` with nothing queued waits for the next reply; one
/// that takes a [`MockReply::Silence`] pends forever, so the session's
/// timeout fires.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    queued: Arc<Notify>,
    framed: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                sent: Vec::new(),
                replies: VecDeque::new(),
                responder: None,
            })),
            queued: Arc::new(Notify::new()),
            framed: false,
        }
    }

    /// Report messages as PMPP frames.
    pub fn framed(mut self) -> Self {
        self.framed = true;
        self
    }

    /// Answer each sent message with the replies the closure returns.
    pub fn with_responder<F>(self, responder: F) -> Self
    where
        F: FnMut(&[u8]) -> Vec<MockReply> + Send + 'static,
    {
        self.state.lock().unwrap().responder = Some(Box::new(responder));
        self
    }

    /// Queue a reply.
    pub fn queue(&self, reply: MockReply) {
        self.state.lock().unwrap().replies.push_back(reply);
        self.queued.notify_one();
    }

    /// Queue reply bytes.
    pub fn queue_data(&self, data: impl Into<Bytes>) {
        self.queue(MockReply::Data(data.into()));
    }

    /// Everything sent so far.
    pub fn sent(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn sent_count(&self) -> usize {
        self.state.lock().unwrap().sent.len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap();
            state.sent.push(Bytes::copy_from_slice(data));
            if let Some(responder) = state.responder.as_mut() {
                let replies = responder(data);
                state.replies.extend(replies);
            }
        }
        self.queued.notify_one();
        Ok(())
    }

    async fn recv(&self) -> Result<Bytes> {
        loop {
            let reply = self.state.lock().unwrap().replies.pop_front();
            match reply {
                Some(MockReply::Data(data)) => return Ok(data),
                Some(MockReply::Silence) => std::future::pending::<()>().await,
                None => self.queued.notified().await,
            }
        }
    }

    fn peer(&self) -> &str {
        "mock"
    }

    fn is_framed(&self) -> bool {
        self.framed
    }
}
