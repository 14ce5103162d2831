//! Launch lifecycle events and the stream that carries them
//!
//! A [`LaunchEventStream`] is cold: it owns the whole launch pipeline as a
//! future and only drives it from `poll_next`. Nothing happens before the
//! first poll, and cancelling (or dropping) the stream drops the pipeline
//! together with every timer, probe and process wait it was holding.

use crate::error::LaunchFailure;
use futures::Stream;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::debug;

/// One step of a launch, as observed by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LaunchEvent {
    /// The game process is about to be spawned
    Launching,
    /// A managed version is being linked into the canonical install directory
    Downgrading,
    /// The game process exited
    Exited {
        /// Exit code, `None` if the process was killed by a signal
        code: Option<i32>,
    },
    /// The launch failed; no further events follow
    Failed(LaunchFailure),
}

impl LaunchEvent {
    /// Whether this event ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, LaunchEvent::Exited { .. } | LaunchEvent::Failed(_))
    }
}

/// Sending half handed to the pipeline
#[derive(Debug, Clone)]
pub(crate) struct EventSender {
    tx: async_channel::Sender<LaunchEvent>,
}

impl EventSender {
    /// Queue an event; returns false once the subscriber is gone
    pub(crate) fn emit(&self, event: LaunchEvent) -> bool {
        debug!("Emitting {:?}", event);
        self.tx.try_send(event).is_ok()
    }

    /// Stop accepting events
    pub(crate) fn close(&self) {
        self.tx.close();
    }
}

/// Cold, single-subscriber stream of [`LaunchEvent`]s
///
/// Yields events in pipeline order and ends after the terminal event.
/// [`LaunchEventStream::cancel`] or dropping the stream tears the pipeline
/// down; a game process that was already spawned keeps running.
pub struct LaunchEventStream {
    pipeline: Option<BoxFuture<'static, ()>>,
    // Boxed because the receiver holds a pinned listener and is not `Unpin`.
    events: Box<async_channel::Receiver<LaunchEvent>>,
    cancelled: bool,
}

impl LaunchEventStream {
    /// Wrap a pipeline built from the sending half of a fresh event channel
    pub(crate) fn new<F, Fut>(pipeline: F) -> Self
    where
        F: FnOnce(EventSender) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, events) = async_channel::unbounded();
        let pipeline = Box::pin(pipeline(EventSender { tx }));
        Self {
            pipeline: Some(pipeline),
            events: Box::new(events),
            cancelled: false,
        }
    }

    /// Stop the launch; pending and future events are discarded
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        // Dropping the future runs its teardown synchronously.
        self.pipeline = None;
        self.events.close();
        debug!("Launch event stream cancelled");
    }

    /// Whether [`cancel`](Self::cancel) was called
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl std::fmt::Debug for LaunchEventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchEventStream")
            .field("running", &self.pipeline.is_some())
            .field("queued", &self.events.len())
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

impl Stream for LaunchEventStream {
    type Item = LaunchEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.cancelled {
            return Poll::Ready(None);
        }

        if let Ok(event) = this.events.try_recv() {
            return Poll::Ready(Some(event));
        }

        if let Some(pipeline) = this.pipeline.as_mut() {
            if pipeline.as_mut().poll(cx).is_ready() {
                this.pipeline = None;
            }
        }

        match this.events.try_recv() {
            Ok(event) => Poll::Ready(Some(event)),
            Err(_) if this.pipeline.is_none() => Poll::Ready(None),
            // The pipeline is pending and has registered the waker.
            Err(_) => Poll::Pending,
        }
    }
}
