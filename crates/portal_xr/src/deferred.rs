//! Single-shot deferred completions
//!
//! A [`Deferred`] is the consumer half of a value that a platform produces
//! later; the [`Resolver`] is the producer half. Both sit on a bounded
//! channel of capacity one. The consumer can `.await` it or poll it without
//! blocking from a frame callback. A resolver that is dropped without
//! settling closes the channel, which the deferred reports as
//! [`XrError::Aborted`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_channel::{Receiver, Sender, TryRecvError};
use futures_lite::stream::Stream;

use crate::{XrError, XrResult};

/// Consumer half of a pending platform completion
pub struct Deferred<T> {
    receiver: Pin<Box<Receiver<XrResult<T>>>>,
    taken: bool,
}

/// Producer half of a pending platform completion
pub struct Resolver<T> {
    sender: Sender<XrResult<T>>,
}

/// Create a connected deferred/resolver pair
pub fn deferred<T>() -> (Deferred<T>, Resolver<T>) {
    let (sender, receiver) = async_channel::bounded(1);
    (
        Deferred {
            receiver: Box::pin(receiver),
            taken: false,
        },
        Resolver { sender },
    )
}

impl<T> Deferred<T> {
    /// An already-resolved deferred
    pub fn ready(value: T) -> Self {
        Self::settled(Ok(value))
    }

    /// An already-rejected deferred
    pub fn failed(error: XrError) -> Self {
        Self::settled(Err(error))
    }

    fn settled(outcome: XrResult<T>) -> Self {
        let (deferred, resolver) = deferred();
        resolver.settle(outcome);
        deferred
    }

    /// True once the producer has resolved, rejected or been dropped
    pub fn is_settled(&self) -> bool {
        self.taken || !self.receiver.is_empty() || self.receiver.is_closed()
    }

    /// True once the outcome has been handed out
    pub fn is_taken(&self) -> bool {
        self.taken
    }

    /// Take the outcome if it is available. Returns `Some` exactly once.
    pub fn try_take(&mut self) -> Option<XrResult<T>> {
        if self.taken {
            return None;
        }
        let outcome = match self.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(XrError::Aborted),
        };
        self.taken = true;
        Some(outcome)
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.is_settled())
            .field("taken", &self.taken)
            .finish()
    }
}

impl<T> Future for Deferred<T> {
    type Output = XrResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        if this.taken {
            return Poll::Ready(Err(XrError::Aborted));
        }
        match this.receiver.as_mut().poll_next(cx) {
            Poll::Ready(outcome) => {
                this.taken = true;
                Poll::Ready(outcome.unwrap_or(Err(XrError::Aborted)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Resolver<T> {
    /// Resolve with a value
    pub fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    /// Reject with an error
    pub fn reject(self, error: XrError) {
        self.settle(Err(error));
    }

    /// True if the consumer half has been dropped
    pub fn is_orphaned(&self) -> bool {
        self.sender.is_closed()
    }

    fn settle(self, outcome: XrResult<T>) {
        if self.sender.try_send(outcome).is_err() {
            log::trace!("Deferred dropped before it settled");
        }
    }
}
