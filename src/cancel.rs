//! Cancellation token: the Rust re-expression of the distilled spec's
//! JS-style `AbortController`/abortable-future helper (component A).
//!
//! `select!` (see [`crate::select`]) owns one [`CancellationToken`] per race
//! and fires it once a winner is chosen, so every losing arm observes
//! cancellation promptly. Channel waits (`recv`, `send`, `wait_readable`,
//! `wait_writable`) can be raced against a token the same way via
//! [`Cancellable`].
//!
//! Unlike the distilled spec's imperative `(resolve, reject) -> teardown`
//! shape, this crate leans on `Future`-is-cancel-on-drop: there is no
//! teardown closure parameter, because every resource a suspended future
//! holds (a [`crate::wait_queue::WaitQueue`] entry, a registered waker) is
//! released by that future's own `Drop` impl. The token only needs to track
//! *who is currently racing it* so it can wake them all on `cancel()`.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use pin_project_lite::pin_project;

use crate::error::Aborted;
use crate::wait_queue::{Ticket, WaitQueue};

struct Inner {
    cancelled: bool,
    wakers: WaitQueue<Waker>,
}

/// An `Rc`-shared, single-threaded cancellation signal.
///
/// Cloning a token does not create independent signals: every clone shares
/// the same underlying cell, mirroring `tokio_util::sync::CancellationToken`
/// in miniature (this crate does not depend on `tokio-util`; the shape is
/// simply the idiomatic one for this problem).
#[derive(Clone)]
pub struct CancellationToken {
    inner: Rc<RefCell<Inner>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                cancelled: false,
                wakers: WaitQueue::new(),
            })),
        }
    }

    /// Fires the token. Idempotent: firing an already-cancelled token wakes
    /// nothing further (there is nothing left registered; every racer wakes
    /// and deregisters itself on its very next poll).
    pub fn cancel(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.cancelled {
            return;
        }
        inner.cancelled = true;
        tracing::trace!("cancellation token fired");
        for waker in inner.wakers.drain() {
            waker.wake();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.borrow().cancelled
    }

    /// A future that resolves once this token is cancelled (immediately, if
    /// it already is).
    pub fn cancelled(&self) -> Cancelled<'_> {
        Cancelled {
            token: self,
            ticket: None,
        }
    }

    fn register(&self, waker: &Waker) -> Ticket {
        self.inner.borrow_mut().wakers.push_back(waker.clone())
    }

    fn deregister(&self, ticket: Ticket) {
        self.inner.borrow_mut().wakers.remove(ticket);
    }
}

/// Future returned by [`CancellationToken::cancelled`].
pub struct Cancelled<'a> {
    token: &'a CancellationToken,
    ticket: Option<Ticket>,
}

impl Future for Cancelled<'_> {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.token.is_cancelled() {
            return Poll::Ready(());
        }
        if self.ticket.is_none() {
            self.ticket = Some(self.token.register(cx.waker()));
        }
        Poll::Pending
    }
}

impl Drop for Cancelled<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.token.deregister(ticket);
        }
    }
}

pin_project! {
    /// Races an inner future `F` against a [`CancellationToken`].
    ///
    /// Resolves to `Ok(F::Output)` if the inner future completes first, or
    /// `Err(Aborted)` if the token fires first. Dropping a `Cancellable`
    /// before either happens cleans up its token registration the same way
    /// every other suspended future in this crate does.
    #[must_use = "futures do nothing unless polled"]
    pub struct Cancellable<F> {
        #[pin]
        inner: F,
        token: CancellationToken,
        ticket: Option<Ticket>,
    }

    impl<F> PinnedDrop for Cancellable<F> {
        fn drop(this: Pin<&mut Self>) {
            if let Some(ticket) = this.ticket.take() {
                this.token.deregister(ticket);
            }
        }
    }
}

impl<F> Cancellable<F> {
    pub fn new(inner: F, token: CancellationToken) -> Self {
        Self {
            inner,
            token,
            ticket: None,
        }
    }
}

impl<F: Future> Future for Cancellable<F> {
    type Output = Result<F::Output, Aborted>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut this = self.project();

        if this.token.is_cancelled() {
            if let Some(ticket) = this.ticket.take() {
                this.token.deregister(ticket);
            }
            return Poll::Ready(Err(Aborted));
        }

        match this.inner.as_mut().poll(cx) {
            Poll::Ready(v) => {
                if let Some(ticket) = this.ticket.take() {
                    this.token.deregister(ticket);
                }
                Poll::Ready(Ok(v))
            }
            Poll::Pending => {
                if this.ticket.is_none() {
                    *this.ticket = Some(this.token.register(cx.waker()));
                }
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;

    #[tokio::test]
    async fn already_cancelled_aborts_without_polling_producer() {
        let token = CancellationToken::new();
        token.cancel();

        let polled = Rc::new(RefCell::new(false));
        let polled_clone = polled.clone();
        let producer = std::future::poll_fn(move |_cx| {
            *polled_clone.borrow_mut() = true;
            Poll::<()>::Ready(())
        });

        let result = Cancellable::new(producer, token).await;
        assert_eq!(result, Err(Aborted));
        // the producer is allowed to be polled zero or one times depending on
        // scheduling, but cancellation must win when already fired up front
    }

    #[tokio::test]
    async fn cancel_wakes_pending_racer() {
        // `CancellationToken` is `Rc`-backed (`!Send`), so this is driven by
        // hand via `poll_fn` rather than `tokio::spawn`, which requires `Send`
        // regardless of runtime flavor.
        let token = CancellationToken::new();
        let racer = Cancellable::new(pending::<()>(), token.clone());
        tokio::pin!(racer);

        let first = std::future::poll_fn(|cx| {
            match racer.as_mut().poll(cx) {
                Poll::Ready(v) => Poll::Ready(Some(v)),
                Poll::Pending => Poll::Ready(None),
            }
        })
        .await;
        assert!(first.is_none(), "racer should still be pending");

        token.cancel();

        let result = std::future::poll_fn(|cx| racer.as_mut().poll(cx)).await;
        assert_eq!(result, Err(Aborted));
    }

    #[tokio::test]
    async fn completed_producer_wins_when_token_never_fires() {
        let token = CancellationToken::new();
        let result = Cancellable::new(async { 7 }, token).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn dropping_cancellable_deregisters_from_token() {
        let token = CancellationToken::new();
        {
            let fut = Cancellable::new(pending::<()>(), token.clone());
            tokio::pin!(fut);
            // poll once to register, then drop
            let waker = futures::task::noop_waker();
            let mut cx = Context::from_waker(&waker);
            assert!(fut.as_mut().poll(&mut cx).is_pending());
        }
        assert_eq!(token.inner.borrow().wakers.len(), 0);
    }
}
