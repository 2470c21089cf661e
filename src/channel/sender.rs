use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use crate::error::{ChannelClosed, TrySendError};
use crate::selectable::Selectable;
use crate::wait_queue::Ticket;

use super::{Shared, WriteSlot};

/// The writable half of a channel. Created by [`crate::channel::channel`].
///
/// Cloning a `Sender` increments an internal reference count; the channel is
/// closed for writes once every clone has been dropped (mirroring the
/// teacher's single-owner `Sender::drop` closing behaviour, generalised to
/// multiple producers).
pub struct Sender<T> {
    pub(super) shared: Rc<RefCell<Shared<T>>>,
}

impl<T> Sender<T> {
    pub(super) fn new(shared: Rc<RefCell<Shared<T>>>) -> Self {
        Self { shared }
    }

    /// Non-blocking send. Delivers through the same priority rules as
    /// [`Sender::send`] (direct hand-off to a waiting reader, then buffer
    /// space) but never suspends: returns `Err(TrySendError::Full)` instead.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        self.shared.borrow_mut().try_send(value)
    }

    /// Suspends until `value` can be delivered, or the channel closes.
    pub fn send(&self, value: T) -> SendFuture<'_, T> {
        SendFuture {
            sender: self,
            value: Some(value),
            enqueued: None,
        }
    }

    /// Suspends until the channel has room for a write (or is closed)
    /// without performing a write. A pure observation probe: the caller must
    /// still attempt `try_send`/`send` afterward. Used by `select!` via
    /// [`Sender::as_selectable_write`].
    pub fn wait_writable(&self) -> WaitWritable<'_, T> {
        WaitWritable {
            sender: self,
            ticket: None,
        }
    }

    /// Produces a [`Selectable`] that writes `value` when it wins a race.
    pub fn as_selectable_write(&self, value: T) -> WriteSelectable<'_, T> {
        WriteSelectable {
            sender: self,
            value: Some(value),
        }
    }

    pub fn writable_waiters_len(&self) -> usize {
        self.shared.borrow().writable_waiters.len()
    }

    /// Idempotent: closes the channel for both reads (after drain) and
    /// writes, regardless of which handle calls it.
    pub fn close(&self) {
        self.shared.borrow_mut().close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.borrow().closed
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        self.shared.borrow_mut().sender_count += 1;
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        let mut shared = self.shared.borrow_mut();
        shared.sender_count -= 1;
        if shared.sender_count == 0 {
            shared.close();
        }
    }
}

/// Future returned by [`Sender::send`].
#[must_use = "futures do nothing unless polled"]
pub struct SendFuture<'a, T> {
    sender: &'a Sender<T>,
    value: Option<T>,
    enqueued: Option<(Rc<RefCell<WriteSlot<T>>>, Ticket)>,
}

impl<T> Future for SendFuture<'_, T> {
    type Output = Result<(), ChannelClosed>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(value) = self.value.take() {
            let mut shared = self.sender.shared.borrow_mut();
            return match shared.try_send(value) {
                Ok(()) => Poll::Ready(Ok(())),
                Err(TrySendError::Closed(_)) => Poll::Ready(Err(ChannelClosed)),
                Err(TrySendError::Full(v)) => {
                    let slot = Rc::new(RefCell::new(WriteSlot::Waiting(
                        v,
                        Some(cx.waker().clone()),
                    )));
                    let ticket = shared.pending_writes.push_back(slot.clone());
                    drop(shared);
                    self.enqueued = Some((slot, ticket));
                    Poll::Pending
                }
            };
        }

        let (slot, _ticket) = self
            .enqueued
            .as_ref()
            .expect("SendFuture polled after completion");
        let mut guard = slot.borrow_mut();
        match &mut *guard {
            WriteSlot::Waiting(_, waker) => {
                *waker = Some(cx.waker().clone());
                Poll::Pending
            }
            WriteSlot::Delivered => Poll::Ready(Ok(())),
            WriteSlot::Closed => Poll::Ready(Err(ChannelClosed)),
        }
    }
}

impl<T> Drop for SendFuture<'_, T> {
    fn drop(&mut self) {
        if let Some((_, ticket)) = self.enqueued.take() {
            self.sender.shared.borrow_mut().pending_writes.remove(ticket);
        }
    }
}

/// [`Selectable`] view of a channel write, produced by
/// [`Sender::as_selectable_write`].
///
/// Unlike [`SendFuture`], this never commits `value` into the channel's
/// `pending_writes` queue while merely waiting: `wait` only watches the
/// generic writable condition (the same one [`Sender::wait_writable`]
/// exposes), and `attempt` performs one real `try_send`. That keeps the
/// two-phase contract honest — a losing `select!` arm never leaves a
/// committed write behind for some other task to stumble over.
pub struct WriteSelectable<'a, T> {
    sender: &'a Sender<T>,
    value: Option<T>,
}

impl<T> Selectable for WriteSelectable<'_, T> {
    type Output = ();

    async fn wait(&mut self) {
        self.sender.wait_writable().await;
    }

    fn attempt(&mut self) -> Option<Result<(), ChannelClosed>> {
        let value = self
            .value
            .take()
            .expect("attempt() called after a prior success");
        match self.sender.shared.borrow_mut().try_send(value) {
            Ok(()) => Some(Ok(())),
            Err(TrySendError::Closed(_)) => Some(Err(ChannelClosed)),
            Err(TrySendError::Full(v)) => {
                self.value = Some(v);
                None
            }
        }
    }
}

/// Future returned by [`Sender::wait_writable`]. Pure observation: resolves
/// once the channel has room for a write (or is closed) without performing
/// one.
#[must_use = "futures do nothing unless polled"]
pub struct WaitWritable<'a, T> {
    sender: &'a Sender<T>,
    ticket: Option<Ticket>,
}

impl<T> Future for WaitWritable<'_, T> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        let mut shared = this.sender.shared.borrow_mut();
        if let Some(ticket) = this.ticket.take() {
            shared.writable_waiters.remove(ticket);
        }
        if shared.is_writable() {
            return Poll::Ready(());
        }
        this.ticket = Some(shared.writable_waiters.push_back(cx.waker().clone()));
        Poll::Pending
    }
}

impl<T> Drop for WaitWritable<'_, T> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.sender.shared.borrow_mut().writable_waiters.remove(ticket);
        }
    }
}
