use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::error::{ChannelClosed, TryRecvError};
use crate::selectable::Selectable;
use crate::wait_queue::Ticket;

use super::{ReadSlot, Shared};

/// The readable half of a channel. Created by [`crate::channel::channel`].
///
/// Cloning a `Receiver` increments an internal reference count; dropping the
/// last clone does not itself close the channel for reads (a buffered value
/// may still be waiting to be drained by the `Sender` side's own close), but
/// it does release this consumer's share of the handle the way the teacher's
/// `Receiver::drop` releases the single consumer slot.
pub struct Receiver<T> {
    pub(super) shared: Rc<RefCell<Shared<T>>>,
    /// Registration persisted across `Stream::poll_next` calls, so a
    /// suspended stream stays woken up for instead of losing its waker the
    /// instant a single poll returns `Pending`.
    stream_waiter: Option<(Rc<RefCell<ReadSlot<T>>>, Ticket)>,
}

impl<T> Receiver<T> {
    pub(super) fn new(shared: Rc<RefCell<Shared<T>>>) -> Self {
        Self {
            shared,
            stream_waiter: None,
        }
    }

    /// Non-blocking receive. `Err(TryRecvError::Empty)` when the channel
    /// would block, `Err(TryRecvError::Closed)` when closed-and-drained.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        self.shared.borrow_mut().try_recv()
    }

    /// Suspends until a value is available, or the channel is
    /// closed-and-drained (`None`).
    pub fn recv(&self) -> RecvFuture<'_, T> {
        RecvFuture {
            receiver: self,
            enqueued: None,
        }
    }

    /// Suspends until the channel has a value or is closed, without
    /// consuming it. A pure observation probe: the caller must still attempt
    /// `try_recv`/`recv` afterward. Used by `select!` via
    /// [`Receiver::as_selectable_read`].
    pub fn wait_readable(&self) -> WaitReadable<'_, T> {
        WaitReadable {
            receiver: self,
            ticket: None,
        }
    }

    /// Produces a [`Selectable`] that reads a value when it wins a race.
    pub fn as_selectable_read(&self) -> ReadSelectable<'_, T> {
        ReadSelectable { receiver: self }
    }

    pub fn readable_waiters_len(&self) -> usize {
        self.shared.borrow().readable_waiters.len()
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

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        self.shared.borrow_mut().receiver_count += 1;
        Self {
            shared: self.shared.clone(),
            stream_waiter: None,
        }
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        if let Some((_, ticket)) = self.stream_waiter.take() {
            self.shared.borrow_mut().pending_reads.remove(ticket);
        }
        self.shared.borrow_mut().receiver_count -= 1;
    }
}

/// Future returned by [`Receiver::recv`].
#[must_use = "futures do nothing unless polled"]
pub struct RecvFuture<'a, T> {
    receiver: &'a Receiver<T>,
    enqueued: Option<(Rc<RefCell<ReadSlot<T>>>, Ticket)>,
}

impl<T> Future for RecvFuture<'_, T> {
    type Output = Option<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.enqueued.is_none() {
            let mut shared = self.receiver.shared.borrow_mut();
            return match shared.try_recv() {
                Ok(v) => Poll::Ready(Some(v)),
                Err(TryRecvError::Closed) => Poll::Ready(None),
                Err(TryRecvError::Empty) => {
                    let slot = Rc::new(RefCell::new(ReadSlot::Waiting(Some(cx.waker().clone()))));
                    let ticket = shared.pending_reads.push_back(slot.clone());
                    drop(shared);
                    self.enqueued = Some((slot, ticket));
                    Poll::Pending
                }
            };
        }

        let (slot, _ticket) = self.enqueued.as_ref().expect("checked above");
        let mut guard = slot.borrow_mut();
        match &mut *guard {
            ReadSlot::Waiting(waker) => {
                *waker = Some(cx.waker().clone());
                Poll::Pending
            }
            ReadSlot::Delivered(_) => {
                drop(guard);
                let (slot, _) = self.enqueued.take().unwrap();
                let ReadSlot::Delivered(value) =
                    Rc::try_unwrap(slot).ok().expect("sole owner").into_inner()
                else {
                    unreachable!()
                };
                Poll::Ready(Some(value))
            }
            ReadSlot::Closed => Poll::Ready(None),
        }
    }
}

impl<T> Drop for RecvFuture<'_, T> {
    fn drop(&mut self) {
        if let Some((_, ticket)) = self.enqueued.take() {
            self.receiver.shared.borrow_mut().pending_reads.remove(ticket);
        }
    }
}

/// Future returned by [`Receiver::wait_readable`]. Pure observation:
/// resolves once the channel has a value or is closed without consuming it.
#[must_use = "futures do nothing unless polled"]
pub struct WaitReadable<'a, T> {
    receiver: &'a Receiver<T>,
    ticket: Option<Ticket>,
}

impl<T> Future for WaitReadable<'_, T> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        let mut shared = this.receiver.shared.borrow_mut();
        if let Some(ticket) = this.ticket.take() {
            shared.readable_waiters.remove(ticket);
        }
        if shared.is_readable() {
            return Poll::Ready(());
        }
        this.ticket = Some(shared.readable_waiters.push_back(cx.waker().clone()));
        Poll::Pending
    }
}

impl<T> Drop for WaitReadable<'_, T> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.receiver.shared.borrow_mut().readable_waiters.remove(ticket);
        }
    }
}

/// [`Selectable`] view of a channel read, produced by
/// [`Receiver::as_selectable_read`].
pub struct ReadSelectable<'a, T> {
    receiver: &'a Receiver<T>,
}

impl<T> Selectable for ReadSelectable<'_, T> {
    type Output = T;

    async fn wait(&mut self) {
        self.receiver.wait_readable().await;
    }

    fn attempt(&mut self) -> Option<Result<T, ChannelClosed>> {
        match self.receiver.try_recv() {
            Ok(v) => Some(Ok(v)),
            Err(TryRecvError::Empty) => None,
            // A select-observed read never surfaces "closed" as a failure:
            // the distilled spec models a closed-and-drained read as the
            // absent marker, which this statically typed crate encodes as
            // `Option<T>` rather than as a `ChannelClosed` error (§9).
            // `select!` arms built over `as_selectable_read` therefore treat
            // close as "stays pending forever" only if a caller truly needs
            // to observe it, it should race `wait_readable` plus a manual
            // `is_closed` check instead.
            Err(TryRecvError::Closed) => None,
        }
    }
}

/// Async iteration: yields each value until the channel is closed and
/// drained, then ends the stream (mirrors `futures_channel::mpsc::Receiver`'s
/// `Stream` impl; errors on the write side end the stream rather than
/// surfacing as an `Err` item, per §9 "Async iteration").
///
/// Unlike `Receiver::recv`, which hands back a fresh `RecvFuture` every call,
/// `poll_next` cannot simply build-and-drop a `RecvFuture` each time it is
/// polled: dropping it removes its `pending_reads` ticket immediately, so a
/// `Pending` result would leave nothing registered to wake this task once a
/// value arrives. Instead the registration lives in `Receiver::stream_waiter`
/// and survives across polls, exactly as `RecvFuture` does across its own
/// repeated polls.
impl<T> Stream for Receiver<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();

        if this.stream_waiter.is_none() {
            let mut shared = this.shared.borrow_mut();
            return match shared.try_recv() {
                Ok(v) => Poll::Ready(Some(v)),
                Err(TryRecvError::Closed) => Poll::Ready(None),
                Err(TryRecvError::Empty) => {
                    let slot = Rc::new(RefCell::new(ReadSlot::Waiting(Some(cx.waker().clone()))));
                    let ticket = shared.pending_reads.push_back(slot.clone());
                    drop(shared);
                    this.stream_waiter = Some((slot, ticket));
                    Poll::Pending
                }
            };
        }

        let (slot, _ticket) = this.stream_waiter.as_ref().expect("checked above");
        let mut guard = slot.borrow_mut();
        match &mut *guard {
            ReadSlot::Waiting(waker) => {
                *waker = Some(cx.waker().clone());
                Poll::Pending
            }
            ReadSlot::Delivered(_) => {
                drop(guard);
                let (slot, _) = this.stream_waiter.take().unwrap();
                let ReadSlot::Delivered(value) =
                    Rc::try_unwrap(slot).ok().expect("sole owner").into_inner()
                else {
                    unreachable!()
                };
                Poll::Ready(Some(value))
            }
            ReadSlot::Closed => Poll::Ready(None),
        }
    }
}
