//! Channel: buffered/unbuffered FIFO with blocking backpressure (component C).
//!
//! This is the generalisation of the teacher's lock-free, compile-time-sized,
//! single-producer/single-consumer `spsc` ring buffer into a dynamically
//! sized, `close`-able, potentially-unbuffered, multi-producer/multi-consumer
//! channel driven by wait queues instead of atomics — see `DESIGN.md` for why
//! that substitution is the right one once the crate targets a
//! single-threaded cooperative runtime rather than real OS threads.
//!
//! State lives in a single `Rc<RefCell<Shared<T>>>`; `Sender`/`Receiver` are
//! thin, `Clone`-able handles onto it, in the spirit of the teacher's
//! `Channel::split()` but generalised from one sender/one receiver to many of
//! each.

mod receiver;
mod sender;

pub use receiver::{ReadSelectable, Receiver, RecvFuture, WaitReadable};
pub use sender::{Sender, SendFuture, WaitWritable, WriteSelectable};

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::task::Waker;

use crate::wait_queue::WaitQueue;

/// State of a writer suspended in `pending_writes`.
enum WriteSlot<T> {
    Waiting(T, Option<Waker>),
    Delivered,
    Closed,
}

/// State of a reader suspended in `pending_reads`.
enum ReadSlot<T> {
    Waiting(Option<Waker>),
    Delivered(T),
    Closed,
}

type SharedSlot<S> = Rc<RefCell<S>>;

pub(crate) struct Shared<T> {
    capacity: usize,
    buffer: VecDeque<T>,
    closed: bool,
    pending_writes: WaitQueue<SharedSlot<WriteSlot<T>>>,
    pending_reads: WaitQueue<SharedSlot<ReadSlot<T>>>,
    readable_waiters: WaitQueue<Waker>,
    writable_waiters: WaitQueue<Waker>,
    sender_count: usize,
    receiver_count: usize,
}

impl<T> Shared<T> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffer: VecDeque::with_capacity(capacity.min(64)),
            closed: false,
            pending_writes: WaitQueue::new(),
            pending_reads: WaitQueue::new(),
            readable_waiters: WaitQueue::new(),
            writable_waiters: WaitQueue::new(),
            sender_count: 1,
            receiver_count: 1,
        }
    }

    fn is_readable(&self) -> bool {
        self.closed || !self.buffer.is_empty() || !self.pending_writes.is_empty()
    }

    fn is_writable(&self) -> bool {
        self.closed || self.buffer.len() < self.capacity || !self.pending_reads.is_empty()
    }

    /// Pulls one pending writer into the buffer if there is room, preserving
    /// FIFO delivery order under buffered channels (§4.1 `read()` ordering).
    fn admit_pending_writer_into_buffer(&mut self) {
        while self.buffer.len() < self.capacity {
            let Some(slot) = self.pending_writes.pop_front() else {
                break;
            };
            let old = std::mem::replace(&mut *slot.borrow_mut(), WriteSlot::Delivered);
            match old {
                WriteSlot::Waiting(value, waker) => {
                    self.buffer.push_back(value);
                    if let Some(waker) = waker {
                        waker.wake();
                    }
                }
                // Already settled by another path (e.g. concurrent close); nothing to admit.
                _ => {}
            }
        }
    }

    fn wake_readable_waiters(&mut self) {
        for waker in self.readable_waiters.drain() {
            waker.wake();
        }
    }

    fn wake_writable_waiters(&mut self) {
        for waker in self.writable_waiters.drain() {
            waker.wake();
        }
    }

    /// Non-blocking receive. See [`crate::channel::Receiver::try_recv`].
    fn try_recv(&mut self) -> Result<T, crate::error::TryRecvError> {
        if self.capacity == 0 {
            // Unbuffered: hand off directly from a waiting writer, there is
            // no buffer slot to stash the value in.
            while let Some(slot) = self.pending_writes.pop_front() {
                let old = std::mem::replace(&mut *slot.borrow_mut(), WriteSlot::Delivered);
                if let WriteSlot::Waiting(value, waker) = old {
                    if let Some(waker) = waker {
                        waker.wake();
                    }
                    self.wake_writable_waiters();
                    return Ok(value);
                }
            }
        } else {
            self.admit_pending_writer_into_buffer();
        }

        if let Some(value) = self.buffer.pop_front() {
            self.admit_pending_writer_into_buffer();
            self.wake_writable_waiters();
            return Ok(value);
        }

        if self.closed {
            return Err(crate::error::TryRecvError::Closed);
        }
        Err(crate::error::TryRecvError::Empty)
    }

    /// Non-blocking send. See [`crate::channel::Sender::try_send`].
    fn try_send(&mut self, value: T) -> Result<(), crate::error::TrySendError<T>> {
        if self.closed {
            return Err(crate::error::TrySendError::Closed(value));
        }

        if let Some(slot) = self.pending_reads.pop_front() {
            let old = std::mem::replace(&mut *slot.borrow_mut(), ReadSlot::Delivered(value));
            if let ReadSlot::Waiting(waker) = old {
                if let Some(waker) = waker {
                    waker.wake();
                }
                return Ok(());
            }
            unreachable!("pending_reads entries are always in Waiting state before delivery");
        }

        if self.buffer.len() < self.capacity {
            self.buffer.push_back(value);
            self.wake_readable_waiters();
            return Ok(());
        }

        Err(crate::error::TrySendError::Full(value))
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        tracing::debug!(capacity = self.capacity, "channel closed");

        for slot in self.pending_writes.drain() {
            let old = std::mem::replace(&mut *slot.borrow_mut(), WriteSlot::Closed);
            if let WriteSlot::Waiting(_, Some(waker)) = old {
                waker.wake();
            }
        }
        for slot in self.pending_reads.drain() {
            let old = std::mem::replace(&mut *slot.borrow_mut(), ReadSlot::Closed);
            if let ReadSlot::Waiting(Some(waker)) = old {
                waker.wake();
            }
        }
        self.wake_readable_waiters();
        self.wake_writable_waiters();
    }
}

/// Creates a bounded (or, with `capacity == 0`, unbuffered/rendezvous)
/// channel, returning a `Sender`/`Receiver` handle pair.
///
/// Both halves are `Clone`: dropping the last `Sender` closes the channel for
/// writes; the `Receiver` side observes the same `close` regardless of how
/// many clones remain.
pub fn channel<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let shared = Rc::new(RefCell::new(Shared::new(capacity)));
    (Sender::new(shared.clone()), Receiver::new(shared))
}
