//! # Create — Channel Allocation Cost
//!
//! How expensive is `channel::<T>(capacity)` itself, for the unbuffered
//! (rendezvous) and buffered cases. Unlike the teacher's const-generic ring
//! (`Channel<T, N>`, a fixed-size inline allocation), this channel's shared
//! state lives behind an `Rc<RefCell<_>>` regardless of capacity, so the two
//! cases mostly differ in the buffer's own `VecDeque` allocation.

use crate::{channel, Bencher, BUFFER_SIZE};

#[bench]
fn unbuffered(b: &mut Bencher) {
    b.iter(|| channel::<i32>(0));
}

#[bench]
fn buffered(b: &mut Bencher) {
    b.iter(|| channel::<i32>(BUFFER_SIZE));
}
