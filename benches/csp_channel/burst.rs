//! # Burst — Batched Send/Recv
//!
//! Fill a buffered channel completely via `try_send`, then drain it
//! completely via `try_recv`. Single task, no suspension on either side,
//! so this isolates the buffer/wait-queue bookkeeping cost from any
//! scheduling overhead.

use crate::{channel, test, Bencher, BUFFER_SIZE};

const BURST_SIZE: usize = 512;

#[bench]
fn fill_then_drain(b: &mut Bencher) {
    let (tx, rx) = channel::<i32>(BUFFER_SIZE);
    b.iter(|| {
        for i in 0..BURST_SIZE {
            tx.try_send(i as i32).unwrap();
        }
        for _ in 0..BURST_SIZE {
            test::black_box(rx.try_recv().unwrap());
        }
    });
}
