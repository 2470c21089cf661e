//! # Latency — Unbuffered Rendezvous Round-Trip
//!
//! A capacity-0 channel has no buffer at all: `send` only completes once a
//! concurrently polled `recv` hands the value off directly (or vice versa).
//! This measures the cost of driving that hand-off to completion within a
//! single cooperative task, via `futures::join!` rather than two OS threads.

use crate::{channel, rt, Bencher};

#[bench]
fn rendezvous_round_trip(b: &mut Bencher) {
    let rt = rt();
    let (tx, rx) = channel::<i32>(0);
    b.iter(|| {
        rt.block_on(async {
            let (sent, received) = futures::join!(tx.send(1), rx.recv());
            sent.unwrap();
            test::black_box(received)
        })
    });
}
