//! # Oneshot — Futures / Promises / Task Results
//!
//! A channel created, used exactly once, then dropped — the shape a
//! one-off "send me the result" handoff takes.

use crate::{channel, Bencher};

#[bench]
fn try_send_then_try_recv(b: &mut Bencher) {
    b.iter(|| {
        let (tx, rx) = channel::<i32>(1);
        tx.try_send(42).unwrap();
        rx.try_recv().unwrap()
    });
}
