//! # Select — Coordinator Overhead
//!
//! Races a single always-ready channel read through [`select_dyn`], isolating
//! the shuffle-then-poll coordinator's own fixed cost (allocating the race's
//! `CancellationToken`, boxing one racer, one Fisher-Yates shuffle of a
//! single-element order) from the cost of the channel operation it wraps.

use crate::{channel, rt, Bencher};
use csp::select::{select_dyn, SelectOp};

#[bench]
fn single_ready_arm(b: &mut Bencher) {
    let rt = rt();
    let (tx, rx) = channel::<i32>(1);
    b.iter(|| {
        tx.try_send(1).unwrap();
        rt.block_on(async {
            select_dyn(vec![(
                "rx",
                SelectOp::selectable(rx.as_selectable_read(), |v| v),
            )])
            .await
            .unwrap()
        })
    });
}
