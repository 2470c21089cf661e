//! Statistical check that the race coordinator's tie-break shuffle does not
//! systematically favour one arm kind over another.

use std::collections::HashMap;
use std::convert::Infallible;

use csp::channel::channel;
use csp::select::{select_dyn, SelectOp};

const TRIALS: usize = 10_000;
const ARMS: &[&str] = &["future", "closure", "read", "write"];

#[tokio::test]
async fn mixed_arm_kinds_win_with_roughly_equal_probability() {
    let mut wins: HashMap<&'static str, usize> = HashMap::new();

    for _ in 0..TRIALS {
        let (read_tx, read_rx) = channel::<i32>(1);
        read_tx.try_send(1).unwrap();
        let (write_tx, _write_rx) = channel::<i32>(1);

        let ops = vec![
            (
                "future",
                SelectOp::future(async { Result::<i32, Infallible>::Ok(1) }),
            ),
            (
                "closure",
                SelectOp::abortable(|_token| async { Result::<i32, Infallible>::Ok(1) }),
            ),
            (
                "read",
                SelectOp::selectable(read_rx.as_selectable_read(), |v| v),
            ),
            (
                "write",
                SelectOp::selectable(write_tx.as_selectable_write(1), |_| 1),
            ),
        ];

        let (name, _) = select_dyn(ops).await.unwrap();
        *wins.entry(name).or_insert(0) += 1;
    }

    let expected = TRIALS as f64 / ARMS.len() as f64;
    let tolerance = TRIALS as f64 * 0.02;

    for &arm in ARMS {
        let count = wins.get(arm).copied().unwrap_or(0) as f64;
        assert!(
            (count - expected).abs() <= tolerance,
            "arm {arm:?} won {count} / {TRIALS} trials, expected {expected} +/- {tolerance}: {wins:?}"
        );
    }
}
