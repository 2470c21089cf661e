//! CSP-style channels and a fair multi-way `select!` for single-threaded,
//! cooperative async Rust.
//!
//! ## Layout
//!
//! - [`channel`] — buffered/unbuffered FIFO channel: `Sender`/`Receiver`,
//!   blocking and non-blocking operations, close semantics, and the
//!   readable/writable observation probes `select!` is built on.
//! - [`selectable`] — the two-phase `Selectable` trait (`wait` / `attempt`)
//!   that decouples "becoming ready" from "performing", so a multi-way race
//!   never has to put back a value it speculatively consumed.
//! - [`select`] — the race coordinator: `select_dyn` and the `select!` macro.
//! - [`cancel`] — `CancellationToken` / `Cancellable`, this crate's
//!   from-scratch stand-in for a host `AbortController`.
//! - [`wait_queue`] — the `VecDeque`-backed, ticket-addressable queue every
//!   suspended operation above enlists in while blocked.
//! - [`error`] — every user-visible error kind, `thiserror`-derived.
//!
//! ## Concurrency model
//!
//! Every public type here is `!Send`/`!Sync` by construction: state lives
//! behind `Rc<RefCell<_>>`, never `Arc`/atomics. This is deliberate — the
//! crate targets a single executing task between suspension points, the way
//! a JavaScript-style cooperative scheduler does, not OS-thread parallelism.
//! If that discipline is ever violated by a future change, `RefCell::borrow_mut`
//! panicking on reentrancy is the correctness backstop, not a first line of
//! defense.
//!
//! ## Example
//!
//! ```
//! use csp::channel::channel;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (tx, rx) = channel::<i32>(1);
//! tx.send(1).await.unwrap();
//! assert_eq!(rx.recv().await, Some(1));
//! # }
//! ```

pub mod cancel;
pub mod channel;
pub mod error;
pub mod select;
pub mod selectable;
pub mod wait_queue;
