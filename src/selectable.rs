//! The two-phase operation interface `select!` races over (component D).
//!
//! A [`Selectable`] decouples *becoming ready* from *performing*. This
//! separation is the reason `select!` never has to "put back" a value it
//! speculatively consumed from a losing channel: it waits on readiness only,
//! then attempts exactly one operation. See [`crate::select`] for how the
//! race around it works, and [`crate::channel`] for the channel-backed
//! implementations (`ReadSelectable`, `WriteSelectable`).

use std::future::Future;

use crate::error::ChannelClosed;

/// A resource that can be raced inside `select!`.
///
/// `wait` must be cancel-safe: dropping the future it returns before it
/// resolves must leave the `Selectable` exactly as if `wait` had never been
/// called. `attempt` must be synchronous, and side-effect-free when it
/// returns `None`.
pub trait Selectable {
    /// The value produced by a successful [`Selectable::attempt`].
    type Output;

    /// Resolves once the operation *might* succeed. Does not itself perform
    /// the operation.
    fn wait(&mut self) -> impl Future<Output = ()> + '_;

    /// Performs the operation non-blockingly.
    ///
    /// - `None` means the readiness observed by `wait` was stolen by another
    ///   task in the interim; the caller should re-arm by calling `wait`
    ///   again.
    /// - `Some(Ok(v))` means the operation succeeded and its effect (value
    ///   consumed, value delivered) has already happened.
    /// - `Some(Err(_))` means the operation failed terminally (the channel
    ///   is closed).
    fn attempt(&mut self) -> Option<Result<Self::Output, ChannelClosed>>;
}
