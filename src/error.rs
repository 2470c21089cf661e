//! User-visible error kinds.
//!
//! All surface errors are `thiserror`-derived, the way this corpus's own
//! leaf crates express errors (e.g. `compio-quic`) rather than hand-rolled
//! `Display`/`Error` impls like the teacher crate's `TrySendErr`/`TryRecvError`.

use thiserror::Error;

/// Returned by `send`/`try_send` once the channel is, or becomes, closed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("cannot write into a closed channel")]
pub struct ChannelClosed;

/// Returned by [`crate::channel::Sender::try_send`]. Carries the value back
/// so a non-blocking send never silently drops it.
#[derive(Debug, Error)]
pub enum TrySendError<T> {
    #[error("channel is full")]
    Full(T),
    #[error("cannot write into a closed channel")]
    Closed(T),
}

impl<T> TrySendError<T> {
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }

    /// Recovers the value that failed to send.
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(v) | Self::Closed(v) => v,
        }
    }
}

/// Returned by [`crate::channel::Receiver::try_recv`]. Split into two
/// variants (rather than a single `Option`) so callers can disambiguate
/// "empty" from "closed" without a second probe.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TryRecvError {
    #[error("channel is empty")]
    Empty,
    #[error("channel is closed and drained")]
    Closed,
}

/// Returned by any [`crate::cancel::Cancellable`]-wrapped operation whose
/// [`crate::cancel::CancellationToken`] fired before it resolved naturally.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Default)]
#[error("operation aborted")]
pub struct Aborted;

/// Wraps every error surfaced through `select!`/`select_dyn`, naming the arm
/// that failed. The inner `cause` retains the original error unmodified.
#[derive(Debug, Error)]
#[error("select arm {arg_name:?} failed")]
pub struct SelectError<E> {
    pub arg_name: &'static str,
    #[source]
    pub cause: E,
}

impl<E> SelectError<E> {
    pub fn new(arg_name: &'static str, cause: E) -> Self {
        Self { arg_name, cause }
    }
}

/// Returned by [`crate::select::select_dyn`] when its argument set is
/// malformed (currently: empty). The macro-based `select!` rejects an empty
/// arm list at compile time instead, since its arity is static.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SelectBuildError {
    #[error("select requires at least one operation")]
    Empty,
}

/// Top-level error returned by [`crate::select::select_dyn`] (and, through
/// it, the [`crate::select!`] macro): either the argument set itself was
/// malformed, or the race was lost to a failing arm.
#[derive(Debug, Error)]
pub enum SelectDynError {
    #[error(transparent)]
    Build(#[from] SelectBuildError),
    #[error(transparent)]
    Arm(#[from] SelectError<Box<dyn std::error::Error>>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_send_error_recovers_value() {
        let err = TrySendError::Full(42);
        assert!(err.is_full());
        assert_eq!(err.into_inner(), 42);

        let err = TrySendError::Closed("hi");
        assert!(err.is_closed());
        assert_eq!(err.into_inner(), "hi");
    }

    #[test]
    fn select_error_displays_arg_name() {
        let err = SelectError::new("reader", ChannelClosed);
        assert_eq!(err.arg_name, "reader");
        assert_eq!(err.cause, ChannelClosed);
        assert!(format!("{err}").contains("reader"));
    }
}
