//! Fair multi-way race across heterogeneous operations (component E).
//!
//! This is the generalisation of the teacher's single-shape SPSC channel into
//! a coordinator that races several *different kinds* of pending operation —
//! channel reads/writes via [`crate::selectable::Selectable`], plain futures,
//! and abortable async closures — and returns exactly one winner, cancelling
//! the rest.
//!
//! Two entry points share one engine ([`race`]):
//!
//! - [`select_dyn`] — a runtime, data-driven list of named arms, all
//!   producing the same result type `R`. Used directly, or as the expansion
//!   target of the [`crate::select!`] macro.
//! - [`crate::select!`] — a `macro_rules!`-based static arm list with
//!   per-arm handler blocks, in the spirit of `tokio::select!`/`futures::select!`
//!   (this crate depends on neither; the expansion style is simply the
//!   idiomatic one for this shape of problem). Concrete grammar:
//!
//!   ```ignore
//!   select! {
//!       tag1: pat1 = select(some_selectable) => handler1,
//!       tag2: pat2 = future(some_future) => handler2,
//!       tag3: pat3 = abortable(|token| some_future_factory(token)) => handler3,
//!   }
//!   ```
//!
//!   Every arm's `future`/`abortable` body must resolve to `Result<T, E>`
//!   (`E: std::error::Error`); a channel `select(...)` arm is already
//!   `Result`-shaped internally via [`crate::selectable::Selectable::attempt`].
//!   `tag` (stringified) becomes the `arg_name` carried by [`crate::error::SelectError`]
//!   on failure — it is independent of `pat`, so `_ = select(c.as_selectable_write(1))`
//!   can still surface `"c"` as the failing arm's name by writing
//!   `c: _ = select(c.as_selectable_write(1)) => ()`.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::task::Poll;

use rand::seq::SliceRandom;

use crate::cancel::{Cancellable, CancellationToken};
use crate::error::{ChannelClosed, SelectBuildError, SelectDynError, SelectError};
use crate::selectable::Selectable;

/// A type-erased, already-polled-uniformly racer: every arm, whatever its
/// origin, is boxed into exactly this shape before entering the race, which
/// is what gives every arm the same poll-depth per outer `select!` poll
/// (§4.3 "poll-depth parity").
type AnyRacer<'a> = Pin<Box<dyn Future<Output = Result<Box<dyn Any>, Box<dyn std::error::Error>>> + 'a>>;

/// Object-safe view of a [`Selectable`] whose output has already been mapped
/// into the race's common result type `R`.
///
/// `Selectable::wait` returns `impl Future + '_` (RPITIT), which is not
/// object-safe on its own; this trait boxes that one return value instead so
/// a whole `Selectable` can live behind `Box<dyn SelectableDyn<R>>`.
trait SelectableDyn<R> {
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = ()> + '_>>;
    fn attempt(&mut self) -> Option<Result<R, ChannelClosed>>;
}

struct MappedSelectable<S, F> {
    inner: S,
    map: F,
}

impl<S, F, R> SelectableDyn<R> for MappedSelectable<S, F>
where
    S: Selectable,
    F: FnMut(S::Output) -> R,
{
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = ()> + '_>> {
        Box::pin(self.inner.wait())
    }

    fn attempt(&mut self) -> Option<Result<R, ChannelClosed>> {
        self.inner.attempt().map(|r| r.map(|v| (self.map)(v)))
    }
}

/// One arm of a [`select_dyn`] call, already producing the race's common
/// result type `R`. Built with [`SelectOp::selectable`], [`SelectOp::future`],
/// or [`SelectOp::abortable`] — never constructed directly.
pub enum SelectOp<'a, R> {
    Selectable(Box<dyn SelectableDyn<R> + 'a>),
    Future(Pin<Box<dyn Future<Output = Result<R, Box<dyn std::error::Error>>> + 'a>>),
    Abortable(
        Box<
            dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = Result<R, Box<dyn std::error::Error>>> + 'a>>
                + 'a,
        >,
    ),
}

impl<'a, R: 'a> SelectOp<'a, R> {
    /// Wraps a channel read/write (or any other [`Selectable`]), mapping its
    /// successful output into `R` via `map`.
    pub fn selectable<S, F>(inner: S, map: F) -> Self
    where
        S: Selectable + 'a,
        F: FnMut(S::Output) -> R + 'a,
    {
        SelectOp::Selectable(Box::new(MappedSelectable { inner, map }))
    }

    /// Wraps a plain future. Cannot be cancelled mid-race: if it loses, it is
    /// simply dropped (§4.3).
    pub fn future<Fut, E>(fut: Fut) -> Self
    where
        Fut: Future<Output = Result<R, E>> + 'a,
        E: std::error::Error + 'static,
    {
        SelectOp::Future(Box::pin(async move {
            fut.await.map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        }))
    }

    /// Wraps an abortable async closure: invoked once with the race's shared
    /// [`CancellationToken`] to produce its future.
    pub fn abortable<F, Fut, E>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + 'a,
        Fut: Future<Output = Result<R, E>> + 'a,
        E: std::error::Error + 'static,
    {
        SelectOp::Abortable(Box::new(move |token| {
            Box::pin(async move { f(token).await.map_err(|e| Box::new(e) as Box<dyn std::error::Error>) })
        }))
    }
}

fn racer_from_op<'a, R: 'static>(op: SelectOp<'a, R>, token: CancellationToken) -> AnyRacer<'a> {
    match op {
        SelectOp::Selectable(mut sel) => Box::pin(async move {
            loop {
                // The token never fires mid-race in this crate's own usage
                // (it is only cancelled once a winner is chosen, at which
                // point this racer is no longer polled), but every `wait()`
                // call is still raced against it per §4.4's cancellation
                // discipline rather than assuming that invariant.
                let waited = Cancellable::new(sel.wait(), token.clone()).await;
                if waited.is_err() {
                    continue;
                }
                if let Some(result) = sel.attempt() {
                    return result
                        .map(|v| Box::new(v) as Box<dyn Any>)
                        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>);
                }
                tracing::trace!("select: stolen readiness, re-arming arm");
            }
        }),
        SelectOp::Future(fut) => Box::pin(async move { fut.await.map(|v| Box::new(v) as Box<dyn Any>) }),
        SelectOp::Abortable(f) => {
            let fut = f(token);
            Box::pin(async move { fut.await.map(|v| Box::new(v) as Box<dyn Any>) })
        }
    }
}

/// The shared race engine: polls every arm in a fixed, once-shuffled order
/// each outer poll, returns as soon as one settles, fires `token`, and drops
/// every other arm (cancelling them).
async fn race<'a>(
    arms: Vec<(&'static str, AnyRacer<'a>)>,
    token: CancellationToken,
) -> Result<(&'static str, Box<dyn Any>), SelectError<Box<dyn std::error::Error>>> {
    let (names, mut racers): (Vec<&'static str>, Vec<AnyRacer<'a>>) = arms.into_iter().unzip();

    // Fisher-Yates shuffle (via `rand::seq::SliceRandom`, the same crate and
    // technique the rest of this corpus reaches for uniform permutations)
    // decides poll order once, up front; a stolen-readiness re-arm does not
    // re-shuffle (§4.3 "do NOT re-permute").
    let mut order: Vec<usize> = (0..racers.len()).collect();
    order.shuffle(&mut rand::thread_rng());

    let (idx, result) = std::future::poll_fn(|cx| {
        for &i in &order {
            if let Poll::Ready(out) = racers[i].as_mut().poll(cx) {
                return Poll::Ready((i, out));
            }
        }
        Poll::Pending
    })
    .await;

    token.cancel();
    tracing::debug!(arm = names[idx], "select winner chosen");
    drop(racers);

    match result {
        Ok(value) => Ok((names[idx], value)),
        Err(cause) => Err(SelectError::new(names[idx], cause)),
    }
}

/// Runtime, data-driven multi-way select: races every `(name, op)` pair and
/// returns the winning arm's name paired with its (already name-unaware,
/// uniformly typed) result.
///
/// Checked up front: an empty `ops` fails fast with
/// [`SelectBuildError::Empty`] before any arm is ever polled. The macro-based
/// [`crate::select!`] instead rejects a zero-arm arm list at compile time,
/// since its arity is static.
pub async fn select_dyn<R: 'static>(
    ops: Vec<(&'static str, SelectOp<'_, R>)>,
) -> Result<(&'static str, R), SelectDynError> {
    if ops.is_empty() {
        return Err(SelectBuildError::Empty.into());
    }

    let token = CancellationToken::new();
    let arms = ops
        .into_iter()
        .map(|(name, op)| (name, racer_from_op(op, token.clone())))
        .collect();

    let (name, value) = race(arms, token).await?;
    let value = *value
        .downcast::<R>()
        .expect("every racer built by racer_from_op<R> yields exactly R");
    Ok((name, value))
}

#[doc(hidden)]
#[macro_export]
macro_rules! __select_arm {
    (select ( $expr:expr ) => $pat:pat => $handler:expr) => {
        $crate::select::SelectOp::selectable($expr, |$pat| $handler)
    };
    (future ( $expr:expr ) => $pat:pat => $handler:expr) => {
        $crate::select::SelectOp::future(async move {
            match $expr.await {
                ::std::result::Result::Ok($pat) => ::std::result::Result::Ok($handler),
                ::std::result::Result::Err(e) => ::std::result::Result::Err(e),
            }
        })
    };
    (abortable ( $closure:expr ) => $pat:pat => $handler:expr) => {
        $crate::select::SelectOp::abortable(move |token| {
            let __fut = ($closure)(token);
            async move {
                match __fut.await {
                    ::std::result::Result::Ok($pat) => ::std::result::Result::Ok($handler),
                    ::std::result::Result::Err(e) => ::std::result::Result::Err(e),
                }
            }
        })
    };
}

/// Static, macro-built multi-way select. See the module docs for the
/// concrete grammar. Expands to a call to [`select_dyn`]; a zero-arm arm
/// list is a compile error rather than a runtime [`SelectBuildError`].
#[macro_export]
macro_rules! select {
    () => {
        compile_error!("select! requires at least one arm")
    };
    ($($tag:ident : $pat:pat = $kind:ident ( $($arg:tt)* ) => $handler:expr),+ $(,)?) => {{
        let mut __ops: ::std::vec::Vec<(&'static str, $crate::select::SelectOp<'_, _>)> =
            ::std::vec::Vec::new();
        $(
            __ops.push((
                ::std::stringify!($tag),
                $crate::__select_arm!($kind ( $($arg)* ) => $pat => $handler),
            ));
        )+
        $crate::select::select_dyn(__ops).await
    }};
}
