//! Bridges synchronous and asynchronous runner returns, preserving synchrony
//! when the input is already available.
//!
//! Grounded on `futures_util::future::BoxFuture`, the crate the pack's
//! async-feature stacks reach for; there is no executor dependency here,
//! only the boxed-future type.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

/// A value that is either already available or will become available once
/// polled to completion by the caller's executor.
pub enum MaybeDeferred<T> {
    Immediate(T),
    Deferred(BoxFuture<'static, T>),
}

impl<T> MaybeDeferred<T> {
    pub fn immediate(value: T) -> Self {
        MaybeDeferred::Immediate(value)
    }

    pub fn deferred(future: impl std::future::Future<Output = T> + Send + 'static) -> Self {
        MaybeDeferred::Deferred(future.boxed())
    }

    pub fn is_immediate(&self) -> bool {
        matches!(self, MaybeDeferred::Immediate(_))
    }
}

/// Resolves `input`, invoking `on_ok`/`on_err` with a `was_deferred` flag so
/// the caller can choose between throwing (sync path) and propagating via
/// rejection (async path).
///
/// On `Immediate`, the handler runs synchronously and its result is
/// returned directly — no executor round-trip. On `Deferred`, nothing runs
/// until the returned future is polled to completion.
pub enum Resolved<R> {
    Now(R),
    Later(BoxFuture<'static, R>),
}

pub fn resolve_maybe_deferred<T, E, R, OnOk, OnErr>(
    input: MaybeDeferred<Result<T, E>>,
    on_ok: OnOk,
    on_err: OnErr,
) -> Resolved<R>
where
    T: Send + 'static,
    E: Send + 'static,
    R: Send + 'static,
    OnOk: Fn(T, bool) -> R + Send + 'static,
    OnErr: Fn(E, bool) -> R + Send + 'static,
{
    match input {
        MaybeDeferred::Immediate(Ok(v)) => Resolved::Now(on_ok(v, false)),
        MaybeDeferred::Immediate(Err(e)) => Resolved::Now(on_err(e, false)),
        MaybeDeferred::Deferred(fut) => Resolved::Later(
            async move {
                match fut.await {
                    Ok(v) => on_ok(v, true),
                    Err(e) => on_err(e, true),
                }
            }
            .boxed(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_runs_synchronously_without_an_executor() {
        let input: MaybeDeferred<Result<u32, &str>> = MaybeDeferred::immediate(Ok(5));
        let resolved = resolve_maybe_deferred(
            input,
            |v, was_deferred| {
                assert!(!was_deferred);
                v * 2
            },
            |_: &str, _| 0,
        );
        match resolved {
            Resolved::Now(v) => assert_eq!(v, 10),
            Resolved::Later(_) => panic!("expected the immediate branch"),
        }
    }

    #[test]
    fn deferred_marks_was_deferred_true() {
        let input: MaybeDeferred<Result<u32, &str>> =
            MaybeDeferred::deferred(async { Ok(3) });
        let resolved = resolve_maybe_deferred(
            input,
            |v, was_deferred| {
                assert!(was_deferred);
                v + 1
            },
            |_: &str, _| 0,
        );
        match resolved {
            Resolved::Now(_) => panic!("expected the deferred branch"),
            Resolved::Later(fut) => {
                let v = futures_executor::block_on(fut);
                assert_eq!(v, 4);
            }
        }
    }
}
