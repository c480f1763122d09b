//! A one-shot, four-state latch that coalesces concurrent observers of a
//! single logical result.
//!
//! A mutex-guarded state slot plus a list of parked wakers, rather than a
//! condvar: observers `.await` instead of blocking an OS thread, so waking
//! them means registering and later firing each `Waker` in turn.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

use crate::error::Error;

/// The four observable states of a [`SharedPromise`].
#[derive(Debug, Clone)]
pub enum SharedPromiseState<T> {
    Init,
    Loading,
    Resolved(T),
    Rejected(Arc<Error>),
}

impl<T> SharedPromiseState<T> {
    pub fn is_init(&self) -> bool {
        matches!(self, SharedPromiseState::Init)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SharedPromiseState::Loading)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, SharedPromiseState::Resolved(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, SharedPromiseState::Rejected(_))
    }

    pub fn is_settled(&self) -> bool {
        self.is_resolved() || self.is_rejected()
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            SharedPromiseState::Resolved(v) => Some(v),
            _ => None,
        }
    }
}

struct Inner<T> {
    state: SharedPromiseState<T>,
    wakers: Vec<Waker>,
}

/// A coalescing shared-future primitive with an explicit state machine and a
/// single constructor-supplied change callback, invoked on every transition.
pub struct SharedPromise<T: Clone> {
    inner: Mutex<Inner<T>>,
    on_change: Box<dyn Fn(&SharedPromiseState<T>) + Send + Sync>,
}

impl<T: Clone> SharedPromise<T> {
    pub fn new(on_change: impl Fn(&SharedPromiseState<T>) + Send + Sync + 'static) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: SharedPromiseState::Init,
                wakers: Vec::new(),
            }),
            on_change: Box::new(on_change),
        }
    }

    /// Builds a promise that is already resolved, skipping `init`/`loading`
    /// entirely. Used for pre-seeded (`initial_data`/`known_columns`)
    /// facets. Constructs the `Resolved` state directly rather than calling
    /// [`SharedPromise::resolve`]: that method is a no-op outside `loading`,
    /// and a freshly constructed promise starts in `init`, not `loading`.
    pub fn resolved(
        value: T,
        on_change: impl Fn(&SharedPromiseState<T>) + Send + Sync + 'static,
    ) -> Self {
        let promise = Self {
            inner: Mutex::new(Inner {
                state: SharedPromiseState::Resolved(value),
                wakers: Vec::new(),
            }),
            on_change: Box::new(on_change),
        };
        promise.notify();
        promise
    }

    /// Transitions `init -> loading`. A no-op on any other state.
    pub fn start(&self) {
        let fired = {
            let mut inner = self.inner.lock();
            if inner.state.is_init() {
                inner.state = SharedPromiseState::Loading;
                true
            } else {
                false
            }
        };
        if fired {
            self.notify();
        }
    }

    /// Transitions `loading -> resolved`. A no-op on any other state.
    pub fn resolve(&self, value: T) {
        let fired = {
            let mut inner = self.inner.lock();
            if inner.state.is_loading() {
                inner.state = SharedPromiseState::Resolved(value);
                true
            } else {
                false
            }
        };
        if fired {
            self.wake_all();
            self.notify();
        }
    }

    /// Transitions `loading -> rejected`. A no-op on any other state.
    pub fn reject(&self, error: Arc<Error>) {
        let fired = {
            let mut inner = self.inner.lock();
            if inner.state.is_loading() {
                inner.state = SharedPromiseState::Rejected(error);
                true
            } else {
                false
            }
        };
        if fired {
            self.wake_all();
            self.notify();
        }
    }

    pub fn state(&self) -> SharedPromiseState<T> {
        self.inner.lock().state.clone()
    }

    pub fn value(&self) -> Option<T> {
        self.inner.lock().state.value().cloned()
    }

    pub fn is_init(&self) -> bool {
        self.inner.lock().state.is_init()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().state.is_loading()
    }

    pub fn is_settled(&self) -> bool {
        self.inner.lock().state.is_settled()
    }

    /// Returns a future that resolves once this promise settles, regardless
    /// of the state it is in when awaited. Takes `Arc<Self>` by value (the
    /// whitelisted-on-stable receiver form) rather than `&Arc<Self>`;
    /// callers hold the promise behind an `Arc` already and clone it to call
    /// this.
    pub fn wait(self: Arc<Self>) -> SharedPromiseFuture<T> {
        SharedPromiseFuture { promise: self }
    }

    fn wake_all(&self) {
        let wakers = std::mem::take(&mut self.inner.lock().wakers);
        for waker in wakers {
            waker.wake();
        }
    }

    fn notify(&self) {
        let state = self.inner.lock().state.clone();
        (self.on_change)(&state);
    }
}

/// The future returned by [`SharedPromise::wait`].
pub struct SharedPromiseFuture<T: Clone> {
    promise: Arc<SharedPromise<T>>,
}

impl<T: Clone> Future for SharedPromiseFuture<T> {
    type Output = std::result::Result<T, Arc<Error>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.promise.inner.lock();
        match &inner.state {
            SharedPromiseState::Resolved(v) => Poll::Ready(Ok(v.clone())),
            SharedPromiseState::Rejected(e) => Poll::Ready(Err(e.clone())),
            SharedPromiseState::Init | SharedPromiseState::Loading => {
                inner.wakers.push(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn start_is_noop_after_loading() {
        let promise: SharedPromise<u64> = SharedPromise::new(|_| {});
        promise.start();
        promise.start();
        assert!(promise.is_loading());
    }

    #[test]
    fn resolve_is_noop_once_settled() {
        let promise = SharedPromise::new(|_| {});
        promise.start();
        promise.resolve(1u64);
        promise.resolve(2u64);
        assert_eq!(promise.value(), Some(1));
    }

    #[test]
    fn every_transition_invokes_on_change_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let promise = SharedPromise::new(move |_| {
            calls2.fetch_add(1, Ordering::SeqCst);
        });
        promise.start();
        promise.resolve(42u64);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn wait_resolves_once_settled() {
        let promise = Arc::new(SharedPromise::new(|_| {}));
        promise.start();
        promise.resolve(7u64);
        let fut = promise.wait();
        let result = futures_executor::block_on(fut);
        assert_eq!(result.unwrap(), 7);
    }
}
