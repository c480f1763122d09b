//! The event-emitter facet of a query value: `on`/`off`/`emit` over a small,
//! closed set of event kinds.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::Error;

/// The kinds of events a query value can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The data facet has resolved.
    DataReady,
    /// The terminal error has been set.
    Error,
    /// Reserved: no producer emits this today.
    HighScore,
}

/// The argument handed to a handler when its event fires.
#[derive(Debug, Clone, Copy)]
pub enum EventPayload<'a> {
    DataReady,
    Error(&'a Error),
    HighScore,
}

type Handler = Arc<dyn Fn(EventPayload<'_>) + Send + Sync>;

/// A token returned by [`HandlerMap::on`] that can be passed to
/// [`HandlerMap::off`] to remove a specific handler.
///
/// Closures have no stable identity to key on, so `on` hands back an
/// opaque id instead, passed back to `off` to remove exactly that handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

/// Per-kind storage of registered handlers.
#[derive(Default)]
pub struct HandlerMap {
    next_id: AtomicU64,
    handlers: HashMap<EventKind, Vec<(HandlerId, Handler)>>,
}

impl HandlerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(EventPayload<'_>) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    pub fn off(&mut self, kind: EventKind, id: HandlerId) {
        if let Some(handlers) = self.handlers.get_mut(&kind) {
            handlers.retain(|(handler_id, _)| *handler_id != id);
        }
    }

    pub fn emit(&self, kind: EventKind, payload: EventPayload<'_>) {
        if let Some(handlers) = self.handlers.get(&kind) {
            for (_, handler) in handlers {
                handler(payload);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn emits_to_registered_handler() {
        let mut map = HandlerMap::new();
        let seen = Arc::new(Mutex::new(0));
        let seen2 = seen.clone();
        map.on(EventKind::DataReady, move |_| {
            *seen2.lock().unwrap() += 1;
        });
        map.emit(EventKind::DataReady, EventPayload::DataReady);
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn off_removes_only_the_targeted_handler() {
        let mut map = HandlerMap::new();
        let count = Arc::new(Mutex::new(0));
        let count2 = count.clone();
        let id = map.on(EventKind::Error, move |_| {
            *count2.lock().unwrap() += 1;
        });
        let count3 = count.clone();
        map.on(EventKind::Error, move |_| {
            *count3.lock().unwrap() += 10;
        });
        map.off(EventKind::Error, id);

        let err = Error::construction("x");
        map.emit(EventKind::Error, EventPayload::Error(&err));
        assert_eq!(*count.lock().unwrap(), 10);
    }
}
