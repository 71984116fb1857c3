use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde_json::Value;

use crate::binding::ScaleSlot;

/// Callback invoked with the payload of a notification
pub type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct NotifierState<T> {
    next_id: u64,
    handlers: Vec<(u64, Handler<T>)>,
}

/// A list of handlers that are invoked, in registration order, each time a value is published.
///
/// Registering a handler returns a [`Subscription`]; dropping the subscription removes the handler.
/// Hosts use this to implement the change notifications consumed by selectors.
pub struct Notifier<T> {
    inner: Arc<Mutex<NotifierState<T>>>,
}

impl<T: 'static> Notifier<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(NotifierState {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    /// Register a handler that stays active until the returned subscription is dropped
    pub fn subscribe(&self, handler: Handler<T>) -> Subscription {
        let id = {
            let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let id = state.next_id;
            state.next_id += 1;
            state.handlers.push((id, handler));
            id
        };

        let inner: Weak<Mutex<NotifierState<T>>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                let mut state = inner.lock().unwrap_or_else(PoisonError::into_inner);
                state.handlers.retain(|(handler_id, _)| *handler_id != id);
            }
        })
    }

    /// Invoke every registered handler with `value`
    pub fn notify(&self, value: &T) {
        // Snapshot so handlers may subscribe or unsubscribe while being called
        let handlers = {
            let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            state
                .handlers
                .iter()
                .map(|(_, handler)| handler.clone())
                .collect::<Vec<_>>()
        };
        for handler in handlers {
            handler(value);
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Notifier<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Debug for Notifier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self
            .inner
            .lock()
            .map(|state| state.handlers.len())
            .unwrap_or_default();
        f.debug_struct("Notifier").field("handlers", &len).finish()
    }
}

/// Scoped registration of a handler. The handler is released when this value is dropped.
#[must_use = "dropping a subscription immediately unregisters its handler"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Release the handler now
    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// Notifications queued for a selector view by the listeners it registers
#[derive(Debug)]
pub enum SelectorEvent {
    /// The figure's margins or size changed
    Relayout,
    /// The model's `selected` field changed
    SelectedChanged,
    /// The model's `marks` field changed
    MarksChanged,
    /// The model field backing a scale slot changed
    ScaleChanged(ScaleSlot),
    /// A model field that decides how bound scales map onto the figure changed
    ScaleLayoutChanged,
    /// Out-of-band message sent to the model
    Custom(Value),
    /// A bound scale view reported a domain change
    DomainChanged { slot: ScaleSlot, generation: u64 },
    /// Tear the selector down
    Detach,
}
