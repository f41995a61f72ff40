#![forbid(unsafe_code)]

//! Change notification for a session's [`VisibilityState`].
//!
//! # Invariants
//!
//! 1. `version` increments exactly once per write that changes the state.
//! 2. Writing a state equal to the current one is a no-op.
//! 3. Subscribers run in registration order, after the new state is stored,
//!    so a read from inside a callback sees the new value.
//! 4. A dropped [`StateSubscription`] is never called again. Its slot is
//!    pruned on the next notification.
//!
//! No borrow is held while callbacks run, so a subscriber may write again.
//! Nested writes are delivered depth-first: every subscriber sees the inner
//! value before the outer write resumes with its remaining subscribers.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::state::VisibilityState;

type Callback = Rc<dyn Fn(&VisibilityState)>;
type WeakCallback = Weak<dyn Fn(&VisibilityState)>;

struct SignalInner {
    value: VisibilityState,
    version: u64,
    subscribers: Vec<WeakCallback>,
}

/// Version-tracked visibility state with subscriber callbacks.
#[derive(Clone)]
pub(crate) struct StateSignal {
    inner: Rc<RefCell<SignalInner>>,
}

impl StateSignal {
    pub(crate) fn new(value: VisibilityState) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    pub(crate) fn get(&self) -> VisibilityState {
        self.inner.borrow().value
    }

    pub(crate) fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Store `value`; returns whether anything changed.
    pub(crate) fn set(&self, value: VisibilityState) -> bool {
        let callbacks: Vec<Callback> = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value;
            inner.version += 1;
            inner.subscribers.retain(|w| w.strong_count() > 0);
            inner.subscribers.iter().filter_map(|w| w.upgrade()).collect()
        };
        for cb in &callbacks {
            cb(&value);
        }
        true
    }

    pub(crate) fn subscribe(&self, callback: impl Fn(&VisibilityState) + 'static) -> StateSubscription {
        let strong: Callback = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        StateSubscription { _callback: strong }
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

impl fmt::Debug for StateSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("StateSignal")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

/// Keeps a state callback registered; dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct StateSubscription {
    _callback: Callback,
}

impl fmt::Debug for StateSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSubscription").finish_non_exhaustive()
    }
}
