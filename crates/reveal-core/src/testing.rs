#![forbid(unsafe_code)]

//! Scripted watcher for tests.
//!
//! [`ManualWatcher`] never measures anything: tests push samples to targets
//! with [`ManualWatcher::emit`]. Targets are plain string keys.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::state::IntersectionSample;
use crate::watcher::{
    IntersectionListener, VisibilityWatcher, WatchError, WatchOptions, WatchRegistration,
};

struct Entry {
    key: u64,
    target: String,
    options: WatchOptions,
    listener: IntersectionListener,
}

struct ManualInner {
    supported: bool,
    next_key: u64,
    entries: Vec<Entry>,
    fail_next: Option<String>,
    deliver_on_watch: Option<IntersectionSample>,
    total_watches: usize,
}

/// Watcher driven entirely by the test. Clones share state.
#[derive(Clone)]
pub struct ManualWatcher {
    inner: Rc<RefCell<ManualInner>>,
}

impl Default for ManualWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualWatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ManualInner {
                supported: true,
                next_key: 0,
                entries: Vec::new(),
                fail_next: None,
                deliver_on_watch: None,
                total_watches: 0,
            })),
        }
    }

    /// A watcher for a host without any visibility primitive.
    #[must_use]
    pub fn unsupported() -> Self {
        let watcher = Self::new();
        watcher.inner.borrow_mut().supported = false;
        watcher
    }

    /// Make the next `watch` call fail with a platform error.
    pub fn fail_next_watch(&self, message: impl Into<String>) {
        self.inner.borrow_mut().fail_next = Some(message.into());
    }

    /// Deliver `sample` from inside every subsequent `watch` call, before
    /// the registration is returned.
    pub fn deliver_on_watch(&self, sample: Option<IntersectionSample>) {
        self.inner.borrow_mut().deliver_on_watch = sample;
    }

    /// Send `sample` to every live listener on `target`, in registration
    /// order. Returns how many listeners were called.
    pub fn emit(&self, target: &str, sample: IntersectionSample) -> usize {
        let listeners: Vec<(u64, IntersectionListener)> = self
            .inner
            .borrow()
            .entries
            .iter()
            .filter(|e| e.target == target)
            .map(|e| (e.key, Rc::clone(&e.listener)))
            .collect();
        let mut delivered = 0;
        for (key, listener) in listeners {
            // An earlier listener may have released this registration.
            if !self.has_key(key) {
                continue;
            }
            listener(sample);
            delivered += 1;
        }
        delivered
    }

    #[must_use]
    pub fn is_watching(&self, target: &str) -> bool {
        self.inner.borrow().entries.iter().any(|e| e.target == target)
    }

    /// Live registrations across all targets.
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// Successful `watch` calls since creation.
    #[must_use]
    pub fn total_watches(&self) -> usize {
        self.inner.borrow().total_watches
    }

    /// Options of the most recent live registration on `target`.
    #[must_use]
    pub fn last_options(&self, target: &str) -> Option<WatchOptions> {
        self.inner
            .borrow()
            .entries
            .iter()
            .rev()
            .find(|e| e.target == target)
            .map(|e| e.options.clone())
    }

    fn has_key(&self, key: u64) -> bool {
        self.inner.borrow().entries.iter().any(|e| e.key == key)
    }
}

fn unregister(inner: &Weak<RefCell<ManualInner>>, key: u64) {
    if let Some(inner) = inner.upgrade() {
        inner.borrow_mut().entries.retain(|e| e.key != key);
    }
}

impl VisibilityWatcher for ManualWatcher {
    type Element = str;

    fn is_supported(&self) -> bool {
        self.inner.borrow().supported
    }

    fn watch(
        &self,
        target: &str,
        options: &WatchOptions,
        listener: IntersectionListener,
    ) -> Result<WatchRegistration, WatchError> {
        let (key, immediate) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.supported {
                return Err(WatchError::Unsupported);
            }
            if let Some(message) = inner.fail_next.take() {
                return Err(WatchError::Platform(message));
            }
            let key = inner.next_key;
            inner.next_key += 1;
            inner.total_watches += 1;
            inner.entries.push(Entry {
                key,
                target: target.to_owned(),
                options: options.clone(),
                listener: Rc::clone(&listener),
            });
            (key, inner.deliver_on_watch)
        };
        if let Some(sample) = immediate {
            listener(sample);
        }
        let weak = Rc::downgrade(&self.inner);
        Ok(WatchRegistration::new(move || unregister(&weak, key)))
    }
}

impl fmt::Debug for ManualWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ManualWatcher")
            .field("supported", &inner.supported)
            .field("live", &inner.entries.len())
            .field("total_watches", &inner.total_watches)
            .finish()
    }
}
