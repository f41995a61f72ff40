#![forbid(unsafe_code)]

//! One observation lifecycle for a single target.
//!
//! A [`RevealSession`] is the handle returned by
//! [`VisibilityProgressObserver::attach`](crate::VisibilityProgressObserver::attach).
//! It owns the platform registration, so dropping the handle stops
//! observation on every exit path, including an unmount before the target
//! was ever seen.
//!
//! # Phases
//!
//! ```text
//!  attach ──► Observing ──(first entry, trigger_once)──► Latched ──┐
//!     │           │                                                 │
//!     │           └──────────────── detach ─────────────────────────┤
//!     ├──► Unmounted (no target) ──────── detach ───────────────────┤
//!     └──► Fallback (no platform support) ─ detach ─────────────────┴─► Detached
//! ```
//!
//! Only `Observing` applies samples. The listener handed to the watcher holds
//! a weak reference, so samples delivered for a dropped session go nowhere.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::config::RevealConfig;
use crate::signal::{StateSignal, StateSubscription};
use crate::state::{IntersectionSample, VisibilityState, apply_sample};
use crate::watcher::{IntersectionListener, WatchRegistration};

/// Identifier of a session, unique within one observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Attached without a target; stays hidden.
    Unmounted,
    /// Receiving samples from the watcher.
    Observing,
    /// Became visible under `trigger_once`; no longer observing.
    Latched,
    /// Explicitly detached or dropped.
    Detached,
    /// Host cannot observe; pinned to [`VisibilityState::FALLBACK`].
    Fallback,
}

impl SessionPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unmounted => "unmounted",
            Self::Observing => "observing",
            Self::Latched => "latched",
            Self::Detached => "detached",
            Self::Fallback => "fallback",
        }
    }
}

pub(crate) struct SessionCore {
    id: SessionId,
    config: RevealConfig,
    state: StateSignal,
    phase: Cell<SessionPhase>,
    registration: RefCell<Option<WatchRegistration>>,
    /// Observer-wide count of sessions in `Observing`.
    observing: Rc<Cell<usize>>,
}

impl SessionCore {
    fn handle(&self, sample: IntersectionSample) {
        if self.phase.get() != SessionPhase::Observing {
            trace!(session = %self.id, phase = self.phase.get().as_str(), "sample ignored");
            return;
        }
        let transition = apply_sample(self.state.get(), sample, &self.config);
        trace!(
            session = %self.id,
            intersecting = sample.is_intersecting,
            ratio = sample.intersection_ratio,
            progress = transition.state.progress,
            "sample applied"
        );
        let released = if transition.release {
            self.leave_observing(SessionPhase::Latched);
            debug!(session = %self.id, progress = transition.state.progress, "latched visible");
            self.registration.borrow_mut().take()
        } else {
            None
        };
        self.state.set(transition.state);
        drop(released);
    }

    fn leave_observing(&self, next: SessionPhase) {
        if self.phase.replace(next) == SessionPhase::Observing {
            self.observing.set(self.observing.get().saturating_sub(1));
        }
    }

    /// Keep `registration` unless the session stopped observing while the
    /// watcher was still registering (synchronous first delivery).
    pub(crate) fn install(&self, registration: WatchRegistration) {
        if self.phase.get() == SessionPhase::Observing {
            *self.registration.borrow_mut() = Some(registration);
        } else {
            registration.release();
        }
    }

    /// Switch an observing session to the static fallback.
    pub(crate) fn degrade(&self) {
        self.leave_observing(SessionPhase::Fallback);
        let registration = self.registration.borrow_mut().take();
        drop(registration);
        self.state.set(VisibilityState::FALLBACK);
    }

    fn detach(&self) {
        if self.phase.get() == SessionPhase::Detached {
            return;
        }
        self.leave_observing(SessionPhase::Detached);
        let registration = self.registration.borrow_mut().take();
        drop(registration);
        debug!(session = %self.id, "detached");
    }
}

/// Handle for one observation session.
///
/// Dropping the handle detaches it.
pub struct RevealSession {
    core: Rc<SessionCore>,
}

impl RevealSession {
    pub(crate) fn new(
        id: SessionId,
        config: RevealConfig,
        phase: SessionPhase,
        observing: Rc<Cell<usize>>,
    ) -> Self {
        let initial = match phase {
            SessionPhase::Fallback => VisibilityState::FALLBACK,
            _ => VisibilityState::HIDDEN,
        };
        if phase == SessionPhase::Observing {
            observing.set(observing.get() + 1);
        }
        Self {
            core: Rc::new(SessionCore {
                id,
                config,
                state: StateSignal::new(initial),
                phase: Cell::new(phase),
                registration: RefCell::new(None),
                observing,
            }),
        }
    }

    pub(crate) fn core(&self) -> &SessionCore {
        &self.core
    }

    /// Listener that feeds samples into this session while it is alive.
    pub(crate) fn listener(&self) -> IntersectionListener {
        let weak: Weak<SessionCore> = Rc::downgrade(&self.core);
        Rc::new(move |sample| {
            if let Some(core) = weak.upgrade() {
                core.handle(sample);
            }
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.core.id
    }

    #[must_use]
    pub fn config(&self) -> &RevealConfig {
        &self.core.config
    }

    #[must_use]
    pub fn state(&self) -> VisibilityState {
        self.core.state.get()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.state().is_visible
    }

    #[must_use]
    pub fn progress(&self) -> f64 {
        self.state().progress
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.core.phase.get()
    }

    /// Whether the session is still receiving samples.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase() == SessionPhase::Observing
    }

    /// Number of state changes so far; useful for dirty-checking.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.core.state.version()
    }

    /// Call `callback` with the new state after every change.
    pub fn subscribe(&self, callback: impl Fn(&VisibilityState) + 'static) -> StateSubscription {
        self.core.state.subscribe(callback)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.core.state.subscriber_count()
    }

    /// Stop observing and release the platform registration. Idempotent.
    pub fn detach(&self) {
        self.core.detach();
    }
}

impl Drop for RevealSession {
    fn drop(&mut self) {
        self.core.detach();
    }
}

impl fmt::Debug for RevealSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevealSession")
            .field("id", &self.core.id)
            .field("phase", &self.core.phase.get())
            .field("state", &self.core.state.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observing(config: RevealConfig) -> (RevealSession, Rc<Cell<usize>>) {
        let counter = Rc::new(Cell::new(0));
        let session = RevealSession::new(
            SessionId(1),
            config,
            SessionPhase::Observing,
            Rc::clone(&counter),
        );
        (session, counter)
    }

    #[test]
    fn latch_releases_registration_after_state_update() {
        let (session, counter) = observing(RevealConfig::default());
        let released = Rc::new(Cell::new(false));
        let seen_visible_at_release = Rc::new(Cell::new(false));
        {
            let released = Rc::clone(&released);
            let seen = Rc::clone(&seen_visible_at_release);
            let weak = Rc::downgrade(&session.core);
            session.core().install(WatchRegistration::new(move || {
                released.set(true);
                if let Some(core) = weak.upgrade() {
                    seen.set(core.state.get().is_visible);
                }
            }));
        }
        assert_eq!(counter.get(), 1);

        (session.listener())(IntersectionSample::new(true, 0.15));
        assert!(released.get());
        assert!(seen_visible_at_release.get());
        assert_eq!(session.phase(), SessionPhase::Latched);
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn install_after_synchronous_latch_releases_immediately() {
        let (session, _counter) = observing(RevealConfig::default());
        (session.listener())(IntersectionSample::new(true, 1.0));
        assert_eq!(session.phase(), SessionPhase::Latched);

        let released = Rc::new(Cell::new(false));
        let r = Rc::clone(&released);
        session.core().install(WatchRegistration::new(move || r.set(true)));
        assert!(released.get());
    }

    #[test]
    fn degrade_pins_fallback_state() {
        let (session, counter) = observing(RevealConfig::default());
        session.core().degrade();
        assert_eq!(session.phase(), SessionPhase::Fallback);
        assert_eq!(session.state(), VisibilityState::FALLBACK);
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn listener_outliving_session_is_inert() {
        let (session, counter) = observing(RevealConfig::default());
        let listener = session.listener();
        drop(session);
        assert_eq!(counter.get(), 0);
        listener(IntersectionSample::new(true, 1.0));
    }

    #[test]
    fn detach_is_idempotent() {
        let (session, counter) = observing(RevealConfig::default());
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        session
            .core()
            .install(WatchRegistration::new(move || c.set(c.get() + 1)));
        session.detach();
        session.detach();
        drop(session);
        assert_eq!(count.get(), 1);
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn phase_names() {
        assert_eq!(SessionPhase::Latched.as_str(), "latched");
        assert_eq!(SessionId(7).to_string(), "session-7");
    }
}
