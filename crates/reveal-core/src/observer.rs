#![forbid(unsafe_code)]

//! Entry point that turns targets into [`RevealSession`]s.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::config::RevealConfig;
use crate::session::{RevealSession, SessionId, SessionPhase};
use crate::watcher::{VisibilityWatcher, WatchOptions};

/// Attaches sessions to targets through a [`VisibilityWatcher`].
///
/// Sessions are independent: each has its own configuration, state and
/// platform registration.
pub struct VisibilityProgressObserver<W: VisibilityWatcher> {
    watcher: W,
    next_id: Cell<u64>,
    observing: Rc<Cell<usize>>,
}

impl<W: VisibilityWatcher> VisibilityProgressObserver<W> {
    #[must_use]
    pub fn new(watcher: W) -> Self {
        Self {
            watcher,
            next_id: Cell::new(1),
            observing: Rc::new(Cell::new(0)),
        }
    }

    #[must_use]
    pub fn watcher(&self) -> &W {
        &self.watcher
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.watcher.is_supported()
    }

    /// Number of sessions still receiving samples.
    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.observing.get()
    }

    /// Start a session for `target`.
    ///
    /// A missing target yields a session that stays hidden, whatever the
    /// host supports. For a mounted target, a host without visibility
    /// support or a watcher that refuses the target yields a session pinned
    /// to [`VisibilityState::FALLBACK`](crate::VisibilityState::FALLBACK) so
    /// the content is still shown.
    pub fn attach(&self, target: Option<&W::Element>, config: RevealConfig) -> RevealSession {
        let id = SessionId(self.next_id.replace(self.next_id.get() + 1));

        let Some(target) = target else {
            debug!(session = %id, "target not mounted");
            return RevealSession::new(id, config, SessionPhase::Unmounted, Rc::clone(&self.observing));
        };

        if !self.watcher.is_supported() {
            debug!(session = %id, "visibility watcher unsupported; using fallback state");
            return RevealSession::new(id, config, SessionPhase::Fallback, Rc::clone(&self.observing));
        }

        let options = WatchOptions::from_config(&config);
        debug!(
            session = %id,
            threshold = config.threshold(),
            root_margin = %config.root_margin(),
            trigger_once = config.trigger_once(),
            "attach"
        );
        let session = RevealSession::new(id, config, SessionPhase::Observing, Rc::clone(&self.observing));
        match self.watcher.watch(target, &options, session.listener()) {
            Ok(registration) => session.core().install(registration),
            Err(err) => {
                warn!(session = %id, error = %err, "watch failed; using fallback state");
                session.core().degrade();
            }
        }
        session
    }
}

impl<W: VisibilityWatcher + fmt::Debug> fmt::Debug for VisibilityProgressObserver<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityProgressObserver")
            .field("watcher", &self.watcher)
            .field("next_id", &self.next_id.get())
            .field("active_sessions", &self.observing.get())
            .finish()
    }
}
