#![forbid(unsafe_code)]

//! Capability interface over the host's intersection primitive.
//!
//! A [`VisibilityWatcher`] registers a listener for one target and hands back
//! a [`WatchRegistration`]. Dropping or releasing the registration must stop
//! all further calls to that listener. Watchers deliver samples on the host's
//! event thread, in the order they were detected.

use std::fmt;
use std::rc::Rc;

use crate::config::RevealConfig;
use crate::margin::RootMargin;
use crate::state::IntersectionSample;

/// Callback invoked with each sample for a watched target.
pub type IntersectionListener = Rc<dyn Fn(IntersectionSample)>;

/// Parameters passed to the platform primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    /// Ascending ratio breakpoints at which the platform should report.
    pub thresholds: Vec<f64>,
    pub root_margin: RootMargin,
}

impl WatchOptions {
    #[must_use]
    pub fn from_config(config: &RevealConfig) -> Self {
        Self {
            thresholds: config.sample_ratios(),
            root_margin: *config.root_margin(),
        }
    }
}

/// Errors a watcher may report when registering a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchError {
    /// The host has no intersection primitive.
    Unsupported,
    /// The host primitive rejected the registration.
    Platform(String),
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "visibility observation is not supported by this host"),
            Self::Platform(msg) => write!(f, "visibility watcher error: {msg}"),
        }
    }
}

impl std::error::Error for WatchError {}

/// RAII guard for one platform registration.
///
/// The release closure runs at most once, either through [`release`] or on
/// drop.
///
/// [`release`]: WatchRegistration::release
pub struct WatchRegistration {
    release: Option<Box<dyn FnOnce()>>,
}

impl WatchRegistration {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A registration with nothing to release.
    #[must_use]
    pub fn noop() -> Self {
        Self { release: None }
    }

    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for WatchRegistration {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl fmt::Debug for WatchRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRegistration")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

/// Host capability that reports intersection changes for targets.
pub trait VisibilityWatcher {
    /// Handle type for observable targets.
    type Element: ?Sized;

    /// Whether the host can observe visibility at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Start reporting intersection changes for `target` to `listener`.
    fn watch(
        &self,
        target: &Self::Element,
        options: &WatchOptions,
        listener: IntersectionListener,
    ) -> Result<WatchRegistration, WatchError>;
}

impl<W: VisibilityWatcher + ?Sized> VisibilityWatcher for Rc<W> {
    type Element = W::Element;

    fn is_supported(&self) -> bool {
        (**self).is_supported()
    }

    fn watch(
        &self,
        target: &Self::Element,
        options: &WatchOptions,
        listener: IntersectionListener,
    ) -> Result<WatchRegistration, WatchError> {
        (**self).watch(target, options, listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn registration_releases_once_on_explicit_release() {
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        let reg = WatchRegistration::new(move || c.set(c.get() + 1));
        reg.release();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn registration_releases_on_drop() {
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        {
            let _reg = WatchRegistration::new(move || c.set(c.get() + 1));
        }
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn options_follow_config() {
        let config = RevealConfig::default()
            .with_root_margin_css("0px 0px -10% 0px")
            .unwrap();
        let options = WatchOptions::from_config(&config);
        assert_eq!(options.root_margin, *config.root_margin());
        assert_eq!(options.thresholds, config.sample_ratios());
    }

    #[test]
    fn error_display() {
        assert_eq!(
            WatchError::Platform("boom".into()).to_string(),
            "visibility watcher error: boom"
        );
    }
}
