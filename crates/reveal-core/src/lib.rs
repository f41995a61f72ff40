#![forbid(unsafe_code)]

//! Viewport visibility and scroll-progress engine.
//!
//! # Role
//! `reveal-core` turns intersection notifications from a host primitive into
//! a small [`VisibilityState`] that presentational code reads to drive
//! entrance animations (fade, slide, scale, parallax) without computing
//! geometry itself.
//!
//! # Primary pieces
//! - [`RevealConfig`]: threshold, root margin and trigger-once flag, with
//!   validated construction and environment overrides.
//! - [`VisibilityWatcher`]: capability trait over the host primitive.
//!   [`GeometryWatcher`] measures host-supplied rectangles; the browser
//!   implementation lives in `reveal-web`.
//! - [`VisibilityProgressObserver`]: attaches targets and returns
//!   [`RevealSession`] handles that release their registration on drop.
//!
//! # Example
//!
//! ```
//! use reveal_core::{GeometryWatcher, Rect, RevealConfig, VisibilityProgressObserver};
//!
//! let watcher = GeometryWatcher::new(Rect::new(0.0, 0.0, 800.0, 600.0));
//! watcher.set_layout("gallery", Rect::new(0.0, 900.0, 800.0, 400.0));
//!
//! let observer = VisibilityProgressObserver::new(watcher.clone());
//! let session = observer.attach(Some("gallery"), RevealConfig::default());
//!
//! watcher.refresh();
//! assert!(!session.is_visible());
//!
//! // 60px of 400px visible: ratio 0.15, half of the 0.3 threshold.
//! watcher.scroll_to(0.0, 360.0);
//! watcher.refresh();
//! assert!(session.is_visible());
//! assert!((session.progress() - 0.5).abs() < 1e-9);
//! ```

pub mod config;
pub mod geometry;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod margin;
pub mod observer;
pub mod session;
mod signal;
pub mod state;
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
pub mod watcher;

pub use config::{ConfigError, ConfigParse, RevealConfig};
pub use geometry::{GeometryWatcher, Rect, measure};
pub use margin::{MarginLength, MarginParseError, MarginUnit, RootMargin};
pub use observer::VisibilityProgressObserver;
pub use session::{RevealSession, SessionId, SessionPhase};
pub use signal::StateSubscription;
pub use state::{IntersectionSample, Transition, VisibilityState, apply_sample, progress_for};
pub use watcher::{
    IntersectionListener, VisibilityWatcher, WatchError, WatchOptions, WatchRegistration,
};
