#![forbid(unsafe_code)]

//! Layout-driven intersection measurement.
//!
//! For hosts without a native intersection primitive (native shells,
//! terminal front ends, server-side tests) [`GeometryWatcher`] computes
//! samples from rectangles the host supplies. The host owns the frame loop:
//! it updates the viewport and target layouts, then calls
//! [`GeometryWatcher::refresh`] once per frame.
//!
//! # Notification rule
//!
//! A registration is notified on the first refresh where its target has a
//! layout, and afterwards only when the target crosses one of its ratio
//! breakpoints or its intersecting flag flips. Within one refresh,
//! registrations are notified in the order they were created.
//!
//! Touching edges count as intersecting with a ratio of 0, and a zero-area
//! target that touches the root reports a ratio of 1.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::margin::RootMargin;
use crate::state::IntersectionSample;
use crate::watcher::{
    IntersectionListener, VisibilityWatcher, WatchError, WatchOptions, WatchRegistration,
};

/// Axis-aligned rectangle in host coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Overlap of two rectangles. Edge-adjacent rectangles yield a
    /// zero-area overlap rather than `None`.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 < x0 || y1 < y0 {
            return None;
        }
        Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Sample for `target` against `root` grown by `margin`.
#[must_use]
pub fn measure(target: Rect, root: Rect, margin: &RootMargin) -> IntersectionSample {
    let root = margin.apply(root);
    match target.intersection(&root) {
        None => IntersectionSample::outside(),
        Some(overlap) => {
            let target_area = target.area();
            let ratio = if target_area > 0.0 {
                overlap.area() / target_area
            } else {
                1.0
            };
            IntersectionSample::new(true, ratio)
        }
    }
}

/// Number of breakpoints at or below `ratio`.
fn bucket(thresholds: &[f64], ratio: f64) -> usize {
    thresholds.iter().filter(|t| ratio >= **t).count()
}

struct GeoWatch {
    key: u64,
    target: String,
    options: WatchOptions,
    listener: IntersectionListener,
    last: Option<(usize, bool)>,
}

struct GeometryInner {
    viewport: Rect,
    layouts: HashMap<String, Rect>,
    watches: Vec<GeoWatch>,
    next_key: u64,
}

/// Watcher that measures host-supplied layout rectangles. Clones share state.
#[derive(Clone)]
pub struct GeometryWatcher {
    inner: Rc<RefCell<GeometryInner>>,
}

impl GeometryWatcher {
    #[must_use]
    pub fn new(viewport: Rect) -> Self {
        Self {
            inner: Rc::new(RefCell::new(GeometryInner {
                viewport,
                layouts: HashMap::new(),
                watches: Vec::new(),
                next_key: 0,
            })),
        }
    }

    #[must_use]
    pub fn viewport(&self) -> Rect {
        self.inner.borrow().viewport
    }

    pub fn set_viewport(&self, viewport: Rect) {
        self.inner.borrow_mut().viewport = viewport;
    }

    /// Move the viewport origin, keeping its size.
    pub fn scroll_to(&self, x: f64, y: f64) {
        let mut inner = self.inner.borrow_mut();
        inner.viewport.x = x;
        inner.viewport.y = y;
    }

    pub fn set_layout(&self, target: impl Into<String>, rect: Rect) {
        self.inner.borrow_mut().layouts.insert(target.into(), rect);
    }

    /// Forget a target's layout. A target that was reported before is
    /// reported as outside on the next refresh.
    pub fn remove_layout(&self, target: &str) {
        self.inner.borrow_mut().layouts.remove(target);
    }

    /// Live registrations.
    #[must_use]
    pub fn watch_count(&self) -> usize {
        self.inner.borrow().watches.len()
    }

    /// Measure every registration and notify those whose bucket or
    /// intersecting flag changed. Returns how many listeners were called.
    pub fn refresh(&self) -> usize {
        let pending: Vec<(u64, IntersectionListener, IntersectionSample)> = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let viewport = inner.viewport;
            let mut pending = Vec::new();
            for watch in &mut inner.watches {
                let sample = match inner.layouts.get(&watch.target) {
                    Some(rect) => measure(*rect, viewport, &watch.options.root_margin),
                    None if watch.last.is_some() => IntersectionSample::outside(),
                    None => continue,
                };
                let position = if sample.is_intersecting {
                    bucket(&watch.options.thresholds, sample.intersection_ratio)
                } else {
                    0
                };
                let current = (position, sample.is_intersecting);
                if watch.last == Some(current) {
                    continue;
                }
                watch.last = Some(current);
                pending.push((watch.key, Rc::clone(&watch.listener), sample));
            }
            pending
        };

        let mut delivered = 0;
        for (key, listener, sample) in pending {
            if !self.has_key(key) {
                continue;
            }
            trace!(
                registration = key,
                intersecting = sample.is_intersecting,
                ratio = sample.intersection_ratio,
                "geometry sample"
            );
            listener(sample);
            delivered += 1;
        }
        delivered
    }

    fn has_key(&self, key: u64) -> bool {
        self.inner.borrow().watches.iter().any(|w| w.key == key)
    }
}

fn unregister(inner: &Weak<RefCell<GeometryInner>>, key: u64) {
    if let Some(inner) = inner.upgrade() {
        inner.borrow_mut().watches.retain(|w| w.key != key);
    }
}

impl VisibilityWatcher for GeometryWatcher {
    type Element = str;

    fn watch(
        &self,
        target: &str,
        options: &WatchOptions,
        listener: IntersectionListener,
    ) -> Result<WatchRegistration, WatchError> {
        let key = {
            let mut inner = self.inner.borrow_mut();
            let key = inner.next_key;
            inner.next_key += 1;
            inner.watches.push(GeoWatch {
                key,
                target: target.to_owned(),
                options: options.clone(),
                listener,
                last: None,
            });
            key
        };
        let weak = Rc::downgrade(&self.inner);
        Ok(WatchRegistration::new(move || unregister(&weak, key)))
    }
}

impl fmt::Debug for GeometryWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("GeometryWatcher")
            .field("viewport", &inner.viewport)
            .field("layouts", &inner.layouts.len())
            .field("watches", &inner.watches.len())
            .finish()
    }
}
