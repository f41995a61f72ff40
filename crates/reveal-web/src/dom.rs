#![forbid(unsafe_code)]

//! `IntersectionObserver`-backed [`VisibilityWatcher`].
//!
//! Each registration owns one browser observer, configured with the
//! session's breakpoints and root margin, watching a single element.
//! Releasing the registration disconnects the observer. The JS closure is
//! dropped on a later microtask because release commonly happens from
//! inside that closure (a trigger-once session latching).

use js_sys::{Array, Function, Reflect};
use reveal_core::{
    IntersectionListener, IntersectionSample, VisibilityWatcher, WatchError, WatchOptions,
    WatchRegistration,
};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

type ObserverCallback = Closure<dyn FnMut(Array, IntersectionObserver)>;

/// Browser watcher. Support is probed once at construction.
#[derive(Debug, Clone, Copy)]
pub struct DomWatcher {
    supported: bool,
}

impl Default for DomWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DomWatcher {
    #[must_use]
    pub fn new() -> Self {
        let supported = host_has_intersection_observer();
        if !supported {
            debug!("IntersectionObserver unavailable; sessions will use the fallback state");
        }
        Self { supported }
    }
}

fn host_has_intersection_observer() -> bool {
    web_sys::window().is_some_and(|window| {
        Reflect::has(&window, &JsValue::from_str("IntersectionObserver")).unwrap_or(false)
    })
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

impl VisibilityWatcher for DomWatcher {
    type Element = Element;

    fn is_supported(&self) -> bool {
        self.supported
    }

    fn watch(
        &self,
        target: &Element,
        options: &WatchOptions,
        listener: IntersectionListener,
    ) -> Result<WatchRegistration, WatchError> {
        if !self.supported {
            return Err(WatchError::Unsupported);
        }

        let callback: ObserverCallback =
            Closure::new(move |entries: Array, _observer: IntersectionObserver| {
                for entry in entries.iter() {
                    if let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() {
                        listener(IntersectionSample::new(
                            entry.is_intersecting(),
                            entry.intersection_ratio(),
                        ));
                    }
                }
            });

        let init = IntersectionObserverInit::new();
        init.set_root_margin(&options.root_margin.to_string());
        let thresholds: Array = options
            .thresholds
            .iter()
            .map(|t| JsValue::from_f64(*t))
            .collect();
        init.set_threshold(&thresholds);

        let observer = IntersectionObserver::new_with_options(
            callback.as_ref().unchecked_ref::<Function>(),
            &init,
        )
        .map_err(|err| WatchError::Platform(describe(&err)))?;
        observer.observe(target);

        Ok(WatchRegistration::new(move || {
            observer.disconnect();
            wasm_bindgen_futures::spawn_local(async move {
                drop(callback);
            });
        }))
    }
}
