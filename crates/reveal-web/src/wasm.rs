#![forbid(unsafe_code)]

use js_sys::{Function, JSON};
use reveal_core::{RevealSession, StateSubscription, VisibilityProgressObserver};
use tracing::warn;
use wasm_bindgen::prelude::*;
use web_sys::Element;

use crate::dom::DomWatcher;
use crate::options::parse_reveal_options;

/// JS-facing observer. One instance is normally shared by a whole page.
#[wasm_bindgen]
pub struct RevealObserver {
    inner: VisibilityProgressObserver<DomWatcher>,
}

impl Default for RevealObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl RevealObserver {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: VisibilityProgressObserver::new(DomWatcher::new()),
        }
    }

    #[wasm_bindgen(getter, js_name = isSupported)]
    pub fn is_supported(&self) -> bool {
        self.inner.is_supported()
    }

    #[wasm_bindgen(getter, js_name = activeSessions)]
    pub fn active_sessions(&self) -> usize {
        self.inner.active_sessions()
    }

    /// Observe `element` (may be `null` before mount) with an optional
    /// `{ threshold, rootMargin, triggerOnce }` object.
    ///
    /// Throws only for invalid options.
    pub fn attach(
        &self,
        element: Option<Element>,
        options: JsValue,
    ) -> Result<RevealHandle, JsValue> {
        let json = if options.is_undefined() || options.is_null() {
            String::new()
        } else {
            JSON::stringify(&options)
                .map(String::from)
                .map_err(|err| JsValue::from_str(&format!("unserializable options: {err:?}")))?
        };
        let config = parse_reveal_options(&json).map_err(|err| JsValue::from_str(&err.to_string()))?;
        Ok(RevealHandle {
            session: self.inner.attach(element.as_ref(), config),
            subscriptions: Vec::new(),
        })
    }
}

/// Session handle returned to JS. Freeing it detaches.
#[wasm_bindgen]
pub struct RevealHandle {
    session: RevealSession,
    subscriptions: Vec<StateSubscription>,
}

#[wasm_bindgen]
impl RevealHandle {
    #[wasm_bindgen(getter, js_name = isVisible)]
    pub fn is_visible(&self) -> bool {
        self.session.is_visible()
    }

    #[wasm_bindgen(getter)]
    pub fn progress(&self) -> f64 {
        self.session.progress()
    }

    /// One of `unmounted`, `observing`, `latched`, `detached`, `fallback`.
    #[wasm_bindgen(getter)]
    pub fn phase(&self) -> String {
        self.session.phase().as_str().to_owned()
    }

    /// Call `callback(isVisible, progress)` after every state change.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&mut self, callback: Function) {
        let id = self.session.id();
        let subscription = self.session.subscribe(move |state| {
            let result = callback.call2(
                &JsValue::NULL,
                &JsValue::from_bool(state.is_visible),
                &JsValue::from_f64(state.progress),
            );
            if let Err(err) = result {
                warn!(session = %id, error = ?err, "onChange callback threw");
            }
        });
        self.subscriptions.push(subscription);
    }

    pub fn detach(&mut self) {
        self.session.detach();
        self.subscriptions.clear();
    }
}
