//! Browser host for `reveal-core`.
//!
//! - [`options`]: parses the JSON options object page scripts pass in.
//!   Platform independent.
//! - `dom` (wasm32 only): `DomWatcher`, the `IntersectionObserver`
//!   implementation of `VisibilityWatcher`.
//! - `wasm` (wasm32 only): `RevealObserver` / `RevealHandle`, exported to JS
//!   through wasm-bindgen.
//!
//! ```js
//! const observer = new RevealObserver();
//! const handle = observer.attach(el, { threshold: 0.3, triggerOnce: true });
//! handle.onChange((visible, progress) => {
//!   el.style.opacity = String(progress);
//! });
//! // on unmount
//! handle.free();
//! ```

pub mod options;

#[cfg(target_arch = "wasm32")]
pub mod dom;
#[cfg(target_arch = "wasm32")]
mod wasm;

pub use options::{OptionsError, parse_reveal_options};

#[cfg(target_arch = "wasm32")]
pub use dom::DomWatcher;
#[cfg(target_arch = "wasm32")]
pub use wasm::{RevealHandle, RevealObserver};
