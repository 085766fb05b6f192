//! Outbound seam: the page's `google_trackConversion` function.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::adwords::error::AdWordsResult;
use crate::adwords::payload::ConversionPayload;

pub trait ConversionTracker: Send + Sync {
    /// Whether the reporting function can be called yet.
    fn is_available(&self) -> bool;

    fn track_conversion(&self, payload: &ConversionPayload) -> AdWordsResult<()>;
}

/// Keeps every payload in memory instead of reporting it. Starts out available.
#[derive(Clone, Debug)]
pub struct RecordingTracker {
    calls: Arc<Mutex<Vec<ConversionPayload>>>,
    available: Arc<AtomicBool>,
}

impl Default for RecordingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ConversionPayload> {
        self.calls.lock().unwrap().clone()
    }

    pub fn take_calls(&self) -> Vec<ConversionPayload> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }
}

impl ConversionTracker for RecordingTracker {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn track_conversion(&self, payload: &ConversionPayload) -> AdWordsResult<()> {
        self.calls.lock().unwrap().push(payload.clone());
        Ok(())
    }
}

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub(crate) fn default_tracker() -> Arc<dyn ConversionTracker> {
    Arc::new(web::BrowserTracker)
}

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
pub(crate) fn default_tracker() -> Arc<dyn ConversionTracker> {
    Arc::new(UnsupportedTracker)
}

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
struct UnsupportedTracker;

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
impl ConversionTracker for UnsupportedTracker {
    fn is_available(&self) -> bool {
        false
    }

    fn track_conversion(&self, _payload: &ConversionPayload) -> AdWordsResult<()> {
        Err(crate::adwords::error::tracker_error(
            "Reporting conversions requires the `wasm-web` feature and WebAssembly target",
        ))
    }
}

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub use web::BrowserTracker;

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
mod web {
    use js_sys::Function;
    use wasm_bindgen::{JsCast, JsValue};

    use crate::adwords::constants::TRACK_CONVERSION_FUNCTION;
    use crate::adwords::error::{internal_error, tracker_error, AdWordsResult};
    use crate::adwords::payload::ConversionPayload;

    use super::ConversionTracker;

    /// Calls `window.google_trackConversion` once per payload.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct BrowserTracker;

    impl ConversionTracker for BrowserTracker {
        fn is_available(&self) -> bool {
            track_conversion_function().is_some()
        }

        fn track_conversion(&self, payload: &ConversionPayload) -> AdWordsResult<()> {
            let function = track_conversion_function().ok_or_else(|| {
                tracker_error(format!("`{TRACK_CONVERSION_FUNCTION}` is not available"))
            })?;
            let serialized = serde_json::to_string(payload).map_err(|err| {
                internal_error(format!("failed to serialise conversion payload: {err}"))
            })?;
            let argument = js_sys::JSON::parse(&serialized).map_err(|err| {
                internal_error(format!(
                    "failed to convert conversion payload: {}",
                    js_error_message(err)
                ))
            })?;
            function.call1(&JsValue::NULL, &argument).map_err(|err| {
                tracker_error(format!(
                    "{TRACK_CONVERSION_FUNCTION}() threw: {}",
                    js_error_message(err)
                ))
            })?;
            Ok(())
        }
    }

    fn track_conversion_function() -> Option<Function> {
        let global = js_sys::global();
        let value =
            js_sys::Reflect::get(&global, &JsValue::from_str(TRACK_CONVERSION_FUNCTION)).ok()?;
        value.dyn_into::<Function>().ok()
    }

    pub(crate) fn js_error_message(value: JsValue) -> String {
        if let Some(error) = value.dyn_ref::<js_sys::Error>() {
            format!("{}", error.message())
        } else if let Some(string) = value.as_string() {
            string
        } else {
            format!("{value:?}")
        }
    }
}

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub(crate) use web::js_error_message;
