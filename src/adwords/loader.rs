//! Loading of the conversion script and the readiness gate that follows it.
//!
//! The conversion script defines `google_trackConversion` some time after the `<script>` tag is
//! injected. Readiness is an async wait that polls the tracker until the function shows up,
//! bounded by [`LoadSettings::timeout`].

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::adwords::constants::{
    DEFAULT_LOAD_TIMEOUT, DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL, TRACK_CONVERSION_FUNCTION,
};
use crate::adwords::error::{load_timeout, script_load_error, AdWordsResult};
use crate::adwords::tracker::ConversionTracker;
use crate::platform::runtime::{sleep, with_timeout};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadSettings {
    pub poll_interval: Duration,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: Some(DEFAULT_LOAD_TIMEOUT),
        }
    }
}

impl LoadSettings {
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait ScriptLoader: Send + Sync {
    /// Adds a `<script>` tag for `src` to the page and resolves once it has loaded.
    async fn load(&self, src: &str) -> AdWordsResult<()>;
}

/// Records requested sources without touching any document.
#[derive(Clone, Debug, Default)]
pub struct RecordingScriptLoader {
    sources: Arc<Mutex<Vec<String>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl RecordingScriptLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }

    /// Makes the next load attempt fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap() = Some(message.into());
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl ScriptLoader for RecordingScriptLoader {
    async fn load(&self, src: &str) -> AdWordsResult<()> {
        if let Some(message) = self.failure.lock().unwrap().take() {
            return Err(script_load_error(message));
        }
        self.sources.lock().unwrap().push(src.to_string());
        Ok(())
    }
}

/// Polls `tracker` until it reports the conversion function as available.
pub(crate) async fn wait_until_available(
    tracker: &dyn ConversionTracker,
    settings: &LoadSettings,
) -> AdWordsResult<()> {
    let poll_interval = settings.poll_interval.max(MIN_POLL_INTERVAL);
    let poll = async {
        while !tracker.is_available() {
            sleep(poll_interval).await;
        }
    };

    match settings.timeout {
        None => {
            poll.await;
            Ok(())
        }
        Some(timeout) => with_timeout(poll, timeout).await.map_err(|_| {
            load_timeout(format!(
                "`{TRACK_CONVERSION_FUNCTION}` was not available after {timeout:?}"
            ))
        }),
    }
}

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub(crate) fn default_script_loader() -> Arc<dyn ScriptLoader> {
    Arc::new(web::DomScriptLoader)
}

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
pub(crate) fn default_script_loader() -> Arc<dyn ScriptLoader> {
    Arc::new(UnsupportedScriptLoader)
}

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
struct UnsupportedScriptLoader;

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl ScriptLoader for UnsupportedScriptLoader {
    async fn load(&self, src: &str) -> AdWordsResult<()> {
        Err(script_load_error(format!(
            "Loading `{src}` requires the `wasm-web` feature and WebAssembly target"
        )))
    }
}

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub use web::DomScriptLoader;

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use async_trait::async_trait;
    use futures::channel::oneshot;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;

    use crate::adwords::error::{script_load_error, AdWordsError, AdWordsResult};
    use crate::adwords::tracker::js_error_message;

    use super::ScriptLoader;

    /// Appends a `<script>` element to `<head>` (or `<body>`) of the current document.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct DomScriptLoader;

    #[async_trait(?Send)]
    impl ScriptLoader for DomScriptLoader {
        async fn load(&self, src: &str) -> AdWordsResult<()> {
            let window =
                web_sys::window().ok_or_else(|| script_load_error("Window not available"))?;
            let document = window
                .document()
                .ok_or_else(|| script_load_error("Document not available"))?;

            if document
                .query_selector(&format!("script[src=\"{src}\"]"))
                .ok()
                .flatten()
                .is_some()
            {
                return Ok(());
            }

            let script = document
                .create_element("script")
                .map_err(|err| {
                    script_load_error(format!(
                        "Failed to create script: {}",
                        js_error_message(err)
                    ))
                })?
                .dyn_into::<web_sys::HtmlScriptElement>()
                .map_err(|_| script_load_error("Script element has wrong type"))?;
            script.set_src(src);
            script.set_async(true);

            let (sender, receiver) = oneshot::channel::<Result<(), AdWordsError>>();
            let sender = Rc::new(RefCell::new(Some(sender)));
            let success_sender = sender.clone();
            let onload = Closure::wrap(Box::new(move || {
                if let Some(tx) = success_sender.borrow_mut().take() {
                    let _ = tx.send(Ok(()));
                }
            }) as Box<dyn FnMut()>);

            let error_sender = sender.clone();
            let src_string = src.to_string();
            let onerror = Closure::wrap(Box::new(move || {
                if let Some(tx) = error_sender.borrow_mut().take() {
                    let _ = tx.send(Err(script_load_error(format!(
                        "Failed to load conversion script: {src_string}"
                    ))));
                }
            }) as Box<dyn FnMut()>);

            script.set_onload(Some(onload.as_ref().unchecked_ref()));
            script.set_onerror(Some(onerror.as_ref().unchecked_ref()));

            onload.forget();
            onerror.forget();

            if let Some(head) = document.head() {
                head.append_child(&script).map_err(|err| {
                    script_load_error(format!(
                        "Failed to append script to <head>: {}",
                        js_error_message(err)
                    ))
                })?;
            } else if let Some(body) = document.body() {
                body.append_child(&script).map_err(|err| {
                    script_load_error(format!(
                        "Failed to append script to <body>: {}",
                        js_error_message(err)
                    ))
                })?;
            } else {
                return Err(script_load_error("No <head> or <body> element found"));
            }

            receiver
                .await
                .map_err(|_| script_load_error("Script loading channel dropped"))?
        }
    }
}
