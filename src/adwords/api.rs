use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::adwords::config::{AdWordsOptions, ConfigWarning};
use crate::adwords::constants::{CONVERSION_SCRIPT_URL, INTEGRATION_NAME};
use crate::adwords::error::AdWordsResult;
use crate::adwords::facade::{Page, Track};
use crate::adwords::integration::Integration;
use crate::adwords::loader::{
    default_script_loader, wait_until_available, LoadSettings, ScriptLoader,
};
use crate::adwords::payload::ConversionPayload;
use crate::adwords::routing::ConversionRouting;
use crate::adwords::tracker::{default_tracker, ConversionTracker};

/// The AdWords conversion dispatcher.
///
/// Cloning is cheap; clones share readiness and the injected-script state.
#[derive(Clone)]
pub struct AdWords {
    inner: Arc<AdWordsInner>,
}

impl fmt::Debug for AdWords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdWords")
            .field("conversion_id", self.inner.routing.conversion_id())
            .field("remarketing", &self.inner.routing.remarketing())
            .field("ready", &self.is_ready())
            .finish()
    }
}

struct AdWordsInner {
    options: AdWordsOptions,
    routing: ConversionRouting,
    warnings: Vec<ConfigWarning>,
    tracker: Arc<dyn ConversionTracker>,
    loader: Arc<dyn ScriptLoader>,
    load_settings: LoadSettings,
    script_requested: AtomicBool,
    ready: AtomicBool,
}

pub struct AdWordsBuilder {
    options: AdWordsOptions,
    tracker: Option<Arc<dyn ConversionTracker>>,
    loader: Option<Arc<dyn ScriptLoader>>,
    load_settings: LoadSettings,
}

impl AdWordsBuilder {
    /// Replaces the platform tracker (`window.google_trackConversion` in browsers).
    pub fn with_tracker<T>(mut self, tracker: T) -> Self
    where
        T: ConversionTracker + 'static,
    {
        self.tracker = Some(Arc::new(tracker));
        self
    }

    /// Replaces the platform script loader (a `<script>` tag in browsers).
    pub fn with_script_loader<L>(mut self, loader: L) -> Self
    where
        L: ScriptLoader + 'static,
    {
        self.loader = Some(Arc::new(loader));
        self
    }

    pub fn with_load_settings(mut self, load_settings: LoadSettings) -> Self {
        self.load_settings = load_settings;
        self
    }

    pub fn build(self) -> AdWords {
        let (routing, warnings) = ConversionRouting::from_options(&self.options);
        for warning in &warnings {
            log::warn!("Ignoring AdWords option {warning}");
        }

        let inner = AdWordsInner {
            options: self.options,
            routing,
            warnings,
            tracker: self.tracker.unwrap_or_else(default_tracker),
            loader: self.loader.unwrap_or_else(default_script_loader),
            load_settings: self.load_settings,
            script_requested: AtomicBool::new(false),
            ready: AtomicBool::new(false),
        };
        AdWords {
            inner: Arc::new(inner),
        }
    }
}

impl AdWords {
    /// Creates the integration with the platform tracker and script loader.
    pub fn new(options: AdWordsOptions) -> Self {
        Self::builder(options).build()
    }

    pub fn builder(options: AdWordsOptions) -> AdWordsBuilder {
        AdWordsBuilder {
            options,
            tracker: None,
            loader: None,
            load_settings: LoadSettings::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        INTEGRATION_NAME
    }

    pub fn options(&self) -> &AdWordsOptions {
        &self.inner.options
    }

    pub fn routing(&self) -> &ConversionRouting {
        &self.inner.routing
    }

    /// Option entries that were dropped while resolving the configuration.
    pub fn config_warnings(&self) -> &[ConfigWarning] {
        &self.inner.warnings
    }

    pub fn load_settings(&self) -> &LoadSettings {
        &self.inner.load_settings
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::SeqCst)
    }

    /// Whether the conversion function is present on the page.
    pub fn loaded(&self) -> bool {
        self.inner.tracker.is_available()
    }

    /// Injects the conversion script (once) and waits until the conversion function is callable.
    ///
    /// On timeout the integration stays not ready and events keep being dropped; calling
    /// `initialize` again resumes waiting without injecting a second script tag.
    pub async fn initialize(&self) -> AdWordsResult<()> {
        if self.is_ready() {
            return Ok(());
        }

        self.load_script().await?;
        if let Err(err) =
            wait_until_available(self.inner.tracker.as_ref(), &self.inner.load_settings).await
        {
            log::warn!("AdWords conversion tracking did not become ready: {err}");
            return Err(err);
        }

        self.inner.ready.store(true, Ordering::SeqCst);
        log::info!(
            "AdWords conversion tracking ready for conversion ID `{}`",
            self.inner.routing.conversion_id()
        );
        Ok(())
    }

    /// Reports a page view. Dropped until the integration is ready.
    pub fn page(&self, page: &Page) -> AdWordsResult<()> {
        if !self.is_ready() {
            log::debug!("AdWords not ready; dropping page view");
            return Ok(());
        }
        self.emit(self.inner.routing.plan_page(page))
    }

    /// Reports a track event. Dropped until the integration is ready; events without a matching
    /// label or whitelist entry fire nothing.
    pub fn track(&self, track: &Track) -> AdWordsResult<()> {
        if !self.is_ready() {
            log::debug!("AdWords not ready; dropping event `{}`", track.event());
            return Ok(());
        }
        let payloads = self.inner.routing.plan_track(track);
        if payloads.is_empty() {
            log::debug!("No AdWords conversion configured for event `{}`", track.event());
            return Ok(());
        }
        self.emit(payloads)
    }

    fn emit(&self, payloads: Vec<ConversionPayload>) -> AdWordsResult<()> {
        for payload in &payloads {
            self.inner.tracker.track_conversion(payload)?;
        }
        Ok(())
    }

    async fn load_script(&self) -> AdWordsResult<()> {
        if self.inner.script_requested.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Err(err) = self.inner.loader.load(CONVERSION_SCRIPT_URL).await {
            self.inner.script_requested.store(false, Ordering::SeqCst);
            log::warn!("Failed to load the AdWords conversion script: {err}");
            return Err(err);
        }
        Ok(())
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Integration for AdWords {
    fn name(&self) -> &'static str {
        AdWords::name(self)
    }

    async fn initialize(&self) -> AdWordsResult<()> {
        AdWords::initialize(self).await
    }

    fn loaded(&self) -> bool {
        AdWords::loaded(self)
    }

    fn page(&self, page: &Page) -> AdWordsResult<()> {
        AdWords::page(self, page)
    }

    fn track(&self, track: &Track) -> AdWordsResult<()> {
        AdWords::track(self, track)
    }
}
