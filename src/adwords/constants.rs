use std::time::Duration;

pub const INTEGRATION_NAME: &str = "AdWords";

/// Conversion-tracking script injected once per page.
pub const CONVERSION_SCRIPT_URL: &str = "//www.googleadservices.com/pagead/conversion_async.js";

/// Global function exposed by the conversion script.
pub const TRACK_CONVERSION_FUNCTION: &str = "google_trackConversion";

pub(crate) const CONVERSION_LANGUAGE: &str = "en";
pub(crate) const CONVERSION_FORMAT: &str = "3";
pub(crate) const CONVERSION_COLOR: &str = "ffffff";

pub(crate) const REVENUE_PROPERTY: &str = "revenue";

pub(crate) const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);
pub(crate) const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);
pub(crate) const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) const OPTIONS_ENV_VAR: &str = "ADWORDS_OPTIONS";
pub(crate) const OPTIONS_PATH_ENV_VAR: &str = "ADWORDS_OPTIONS_PATH";
#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
pub(crate) const OPTIONS_GLOBAL: &str = "__ADWORDS_OPTIONS__";
