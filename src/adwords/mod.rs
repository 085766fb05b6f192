mod api;
pub mod config;
mod constants;
pub mod error;
pub mod facade;
mod integration;
pub mod loader;
pub mod payload;
pub mod routing;
pub mod tracker;

pub use api::{AdWords, AdWordsBuilder};
pub use config::{AdWordsOptions, ConfigWarning, ConversionId, LabelMapEntry};
pub use constants::{CONVERSION_SCRIPT_URL, INTEGRATION_NAME, TRACK_CONVERSION_FUNCTION};
pub use facade::{Page, Properties, Track};
pub use integration::Integration;
pub use loader::{LoadSettings, RecordingScriptLoader, ScriptLoader};
pub use payload::{ConversionPayload, PayloadKind};
pub use routing::ConversionRouting;
pub use tracker::{ConversionTracker, RecordingTracker};

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub use loader::DomScriptLoader;
#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub use tracker::BrowserTracker;
