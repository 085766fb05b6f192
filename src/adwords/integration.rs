use async_trait::async_trait;

use crate::adwords::error::AdWordsResult;
use crate::adwords::facade::{Page, Track};

/// Lifecycle and event hooks a host analytics runtime drives.
///
/// The host calls [`Integration::initialize`] once, waits for it to resolve, and then forwards
/// page views and track events in the order they happen.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Integration: Send + Sync {
    fn name(&self) -> &'static str;

    async fn initialize(&self) -> AdWordsResult<()>;

    fn loaded(&self) -> bool;

    fn page(&self, page: &Page) -> AdWordsResult<()>;

    fn track(&self, track: &Track) -> AdWordsResult<()>;
}
