//! Runs an AdWords integration against an in-memory tracker and prints every pixel call.
//! Point `ADWORDS_OPTIONS` at your own options JSON to see how they route.

use adwords_rs::adwords::{
    AdWords, AdWordsOptions, LabelMapEntry, Page, RecordingScriptLoader, RecordingTracker, Track,
};
use serde_json::json;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = match AdWordsOptions::from_env()? {
        Some(options) => options,
        None => AdWordsOptions::new(978352801u64)
            .with_remarketing(true)
            .with_label(LabelMapEntry::new("Signed Up", "-kGkCJ_TsgcQofXB0gM"))
            .with_label(LabelMapEntry::new("Order Completed", "QbThCM_zogcQofXB0gM"))
            .with_whitelisted("Viewed Product", vec![]),
    };

    let tracker = RecordingTracker::new();
    let adwords = AdWords::builder(options)
        .with_tracker(tracker.clone())
        .with_script_loader(RecordingScriptLoader::new())
        .build();

    for warning in adwords.config_warnings() {
        eprintln!("warning: {warning}");
    }

    adwords.initialize().await?;
    adwords.page(&Page::from_value(json!({
        "path": "/pricing",
        "title": "Pricing",
        "url": "https://example.com/pricing"
    })))?;
    adwords.track(&Track::from_value("Viewed Product", json!({"sku": "sku-1"})))?;
    adwords.track(&Track::from_value(
        "Order Completed",
        json!({"revenue": 42.5, "orderId": "o-1"}),
    ))?;

    for payload in tracker.calls() {
        println!("google_trackConversion({})", payload.to_json()?);
    }

    Ok(())
}
