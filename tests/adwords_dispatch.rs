#![cfg(not(target_arch = "wasm32"))]

use adwords_rs::adwords::{
    AdWords, AdWordsOptions, ConversionId, Page, PayloadKind, RecordingScriptLoader,
    RecordingTracker, Track,
};
use serde_json::{json, Value};

fn ready_adwords(options: Value) -> (AdWords, RecordingTracker) {
    let tracker = RecordingTracker::new();
    let adwords = AdWords::builder(AdWordsOptions::from_value(options).expect("options"))
        .with_tracker(tracker.clone())
        .with_script_loader(RecordingScriptLoader::new())
        .build();
    (adwords, tracker)
}

fn wire_calls(tracker: &RecordingTracker) -> Vec<Value> {
    tracker
        .take_calls()
        .iter()
        .map(|payload| payload.to_json().expect("payload json"))
        .collect()
}

#[tokio::test(flavor = "current_thread")]
async fn legacy_options_fire_the_documented_payloads() {
    let (adwords, tracker) = ready_adwords(json!({
        "conversionId": 978352801,
        "events": {
            "signup": "-kGkCJ_TsgcQofXB0gM",
            "login": "QbThCM_zogcQofXB0gM",
            "play": "b91fc77f"
        }
    }));
    adwords.initialize().await.unwrap();

    adwords.page(&Page::default()).unwrap();
    adwords.track(&Track::from_value("toString", json!({}))).unwrap();
    adwords
        .track(&Track::from_value("signup", json!({})))
        .unwrap();
    adwords
        .track(&Track::from_value("login", json!({"revenue": 90})))
        .unwrap();

    assert_eq!(
        wire_calls(&tracker),
        vec![
            json!({
                "google_conversion_id": 978352801,
                "google_custom_params": {},
                "google_remarketing_only": false
            }),
            json!({
                "google_conversion_id": 978352801,
                "google_custom_params": {},
                "google_conversion_language": "en",
                "google_conversion_format": "3",
                "google_conversion_color": "ffffff",
                "google_conversion_label": "-kGkCJ_TsgcQofXB0gM",
                "google_conversion_value": 0,
                "google_remarketing_only": false
            }),
            json!({
                "google_conversion_id": 978352801,
                "google_custom_params": {},
                "google_conversion_language": "en",
                "google_conversion_format": "3",
                "google_conversion_color": "ffffff",
                "google_conversion_label": "QbThCM_zogcQofXB0gM",
                "google_conversion_value": 90,
                "google_remarketing_only": false
            }),
        ]
    );
}

#[tokio::test(flavor = "current_thread")]
async fn label_map_with_whitelist_routes_per_conversion_id() {
    let (adwords, tracker) = ready_adwords(json!({
        "conversionId": "AW-100",
        "remarketing": true,
        "labelMap": [
            {"eventName": "Order Completed", "label": "order-a"},
            {"eventName": "Order Completed", "label": "order-b"},
            {"eventName": "Order Completed", "label": "order-c", "conversionId": "AW-200"}
        ],
        "whitelist": {
            "Order Completed": ["AW-100", "AW-300"],
            "Viewed Product": null
        }
    }));
    adwords.initialize().await.unwrap();

    adwords
        .track(&Track::from_value(
            "order completed",
            json!({"revenue": "$19.99", "orderId": "o-7"}),
        ))
        .unwrap();

    let calls = tracker.take_calls();
    let conversions: Vec<_> = calls
        .iter()
        .filter(|p| p.kind() == PayloadKind::Conversion)
        .collect();
    let remarketing: Vec<ConversionId> = calls
        .iter()
        .filter(|p| p.kind() == PayloadKind::Remarketing)
        .map(|p| p.conversion_id.clone())
        .collect();

    assert_eq!(conversions.len(), 3);
    assert_eq!(
        remarketing,
        vec![
            ConversionId::from("AW-100"),
            ConversionId::from("AW-200"),
            ConversionId::from("AW-300"),
        ]
    );
    for payload in &calls {
        assert!(!payload.custom_params.contains_key("revenue"));
    }
    assert_eq!(
        conversions[0]
            .conversion
            .as_ref()
            .and_then(|details| details.value.as_f64()),
        Some(19.99)
    );

    adwords
        .track(&Track::from_value("Viewed Product", json!({"sku": "s-1"})))
        .unwrap();
    assert_eq!(
        wire_calls(&tracker),
        vec![json!({
            "google_conversion_id": "AW-100",
            "google_custom_params": {"sku": "s-1"},
            "google_remarketing_only": true
        })]
    );
}

#[tokio::test(flavor = "current_thread")]
async fn options_round_trip_through_json() {
    let raw = r#"{
        "conversionId": 42,
        "remarketing": true,
        "events": [{"key": "login", "value": "abc"}],
        "whitelist": ["signup"]
    }"#;
    let options = AdWordsOptions::from_json(raw).unwrap();
    let reparsed =
        AdWordsOptions::from_value(serde_json::to_value(&options).unwrap()).unwrap();
    assert_eq!(options, reparsed);

    let (adwords, tracker) = ready_adwords(serde_json::to_value(&options).unwrap());
    adwords.initialize().await.unwrap();
    adwords
        .track(&Track::from_value("signup", json!({"plan": "pro"})))
        .unwrap();
    assert_eq!(
        wire_calls(&tracker),
        vec![json!({
            "google_conversion_id": 42,
            "google_custom_params": {"plan": "pro"},
            "google_remarketing_only": true
        })]
    );
}
