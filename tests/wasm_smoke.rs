#![cfg(all(target_arch = "wasm32", feature = "wasm-web"))]

use adwords_rs::adwords::{
    AdWords, AdWordsOptions, BrowserTracker, LoadSettings, RecordingScriptLoader, Track,
};
use serde_json::json;
use std::time::Duration;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const CALLS_GLOBAL: &str = "__adwordsCalls";

fn install_fake_pixel() {
    let global = js_sys::global();
    js_sys::Reflect::set(&global, &JsValue::from_str(CALLS_GLOBAL), &js_sys::Array::new())
        .expect("install call log");
    let function = js_sys::Function::new_with_args(
        "payload",
        "globalThis.__adwordsCalls.push(JSON.stringify(payload));",
    );
    js_sys::Reflect::set(
        &global,
        &JsValue::from_str("google_trackConversion"),
        &function,
    )
    .expect("install google_trackConversion");
}

fn recorded_calls() -> Vec<serde_json::Value> {
    let global = js_sys::global();
    let calls: js_sys::Array = js_sys::Reflect::get(&global, &JsValue::from_str(CALLS_GLOBAL))
        .expect("call log")
        .into();
    calls
        .iter()
        .map(|call| serde_json::from_str(&call.as_string().expect("string")).expect("json"))
        .collect()
}

#[wasm_bindgen_test(async)]
async fn browser_tracker_calls_the_global_function() {
    install_fake_pixel();

    let adwords = AdWords::builder(
        AdWordsOptions::new(978352801u64).with_event("login", "QbThCM_zogcQofXB0gM"),
    )
    .with_tracker(BrowserTracker)
    .with_script_loader(RecordingScriptLoader::new())
    .with_load_settings(LoadSettings::default().with_timeout(Some(Duration::from_secs(1))))
    .build();

    adwords.initialize().await.expect("initialize");
    adwords
        .track(&Track::from_value("login", json!({"revenue": 90})))
        .expect("track");

    assert_eq!(
        recorded_calls(),
        vec![json!({
            "google_conversion_id": 978352801,
            "google_custom_params": {},
            "google_conversion_language": "en",
            "google_conversion_format": "3",
            "google_conversion_color": "ffffff",
            "google_conversion_label": "QbThCM_zogcQofXB0gM",
            "google_conversion_value": 90,
            "google_remarketing_only": false
        })]
    );
}
