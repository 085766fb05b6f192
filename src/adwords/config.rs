//! Integration options as supplied by the host runtime.
//!
//! The option object has gone through several shapes over time (a plain event/label map, an
//! array of `{key, value}` pairs, a `labelMap` with per-entry conversion IDs and two whitelist
//! layouts). This module only captures what the host hands over; interpreting it happens once in
//! [`crate::adwords::routing`].

use std::env;
use std::fmt;
use std::fs;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use crate::adwords::constants::{OPTIONS_ENV_VAR, OPTIONS_PATH_ENV_VAR};
use crate::adwords::error::{invalid_argument, AdWordsResult};

/// Account-level identifier grouping conversions and remarketing audiences.
///
/// Hosts pass either a number or a string; the value is echoed back to the pixel exactly as
/// supplied. Anything else lands in [`ConversionId::Other`] and is forwarded unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConversionId {
    Numeric(u64),
    Text(String),
    Other(Value),
}

impl ConversionId {
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_u64().map(ConversionId::Numeric),
            Value::String(text) => Some(ConversionId::Text(text.clone())),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ConversionId::Text(text) => text.is_empty(),
            ConversionId::Other(value) => value.is_null(),
            ConversionId::Numeric(_) => false,
        }
    }

    /// Identity used when de-duplicating remarketing tags: `111` and `"111"` are one account.
    pub(crate) fn dedup_key(&self) -> String {
        self.to_string()
    }
}

impl Default for ConversionId {
    fn default() -> Self {
        ConversionId::Text(String::new())
    }
}

impl From<u64> for ConversionId {
    fn from(value: u64) -> Self {
        ConversionId::Numeric(value)
    }
}

impl From<&str> for ConversionId {
    fn from(value: &str) -> Self {
        ConversionId::Text(value.to_string())
    }
}

impl From<String> for ConversionId {
    fn from(value: String) -> Self {
        ConversionId::Text(value)
    }
}

impl From<ConversionId> for Value {
    fn from(value: ConversionId) -> Self {
        match value {
            ConversionId::Numeric(number) => Value::Number(Number::from(number)),
            ConversionId::Text(text) => Value::String(text),
            ConversionId::Other(value) => value,
        }
    }
}

impl fmt::Display for ConversionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionId::Numeric(number) => write!(f, "{number}"),
            ConversionId::Text(text) => f.write_str(text),
            ConversionId::Other(Value::String(text)) => f.write_str(text),
            ConversionId::Other(value) => write!(f, "{value}"),
        }
    }
}

/// One `labelMap` entry. `conversionId` falls back to the integration-wide ID when absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelMapEntry {
    pub event_name: Value,
    pub label: Value,
    pub conversion_id: Value,
}

impl LabelMapEntry {
    pub fn new(event_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            event_name: Value::String(event_name.into()),
            label: Value::String(label.into()),
            conversion_id: Value::Null,
        }
    }

    pub fn with_conversion_id(mut self, conversion_id: impl Into<ConversionId>) -> Self {
        self.conversion_id = conversion_id.into().into();
        self
    }
}

impl From<LabelMapEntry> for Value {
    fn from(entry: LabelMapEntry) -> Self {
        let mut object = Map::new();
        object.insert("eventName".to_string(), entry.event_name);
        object.insert("label".to_string(), entry.label);
        if !entry.conversion_id.is_null() {
            object.insert("conversionId".to_string(), entry.conversion_id);
        }
        Value::Object(object)
    }
}

/// Integration options exactly as the host supplied them.
///
/// `events`, `labelMap` and `whitelist` have had several layouts and hosts get them wrong, so
/// they are kept as raw JSON. A bad entry never rejects the whole object; it is reported when
/// the options are resolved into a [`crate::adwords::ConversionRouting`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdWordsOptions {
    #[serde(default)]
    pub conversion_id: ConversionId,
    #[serde(default, deserialize_with = "deserialize_truthy")]
    pub remarketing: bool,
    /// `{eventName: label}` or `[{key, value}]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Value>,
    /// `[{eventName, label, conversionId?}]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_map: Option<Value>,
    /// `{eventName: null | conversionId | [conversionId]}` or a list of event names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<Value>,
}

impl AdWordsOptions {
    pub fn new(conversion_id: impl Into<ConversionId>) -> Self {
        Self {
            conversion_id: conversion_id.into(),
            ..Default::default()
        }
    }

    pub fn with_remarketing(mut self, enabled: bool) -> Self {
        self.remarketing = enabled;
        self
    }

    /// Binds `label` to `event_name` using the legacy `events` option.
    pub fn with_event(mut self, event_name: impl Into<String>, label: impl Into<String>) -> Self {
        let event_name = event_name.into();
        let label = Value::String(label.into());
        let events = self.events.get_or_insert_with(|| Value::Object(Map::new()));
        match events {
            Value::Object(map) => {
                map.insert(event_name, label);
            }
            Value::Array(pairs) => {
                let mut pair = Map::new();
                pair.insert("key".to_string(), Value::String(event_name));
                pair.insert("value".to_string(), label);
                pairs.push(Value::Object(pair));
            }
            other => {
                let mut map = Map::new();
                map.insert(event_name, label);
                *other = Value::Object(map);
            }
        }
        self
    }

    pub fn with_label(mut self, entry: LabelMapEntry) -> Self {
        let labels = self.label_map.get_or_insert_with(|| Value::Array(Vec::new()));
        match labels {
            Value::Array(entries) => entries.push(entry.into()),
            other => *other = Value::Array(vec![entry.into()]),
        }
        self
    }

    /// Whitelists `event_name` for standalone remarketing. An empty `conversion_ids` targets the
    /// integration-wide conversion ID.
    pub fn with_whitelisted(
        mut self,
        event_name: impl Into<String>,
        conversion_ids: Vec<ConversionId>,
    ) -> Self {
        let event_name = event_name.into();
        let value = match conversion_ids.len() {
            0 => Value::Null,
            1 => conversion_ids
                .into_iter()
                .next()
                .map(Value::from)
                .unwrap_or(Value::Null),
            _ => Value::Array(conversion_ids.into_iter().map(Value::from).collect()),
        };
        let whitelist = self.whitelist.get_or_insert_with(|| Value::Object(Map::new()));
        match whitelist {
            Value::Object(map) => {
                map.insert(event_name, value);
            }
            Value::Array(names) => names.push(Value::String(event_name)),
            other => {
                let mut map = Map::new();
                map.insert(event_name, value);
                *other = Value::Object(map);
            }
        }
        self
    }

    pub fn from_json(raw: &str) -> AdWordsResult<Self> {
        serde_json::from_str(raw)
            .map_err(|err| invalid_argument(format!("invalid AdWords options: {err}")))
    }

    pub fn from_value(value: Value) -> AdWordsResult<Self> {
        serde_json::from_value(value)
            .map_err(|err| invalid_argument(format!("invalid AdWords options: {err}")))
    }

    /// Loads options from `ADWORDS_OPTIONS` (inline JSON), then `ADWORDS_OPTIONS_PATH` (a JSON
    /// file), then, in browsers, the `__ADWORDS_OPTIONS__` global. Returns `Ok(None)` when no
    /// source is configured.
    pub fn from_env() -> AdWordsResult<Option<Self>> {
        if let Some(options) = options_from_sources(
            env::var(OPTIONS_ENV_VAR).ok(),
            env::var(OPTIONS_PATH_ENV_VAR).ok(),
        )? {
            return Ok(Some(options));
        }
        options_from_global()
    }
}

fn options_from_sources(
    inline: Option<String>,
    path: Option<String>,
) -> AdWordsResult<Option<AdWordsOptions>> {
    if let Some(raw) = inline {
        return AdWordsOptions::from_json(&raw).map(Some);
    }
    if let Some(path) = path {
        let contents = fs::read_to_string(&path).map_err(|err| {
            invalid_argument(format!("failed to read AdWords options from `{path}`: {err}"))
        })?;
        return AdWordsOptions::from_json(&contents).map(Some);
    }
    Ok(None)
}

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
fn options_from_global() -> AdWordsResult<Option<AdWordsOptions>> {
    use wasm_bindgen::JsValue;

    use crate::adwords::constants::OPTIONS_GLOBAL;

    let global = js_sys::global();
    let value = match js_sys::Reflect::get(&global, &JsValue::from_str(OPTIONS_GLOBAL)) {
        Ok(value) if !value.is_null() && !value.is_undefined() => value,
        _ => return Ok(None),
    };
    let serialized = js_sys::JSON::stringify(&value)
        .ok()
        .and_then(|text| text.as_string())
        .ok_or_else(|| invalid_argument(format!("`{OPTIONS_GLOBAL}` is not serialisable")))?;
    AdWordsOptions::from_json(&serialized).map(Some)
}

#[cfg(not(all(target_arch = "wasm32", feature = "wasm-web")))]
fn options_from_global() -> AdWordsResult<Option<AdWordsOptions>> {
    Ok(None)
}

/// Reads `remarketing` the way the host scripts do: `null`, `false`, `0` and `""` switch it off,
/// any other value switches it on.
fn deserialize_truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(flag) => flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// A configuration entry that could not be used. The entry is skipped; matching events simply
/// produce no call for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
}

impl ConfigWarning {
    pub(crate) fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
