//! Event wrappers handed to the integration by the host runtime.

use serde_json::{Map, Number, Value};

use crate::adwords::constants::REVENUE_PROPERTY;

pub type Properties = Map<String, Value>;

/// A page view and the properties of the viewed page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    properties: Properties,
}

impl Page {
    pub fn new(properties: Properties) -> Self {
        Self { properties }
    }

    /// Builds a page from a JSON object. Non-object values yield an empty property bag.
    pub fn from_value(value: Value) -> Self {
        Self::new(into_properties(value))
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn path(&self) -> Option<&str> {
        self.string_property("path")
    }

    pub fn referrer(&self) -> Option<&str> {
        self.string_property("referrer")
    }

    pub fn search(&self) -> Option<&str> {
        self.string_property("search")
    }

    pub fn title(&self) -> Option<&str> {
        self.string_property("title")
    }

    pub fn url(&self) -> Option<&str> {
        self.string_property("url")
    }

    fn string_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

/// A named track event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Track {
    event: String,
    properties: Properties,
}

impl Track {
    pub fn new(event: impl Into<String>, properties: Properties) -> Self {
        Self {
            event: event.into(),
            properties,
        }
    }

    pub fn from_value(event: impl Into<String>, properties: Value) -> Self {
        Self::new(event, into_properties(properties))
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// The `revenue` property as a number.
    ///
    /// Numeric strings are accepted, with an optional leading `$` (`"$19.99"`). Anything else,
    /// including non-finite values, is treated as no revenue.
    pub fn revenue(&self) -> Option<Number> {
        match self.properties.get(REVENUE_PROPERTY)? {
            Value::Number(number) => Some(number.clone()),
            Value::String(text) => parse_revenue(text),
            _ => None,
        }
    }

    /// The property bag with `revenue` removed; used as the pixel's custom parameters.
    pub fn properties_without_revenue(&self) -> Properties {
        let mut properties = self.properties.clone();
        properties.remove(REVENUE_PROPERTY);
        properties
    }
}

fn parse_revenue(text: &str) -> Option<Number> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    if let Ok(integer) = digits.parse::<i64>() {
        return Some(Number::from(integer));
    }
    digits.parse::<f64>().ok().and_then(Number::from_f64)
}

fn into_properties(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}
