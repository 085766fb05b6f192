//! Decides which tags fire for an event.
//!
//! [`ConversionRouting::from_options`] interprets the host options once, settling which of the
//! supported layouts is in use. Dispatch then only walks flat lists:
//! [`ConversionRouting::plan_page`] and [`ConversionRouting::plan_track`] return the payloads to
//! send, in the order they must be sent.

use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use crate::adwords::config::{AdWordsOptions, ConfigWarning, ConversionId};
use crate::adwords::facade::{Page, Properties, Track};
use crate::adwords::payload::ConversionPayload;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelRoute {
    pub event_name: String,
    pub label: String,
    pub conversion_id: Option<ConversionId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventLabel {
    pub event_name: String,
    pub label: String,
}

/// An event allowed to fire a standalone remarketing tag. No `conversion_ids` means the
/// integration-wide conversion ID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhitelistEntry {
    pub event_name: String,
    pub conversion_ids: Vec<ConversionId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteSchema {
    /// `labelMap` routes, matched ignoring case, each optionally carrying its own conversion ID.
    LabelMap {
        labels: Vec<LabelRoute>,
        whitelist: Vec<WhitelistEntry>,
    },
    /// `events` map or pairs, matched exactly, always reported under the default conversion ID.
    Legacy {
        events: Vec<EventLabel>,
        whitelist: Vec<WhitelistEntry>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionRouting {
    conversion_id: ConversionId,
    remarketing: bool,
    schema: RouteSchema,
}

impl ConversionRouting {
    /// Resolves host options. Entries that cannot be used are dropped and reported as warnings.
    pub fn from_options(options: &AdWordsOptions) -> (Self, Vec<ConfigWarning>) {
        let mut warnings = Vec::new();
        if let ConversionId::Other(value) = &options.conversion_id {
            if !value.is_null() {
                warnings.push(ConfigWarning::new(
                    "conversionId",
                    "not a string or a non-negative integer; sent to the pixel unchanged",
                ));
            }
        }
        let whitelist = resolve_whitelist(options.whitelist.as_ref(), &mut warnings);
        let label_map = match &options.label_map {
            None | Some(Value::Null) => None,
            Some(Value::Array(entries)) => Some(entries),
            Some(_) => {
                warnings.push(ConfigWarning::new(
                    "labelMap",
                    "must be a list of entries; ignored",
                ));
                None
            }
        };
        let schema = match label_map {
            Some(entries) => {
                if options.events.is_some() {
                    warnings.push(ConfigWarning::new(
                        "events",
                        "ignored because `labelMap` is configured",
                    ));
                }
                RouteSchema::LabelMap {
                    labels: resolve_label_map(entries, &mut warnings),
                    whitelist,
                }
            }
            None => RouteSchema::Legacy {
                events: resolve_events(options.events.as_ref(), &mut warnings),
                whitelist,
            },
        };

        let routing = Self {
            conversion_id: options.conversion_id.clone(),
            remarketing: options.remarketing,
            schema,
        };
        (routing, warnings)
    }

    pub fn conversion_id(&self) -> &ConversionId {
        &self.conversion_id
    }

    pub fn remarketing(&self) -> bool {
        self.remarketing
    }

    pub fn schema(&self) -> &RouteSchema {
        &self.schema
    }

    /// A page view always fires the unlabelled tag, followed by a remarketing tag carrying the
    /// page properties when remarketing is enabled.
    pub fn plan_page(&self, page: &Page) -> Vec<ConversionPayload> {
        let mut payloads = vec![ConversionPayload::page_view(self.conversion_id.clone())];
        if self.remarketing {
            payloads.push(ConversionPayload::remarketing(
                self.conversion_id.clone(),
                page.properties().clone(),
            ));
        }
        payloads
    }

    pub fn plan_track(&self, track: &Track) -> Vec<ConversionPayload> {
        let revenue = track.revenue().unwrap_or_else(|| Number::from(0));
        let params = track.properties_without_revenue();
        match &self.schema {
            RouteSchema::LabelMap { labels, whitelist } => {
                self.plan_label_map(labels, whitelist, track.event(), &params, &revenue)
            }
            RouteSchema::Legacy { events, whitelist } => {
                self.plan_legacy(events, whitelist, track.event(), &params, &revenue)
            }
        }
    }

    fn plan_label_map(
        &self,
        labels: &[LabelRoute],
        whitelist: &[WhitelistEntry],
        event: &str,
        params: &Properties,
        revenue: &Number,
    ) -> Vec<ConversionPayload> {
        let mut payloads = Vec::new();
        let mut remarketing_sent: HashMap<String, bool> = HashMap::new();

        for route in labels
            .iter()
            .filter(|route| same_event_ignoring_case(&route.event_name, event))
        {
            let id = route
                .conversion_id
                .clone()
                .unwrap_or_else(|| self.conversion_id.clone());
            payloads.push(ConversionPayload::conversion(
                id.clone(),
                params.clone(),
                route.label.clone(),
                revenue.clone(),
            ));
            if self.remarketing && !already_sent(&remarketing_sent, &id) {
                remarketing_sent.insert(id.dedup_key(), true);
                payloads.push(ConversionPayload::remarketing(id, params.clone()));
            }
        }

        for entry in whitelist
            .iter()
            .filter(|entry| same_event_ignoring_case(&entry.event_name, event))
        {
            for id in self.whitelist_targets(entry) {
                if already_sent(&remarketing_sent, &id) {
                    continue;
                }
                remarketing_sent.insert(id.dedup_key(), true);
                payloads.push(ConversionPayload::remarketing(id, params.clone()));
            }
        }

        payloads
    }

    fn plan_legacy(
        &self,
        events: &[EventLabel],
        whitelist: &[WhitelistEntry],
        event: &str,
        params: &Properties,
        revenue: &Number,
    ) -> Vec<ConversionPayload> {
        let mut payloads = Vec::new();
        let mut remarketing_sent = false;

        for bound in events.iter().filter(|bound| bound.event_name == event) {
            payloads.push(ConversionPayload::conversion(
                self.conversion_id.clone(),
                params.clone(),
                bound.label.clone(),
                revenue.clone(),
            ));
            if self.remarketing && !remarketing_sent {
                payloads.push(ConversionPayload::remarketing(
                    self.conversion_id.clone(),
                    params.clone(),
                ));
                remarketing_sent = true;
            }
        }

        if !remarketing_sent {
            if let Some(entry) = whitelist.iter().find(|entry| entry.event_name == event) {
                for id in self.whitelist_targets(entry) {
                    payloads.push(ConversionPayload::remarketing(id, params.clone()));
                }
            }
        }

        payloads
    }

    fn whitelist_targets(&self, entry: &WhitelistEntry) -> Vec<ConversionId> {
        if entry.conversion_ids.is_empty() {
            vec![self.conversion_id.clone()]
        } else {
            entry.conversion_ids.clone()
        }
    }
}

fn already_sent(sent: &HashMap<String, bool>, id: &ConversionId) -> bool {
    sent.get(&id.dedup_key()).copied().unwrap_or(false)
}

fn same_event_ignoring_case(configured: &str, event: &str) -> bool {
    configured.to_lowercase() == event.to_lowercase()
}

fn resolve_label_map(entries: &[Value], warnings: &mut Vec<ConfigWarning>) -> Vec<LabelRoute> {
    let mut routes = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let field = format!("labelMap[{index}]");
        let Value::Object(entry) = entry else {
            warnings.push(ConfigWarning::new(field, "entry must be an object"));
            continue;
        };
        if let Some(route) = resolve_label_route(&field, entry, warnings) {
            routes.push(route);
        }
    }
    routes
}

fn resolve_label_route(
    field: &str,
    entry: &Map<String, Value>,
    warnings: &mut Vec<ConfigWarning>,
) -> Option<LabelRoute> {
    let Some(event_name) = entry.get("eventName").and_then(Value::as_str) else {
        warnings.push(ConfigWarning::new(field, "`eventName` must be a string"));
        return None;
    };
    let label = match entry.get("label") {
        Some(Value::String(label)) if !label.is_empty() => label.clone(),
        None | Some(Value::Null) => {
            warnings.push(ConfigWarning::new(field, "entry has no `label`"));
            return None;
        }
        Some(_) => {
            warnings.push(ConfigWarning::new(field, "`label` must be a non-empty string"));
            return None;
        }
    };
    let conversion_id = match entry.get("conversionId") {
        None | Some(Value::Null) => None,
        Some(value) => match ConversionId::from_value(value) {
            Some(id) => Some(id),
            None => {
                warnings.push(ConfigWarning::new(
                    field,
                    "`conversionId` must be a string or a non-negative integer",
                ));
                return None;
            }
        },
    };
    Some(LabelRoute {
        event_name: event_name.to_string(),
        label,
        conversion_id,
    })
}

fn resolve_events(events: Option<&Value>, warnings: &mut Vec<ConfigWarning>) -> Vec<EventLabel> {
    let mut resolved = Vec::new();
    match events {
        None | Some(Value::Null) => {}
        Some(Value::Object(map)) => {
            for (event_name, label) in map {
                match label.as_str() {
                    Some(label) => resolved.push(EventLabel {
                        event_name: event_name.clone(),
                        label: label.to_string(),
                    }),
                    None => warnings.push(ConfigWarning::new(
                        format!("events.{event_name}"),
                        "label must be a string",
                    )),
                }
            }
        }
        Some(Value::Array(pairs)) => {
            for (index, pair) in pairs.iter().enumerate() {
                let field = format!("events[{index}]");
                let Value::Object(pair) = pair else {
                    warnings.push(ConfigWarning::new(
                        field,
                        "entry must be a `{key, value}` object",
                    ));
                    continue;
                };
                let key = pair.get("key").and_then(Value::as_str);
                let value = pair.get("value").and_then(Value::as_str);
                match (key, value) {
                    (Some(key), Some(value)) => resolved.push(EventLabel {
                        event_name: key.to_string(),
                        label: value.to_string(),
                    }),
                    (None, _) => warnings.push(ConfigWarning::new(field, "`key` must be a string")),
                    (Some(_), None) => {
                        warnings.push(ConfigWarning::new(field, "`value` must be a string"))
                    }
                }
            }
        }
        Some(_) => warnings.push(ConfigWarning::new(
            "events",
            "must be an object or a list of `{key, value}` pairs; ignored",
        )),
    }
    resolved
}

fn resolve_whitelist(
    whitelist: Option<&Value>,
    warnings: &mut Vec<ConfigWarning>,
) -> Vec<WhitelistEntry> {
    let mut resolved = Vec::new();
    match whitelist {
        None | Some(Value::Null) => {}
        Some(Value::Array(names)) => {
            for (index, name) in names.iter().enumerate() {
                match name.as_str() {
                    Some(name) => resolved.push(WhitelistEntry {
                        event_name: name.to_string(),
                        conversion_ids: Vec::new(),
                    }),
                    None => warnings.push(ConfigWarning::new(
                        format!("whitelist[{index}]"),
                        "event name must be a string",
                    )),
                }
            }
        }
        Some(Value::Object(map)) => {
            for (event_name, value) in map {
                let field = format!("whitelist.{event_name}");
                if let Some(conversion_ids) = resolve_whitelist_ids(&field, value, warnings) {
                    resolved.push(WhitelistEntry {
                        event_name: event_name.clone(),
                        conversion_ids,
                    });
                }
            }
        }
        Some(_) => warnings.push(ConfigWarning::new(
            "whitelist",
            "must be an object or a list of event names; ignored",
        )),
    }
    resolved
}

fn resolve_whitelist_ids(
    field: &str,
    value: &Value,
    warnings: &mut Vec<ConfigWarning>,
) -> Option<Vec<ConversionId>> {
    match value {
        Value::Null => Some(Vec::new()),
        Value::Array(items) => {
            let mut ids: Vec<ConversionId> = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                match ConversionId::from_value(item) {
                    Some(id) if !ids.iter().any(|seen| seen.dedup_key() == id.dedup_key()) => {
                        ids.push(id)
                    }
                    Some(_) => {}
                    None => warnings.push(ConfigWarning::new(
                        format!("{field}[{index}]"),
                        "conversion ID must be a string or a non-negative integer",
                    )),
                }
            }
            if ids.is_empty() && !items.is_empty() {
                warnings.push(ConfigWarning::new(
                    field,
                    "no usable conversion ID; entry ignored",
                ));
                return None;
            }
            Some(ids)
        }
        value => match ConversionId::from_value(value) {
            Some(id) => Some(vec![id]),
            None => {
                warnings.push(ConfigWarning::new(
                    field,
                    "conversion ID must be null, a string, a non-negative integer or a list",
                ));
                None
            }
        },
    }
}
