use serde::Serialize;
use serde_json::{Number, Value};

use crate::adwords::config::ConversionId;
use crate::adwords::constants::{CONVERSION_COLOR, CONVERSION_FORMAT, CONVERSION_LANGUAGE};
use crate::adwords::error::{internal_error, AdWordsResult};
use crate::adwords::facade::Properties;

/// Argument of a single `google_trackConversion` call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConversionPayload {
    #[serde(rename = "google_conversion_id")]
    pub conversion_id: ConversionId,
    #[serde(rename = "google_custom_params")]
    pub custom_params: Properties,
    #[serde(flatten)]
    pub conversion: Option<ConversionDetails>,
    #[serde(rename = "google_remarketing_only")]
    pub remarketing_only: bool,
}

/// Fields only present on a labelled conversion tag.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConversionDetails {
    #[serde(rename = "google_conversion_language")]
    pub language: String,
    #[serde(rename = "google_conversion_format")]
    pub format: String,
    #[serde(rename = "google_conversion_color")]
    pub color: String,
    #[serde(rename = "google_conversion_label")]
    pub label: String,
    #[serde(rename = "google_conversion_value")]
    pub value: Number,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
    PageView,
    Conversion,
    Remarketing,
}

impl ConversionPayload {
    /// The unlabelled tag fired for every page view.
    pub fn page_view(conversion_id: ConversionId) -> Self {
        Self {
            conversion_id,
            custom_params: Properties::new(),
            conversion: None,
            remarketing_only: false,
        }
    }

    pub fn conversion(
        conversion_id: ConversionId,
        custom_params: Properties,
        label: impl Into<String>,
        value: Number,
    ) -> Self {
        Self {
            conversion_id,
            custom_params,
            conversion: Some(ConversionDetails {
                language: CONVERSION_LANGUAGE.to_string(),
                format: CONVERSION_FORMAT.to_string(),
                color: CONVERSION_COLOR.to_string(),
                label: label.into(),
                value,
            }),
            remarketing_only: false,
        }
    }

    pub fn remarketing(conversion_id: ConversionId, custom_params: Properties) -> Self {
        Self {
            conversion_id,
            custom_params,
            conversion: None,
            remarketing_only: true,
        }
    }

    pub fn kind(&self) -> PayloadKind {
        match (&self.conversion, self.remarketing_only) {
            (Some(_), _) => PayloadKind::Conversion,
            (None, true) => PayloadKind::Remarketing,
            (None, false) => PayloadKind::PageView,
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.conversion.as_ref().map(|details| details.label.as_str())
    }

    /// The payload exactly as the pixel receives it.
    pub fn to_json(&self) -> AdWordsResult<Value> {
        serde_json::to_value(self)
            .map_err(|err| internal_error(format!("failed to serialise conversion payload: {err}")))
    }
}
