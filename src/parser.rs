//! Defensive decoding of model output into detection records
//!
//! Models return loosely structured JSON: sometimes a bare array, sometimes an
//! object wrapping the array, occasionally wrapped in a markdown fence or not
//! JSON at all. [`ResultParser::parse`] never fails; anything it cannot make
//! sense of degrades to an empty list and a logged [`ParseFailure`].
//!
//! Missing fields are modelled explicitly by [`RawDetection`], whose `Option`
//! fields are resolved against per-provider [`ParserConventions`]:
//!
//! | field | when absent |
//! |---|---|
//! | `type` | `"unknown"` |
//! | `label` | `ParserConventions::default_label` |
//! | `confidence` | `ParserConventions::default_confidence` |
//! | `xmin`, `ymin` | `0` |
//! | `xmax`, `ymax` | the resolved `xmin` / `ymin` (zero-area on that axis) |

use crate::mapping::to_pixel_box;
use crate::types::{BoundingBoxNormalized, ComponentDetection, ComponentType};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Object keys checked, in order, for a wrapped detection array
pub const WRAPPER_KEYS: &[&str] = &["items", "components", "elements", "results", "detections", "data"];

/// Keys of a detection record; a fallback array must carry at least one
const DETECTION_KEYS: &[&str] = &["type", "label", "confidence", "xmin", "ymin", "xmax", "ymax"];

/// Longest excerpt of a bad payload kept for diagnostics
const SNIPPET_LEN: usize = 200;

/// Provider-specific default substitution rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParserConventions {
    /// Prefix used in detection ids
    pub provider_name: &'static str,
    /// Label used when a record has none
    pub default_label: &'static str,
    /// Confidence used when a record has none
    pub default_confidence: f64,
}

impl ParserConventions {
    #[must_use]
    pub const fn new(provider_name: &'static str, default_label: &'static str, default_confidence: f64) -> Self {
        Self {
            provider_name,
            default_label,
            default_confidence,
        }
    }
}

/// Model output could not be decoded as JSON
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to decode model output: {reason} (payload starts with {snippet:?})")]
pub struct ParseFailure {
    pub reason: String,
    pub snippet: String,
}

impl ParseFailure {
    fn new(reason: impl Into<String>, raw: &str) -> Self {
        Self {
            reason: reason.into(),
            snippet: raw.chars().take(SNIPPET_LEN).collect(),
        }
    }
}

/// One record as the model reported it, every field optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDetection {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub component_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub xmin: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ymin: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub xmax: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ymax: Option<f64>,
}

impl RawDetection {
    /// Apply the default substitution rules
    #[must_use]
    pub fn resolve(self, index: usize, timestamp: i64, conventions: &ParserConventions) -> ParsedDetection {
        let xmin = self.xmin.unwrap_or(0.0);
        let ymin = self.ymin.unwrap_or(0.0);
        let component_type = self
            .component_type
            .map_or(ComponentType::Unknown, ComponentType::from);
        if !component_type.is_known() {
            debug!(index, component_type = %component_type, "Passing through unrecognized component type");
        }

        ParsedDetection {
            id: format!("{}-{}-{}", conventions.provider_name, index, timestamp),
            component_type,
            label: self
                .label
                .unwrap_or_else(|| conventions.default_label.to_string()),
            confidence: self.confidence.unwrap_or(conventions.default_confidence),
            bbox: BoundingBoxNormalized {
                xmin,
                ymin,
                xmax: self.xmax.unwrap_or(xmin),
                ymax: self.ymax.unwrap_or(ymin),
            },
        }
    }
}

/// A resolved record still on the normalized grid
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDetection {
    pub id: String,
    pub component_type: ComponentType,
    pub label: String,
    pub confidence: f64,
    pub bbox: BoundingBoxNormalized,
}

impl ParsedDetection {
    /// Convert to pixel space for an image of the given size
    #[must_use]
    pub fn into_component(self, img_width: u32, img_height: u32) -> ComponentDetection {
        ComponentDetection {
            bbox: to_pixel_box(&self.bbox, img_width, img_height),
            id: self.id,
            component_type: self.component_type,
            label: self.label,
            confidence: self.confidence,
        }
    }
}

/// Parser bound to one provider's conventions
#[derive(Debug, Clone, Copy)]
pub struct ResultParser {
    conventions: ParserConventions,
}

impl ResultParser {
    #[must_use]
    pub const fn new(conventions: ParserConventions) -> Self {
        Self { conventions }
    }

    #[must_use]
    pub fn conventions(&self) -> &ParserConventions {
        &self.conventions
    }

    /// Parse a raw payload, stamping ids with the current unix time
    #[must_use]
    pub fn parse(&self, raw: &str) -> Vec<ParsedDetection> {
        self.parse_at(raw, chrono::Utc::now().timestamp())
    }

    /// Parse a raw payload with an explicit id timestamp
    #[must_use]
    pub fn parse_at(&self, raw: &str, timestamp: i64) -> Vec<ParsedDetection> {
        let records = match Self::decode_sequence(raw) {
            Ok(records) => records,
            Err(failure) => {
                error!(
                    provider = self.conventions.provider_name,
                    reason = %failure.reason,
                    snippet = %failure.snippet,
                    "Model output is not valid JSON, returning no detections"
                );
                return Vec::new();
            },
        };

        records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| {
                if !record.is_object() {
                    warn!(
                        provider = self.conventions.provider_name,
                        index,
                        "Skipping non-object detection record"
                    );
                    return None;
                }
                match serde_json::from_value::<RawDetection>(record) {
                    Ok(raw) => Some(raw.resolve(index, timestamp, &self.conventions)),
                    Err(e) => {
                        warn!(
                            provider = self.conventions.provider_name,
                            index,
                            error = %e,
                            "Skipping undecodable detection record"
                        );
                        None
                    },
                }
            })
            .collect()
    }

    /// Decode a payload into the sequence of generic records it carries
    ///
    /// A bare array is returned as-is. An object is unwrapped through
    /// [`WRAPPER_KEYS`] first, then through its first array field holding at
    /// least one detection-shaped record. Any other valid JSON shape yields
    /// an empty sequence.
    ///
    /// # Errors
    /// - Payload is not valid JSON
    pub fn decode_sequence(raw: &str) -> Result<Vec<Value>, ParseFailure> {
        let body = strip_code_fence(raw);
        let value: Value =
            serde_json::from_str(body).map_err(|e| ParseFailure::new(e.to_string(), raw))?;

        Ok(match value {
            Value::Array(items) => items,
            Value::Object(mut map) => {
                let key = WRAPPER_KEYS
                    .iter()
                    .find(|key| map.get(**key).is_some_and(Value::is_array))
                    .map(|key| (*key).to_string())
                    .or_else(|| {
                        let key = map
                            .iter()
                            .find(|(_, value)| value.as_array().is_some_and(|items| holds_detections(items)))
                            .map(|(key, _)| key.clone());
                        if let Some(key) = &key {
                            warn!(key = %key, "Model output wraps detections under an unexpected key");
                        }
                        key
                    });
                match key.and_then(|key| map.remove(&key)) {
                    Some(Value::Array(items)) => items,
                    _ => {
                        warn!("Model output object carries no detection array");
                        Vec::new()
                    },
                }
            },
            other => {
                warn!(kind = json_kind(&other), "Model output is neither an array nor an object");
                Vec::new()
            },
        })
    }
}

/// Whether any entry of `items` is an object with a detection key
fn holds_detections(items: &[Value]) -> bool {
    items.iter().any(|item| {
        item.as_object()
            .is_some_and(|record| DETECTION_KEYS.iter().any(|key| record.contains_key(*key)))
    })
}

/// Strip a surrounding markdown code fence, if any
///
/// Handles both the multi-line form and a fence kept on a single line.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some((inner, _)) = rest.rsplit_once("```") else {
        return text;
    };
    // Info string ("json") directly after the opening fence
    inner
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric())
        .trim()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}
