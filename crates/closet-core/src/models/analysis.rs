//! Structured clothing attributes produced by the vision analyzer.
//!
//! The analyzer returns ad hoc JSON; everything here deserializes leniently.
//! Unknown fields are ignored and missing optional fields default to absent,
//! so a well-formed analysis can never fail to assemble into a record.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Season tag on a clothing item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

/// Dominant/matching color breakdown from the analyzer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorAnalysis {
    #[serde(default)]
    pub dominant: Vec<String>,
    #[serde(default)]
    pub matching: Vec<String>,
}

/// Structured analysis result for one clothing image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClothingAnalysis {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub color: String,
    #[serde(default)]
    pub season: Vec<Season>,
    #[serde(default)]
    pub style: Vec<String>,
    #[serde(default)]
    pub occasion: Vec<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub fit: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub color_analysis: Option<ColorAnalysis>,
    /// Free-form analyzer metadata. May carry a `gps` field as either a
    /// string or a structured value; normalization happens at assembly.
    #[serde(default)]
    pub metadata: Option<JsonValue>,
}
