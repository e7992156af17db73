//! Wardrobe records and the pure record assembler.
//!
//! `assemble_draft` is the one pure stage of the ingestion pipeline: it takes
//! the analyzer output, the stored image URL, the owner identity and an
//! optional embedding, and produces the draft that persistence will key with
//! a server-generated id. It performs no external calls and must not fail
//! for any well-formed analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use super::analysis::{ClothingAnalysis, ColorAnalysis, Season};

/// Assembled wardrobe record, not yet persisted (no identifier).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardrobeItemDraft {
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
    pub owner_id: String,
    pub image_url: String,
    /// Vector descriptor of the image; absent when the embedding service was
    /// unavailable. Serialized as an explicit field omission, never an empty
    /// vector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub background_removed: bool,
    pub favorite: bool,
    pub wear_count: u32,
    pub last_worn: Option<i64>,
    /// Milliseconds since epoch; equal at creation.
    pub created_at: i64,
    pub updated_at: i64,
    /// Normalized metadata block. The `gps` key is always present: a string
    /// when the analyzer reported a location, `null` otherwise.
    pub metadata: JsonValue,
}

/// Persisted wardrobe record: draft plus the server-generated identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardrobeItem {
    pub id: Uuid,
    #[serde(flatten)]
    pub draft: WardrobeItemDraft,
}

impl WardrobeItem {
    pub fn from_draft(id: Uuid, draft: WardrobeItemDraft) -> Self {
        WardrobeItem { id, draft }
    }
}

/// Normalize the free-form analyzer metadata block.
///
/// The `gps` field ends up as exactly one of two shapes: a string (passed
/// through, or the JSON serialization of a structured value) or `null` when
/// absent. All other keys pass through untouched.
pub fn normalize_item_metadata(metadata: Option<JsonValue>) -> JsonValue {
    let mut map = match metadata {
        Some(JsonValue::Object(map)) => map,
        // Non-object metadata is dropped rather than erroring; the gps
        // contract below still holds.
        _ => Map::new(),
    };

    let gps = match map.remove("gps") {
        None | Some(JsonValue::Null) => JsonValue::Null,
        Some(JsonValue::String(s)) => JsonValue::String(s),
        Some(structured) => {
            // to_string on a JsonValue cannot fail
            JsonValue::String(structured.to_string())
        }
    };
    map.insert("gps".to_string(), gps);

    JsonValue::Object(map)
}

/// Assemble a draft record from the outputs of the side-effecting stages.
pub fn assemble_draft(
    analysis: ClothingAnalysis,
    owner_id: &str,
    image_url: &str,
    embedding: Option<Vec<f32>>,
    now: DateTime<Utc>,
) -> WardrobeItemDraft {
    let timestamp = now.timestamp_millis();
    WardrobeItemDraft {
        item_type: analysis.item_type,
        sub_type: analysis.sub_type,
        name: analysis.name,
        color: analysis.color,
        season: analysis.season,
        style: analysis.style,
        occasion: analysis.occasion,
        material: analysis.material,
        pattern: analysis.pattern,
        fit: analysis.fit,
        brand: analysis.brand,
        color_analysis: analysis.color_analysis,
        owner_id: owner_id.to_string(),
        image_url: image_url.to_string(),
        embedding,
        // Background removal runs out of band; items enter the wardrobe
        // already marked processed.
        background_removed: true,
        favorite: false,
        wear_count: 0,
        last_worn: None,
        created_at: timestamp,
        updated_at: timestamp,
        metadata: normalize_item_metadata(analysis.metadata),
    }
}
