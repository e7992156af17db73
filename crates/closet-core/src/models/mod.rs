//! Domain models for the wardrobe ingestion pipeline.

pub mod analysis;
pub mod wardrobe;

pub use analysis::{ClothingAnalysis, ColorAnalysis, Season};
pub use wardrobe::{assemble_draft, normalize_item_metadata, WardrobeItem, WardrobeItemDraft};
