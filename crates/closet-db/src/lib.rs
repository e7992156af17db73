//! Closet DB Library
//!
//! Document persistence for wardrobe records. The `WardrobeStore` trait is
//! the seam the pipeline depends on; `WardrobeRepository` is the Postgres
//! implementation, storing each record as a JSONB document keyed by a
//! server-generated identifier.

pub mod pool;
pub mod wardrobe;

pub use pool::setup_database;
pub use wardrobe::{WardrobeRepository, WardrobeStore};
