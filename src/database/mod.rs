// file: src/database/mod.rs
// description: persisted index storage module exports
// reference: internal module structure

pub mod client;
pub mod insert;
pub mod manifest;
pub mod schema;

pub use client::{ChunkSearch, IndexStore};
pub use insert::BatchBuilder;
pub use manifest::{IndexManifest, MANIFEST_FILE, ManifestDocument};
pub use schema::SchemaManager;
