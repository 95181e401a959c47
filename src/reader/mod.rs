// file: src/reader/mod.rs
// description: Document loading module exports
// reference: Internal module structure

pub mod directory;

pub use directory::{DirectoryReader, ScannedFile};
