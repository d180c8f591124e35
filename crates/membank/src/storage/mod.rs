//! Storage backends: content blobs and the index document

pub mod content;
pub mod index;

pub use content::{ContentStore, FsContentStore};
pub use index::{FsIndexStore, IndexStore};
