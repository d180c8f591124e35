//! Memory entities and their on-disk representation
//!
//! Defines the Memory/IndexEntry data model, derived-field helpers,
//! TTL parsing, and the record codec external tools read.

pub mod record;
pub mod ttl;
pub mod types;

pub use record::{parse_record, record_path, serialize_record};
pub use ttl::{expiry_from_ttl, parse_ttl_days};
pub use types::{
    INDEX_VERSION, IndexEntry, Memory, MemoryIndex, Priority, dedup_preserving_order,
    derive_snippet, derive_title, now_utc, slugify,
};
