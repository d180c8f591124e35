//! Membank - durable note store and retrieval engine for AI coding assistants
//!
//! This crate persists short text records ("memories") tagged by category,
//! optionally scoped to a software project, and retrievable by keyword
//! search, category, or relationship traversal.

pub mod batch;
pub mod config;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod memory;
pub mod project;
pub mod repository;
pub mod search;
pub mod storage;
pub mod testing;

pub use error::MembankError;
