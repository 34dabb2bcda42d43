//! Weaviate vector store integration.

pub mod client;
pub mod iterator;
pub mod types;

pub use client::{WeaviateService, chunk_object_id};
pub use types::{StoredObject, WeaviateError, WeaviateSettings};
