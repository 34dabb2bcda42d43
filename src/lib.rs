#![deny(missing_docs)]

//! Core library for the document chat server: PDF ingestion into Weaviate and persona chat.

/// HTTP routing and REST handlers.
pub mod api;
/// Conversational pipeline and language model clients.
pub mod chat;
/// Environment-driven configuration management.
pub mod config;
/// Document extraction, chunking, and batched ingestion.
pub mod ingest;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Weaviate vector store integration.
pub mod weaviate;
