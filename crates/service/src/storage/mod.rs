//! Storage abstractions for service layer
//!
//! File-backed persistence for small JSON documents rewritten whole on
//! every change.

pub mod json_document_store;
