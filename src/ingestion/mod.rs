//! Source ingestion: fingerprinting, loading, and chunking.

pub mod chunker;
pub mod hashing;
pub mod loader;

pub use chunker::TextChunker;
pub use hashing::{hash_bytes, hash_file};
pub use loader::load_documents;
