//! Shared error taxonomy for the maane question-answering pipeline.
//!
//! The variants mirror the failure classes the pipeline distinguishes:
//! input-stage problems short-circuit with [`RagError::Input`], retrieval
//! and generation failures are recovered internally (empty context, fixed
//! apology) and only carry their variant across the internal seam, and
//! persistence problems are logged without aborting the session.

use miette::Diagnostic;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type RagResult<T> = Result<T, RagError>;

/// Errors surfaced by the ingestion, retrieval, and generation components.
#[derive(Debug, Error, Diagnostic)]
pub enum RagError {
    /// Missing or unsupported source file, or an empty document set.
    #[error("input error: {0}")]
    #[diagnostic(
        code(maane_rag::input),
        help("Check the source file path, extension, and contents.")
    )]
    Input(String),

    /// Index build invoked with zero chunks.
    #[error("cannot build an index from zero chunks")]
    #[diagnostic(
        code(maane_rag::store::empty_input),
        help("Load documents and chunk them before building an index.")
    )]
    EmptyInput,

    /// Index search failed after both the filtered and the unfiltered attempt.
    #[error("retrieval error: {0}")]
    #[diagnostic(code(maane_rag::retrieval))]
    Retrieval(String),

    /// The chat collaborator failed while composing an answer.
    #[error("generation error: {0}")]
    #[diagnostic(code(maane_rag::generation))]
    Generation(String),

    /// Index snapshot save/load failure; the session continues in memory.
    #[error("persistence error: {0}")]
    #[diagnostic(
        code(maane_rag::persistence),
        help("The in-memory index keeps serving requests; check the store directory.")
    )]
    Persistence(String),

    /// Embedding or chat provider transport failure.
    #[error("provider error ({provider}): {message}")]
    #[diagnostic(code(maane_rag::provider))]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// Filesystem error outside the snapshot store.
    #[error(transparent)]
    #[diagnostic(code(maane_rag::io))]
    Io(#[from] std::io::Error),
}
