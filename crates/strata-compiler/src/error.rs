//! Compilation errors.
//!
//! Every fatal condition carries enough source context (block name,
//! selector, position) for the author to locate the mistake. Compilation
//! is deterministic, so none of these are retryable.

use strata_ast::Span;
use strata_model::ModelError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// Cyclic inheritance or malformed block vocabulary.
    #[error(transparent)]
    Structural(#[from] ModelError),

    /// A debug directive or selector names a block missing from the
    /// graph.
    #[error("reference to unknown block `{reference}` at {span}")]
    Reference { reference: String, span: Span },

    /// Two rules assert incompatible values and no reordering satisfies
    /// every recorded conflict.
    #[error(
        "unresolvable conflict between `{first_selector}` at {first_span} \
         and `{second_selector}` at {second_span}"
    )]
    UnresolvableConflict {
        first_selector: String,
        first_span: Span,
        second_selector: String,
        second_span: Span,
    },
}

/// Attach a source position to a model error. Unknown references become
/// positioned reference errors; structural problems pass through.
pub(crate) fn from_model(err: ModelError, span: Span) -> CompileError {
    match err {
        ModelError::UnknownReference { reference, .. } => {
            CompileError::Reference { reference, span }
        }
        other => CompileError::Structural(other),
    }
}
