//! Model-level errors.

/// Structural problems in the block graph or its selector vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// The parent chain of a block reaches itself. Reported before any
    /// resolution work runs, since ancestor walks assume termination.
    #[error("cyclic inheritance involving block `{block}`")]
    CyclicInheritance { block: String },

    /// A selector uses the block vocabulary incorrectly.
    #[error("malformed selector `{selector}` in block `{block}`: {reason}")]
    MalformedSelector {
        block: String,
        selector: String,
        reason: String,
    },

    /// An at-rule or meta declaration uses the block vocabulary
    /// incorrectly.
    #[error("malformed `{directive}` directive in block `{block}`: {reason}")]
    MalformedDirective {
        block: String,
        directive: String,
        reason: String,
    },

    /// A selector or directive names a block not present in the
    /// compiling block's reference table.
    #[error("unknown block reference `{reference}` in block `{block}`")]
    UnknownReference { block: String, reference: String },
}
