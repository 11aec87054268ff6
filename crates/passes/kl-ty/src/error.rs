//! Error types for source type translation

use kl_span::FileSpan;

/// Errors raised while translating source types to IR types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// The source type has no IR translation
    #[error("type `{name}` cannot be lowered")]
    Unsupported {
        /// Printed source type
        name: String,
        /// Where the type was written, when known
        span: Option<FileSpan>,
    },

    /// A parameter declared as `void`
    #[error("parameter `{param}` cannot have type `void`")]
    VoidParameter {
        /// Parameter name
        param: String,
        /// Parameter location
        span: FileSpan,
    },
}

impl TypeError {
    /// Source location, when the error has one
    pub fn span(&self) -> Option<FileSpan> {
        match self {
            Self::Unsupported { span, .. } => *span,
            Self::VoidParameter { span, .. } => Some(*span),
        }
    }
}
