use crate::language::types::{TypeParam, TypeRef};
use miette::{Diagnostic, SourceSpan};
use std::ops::Range;
use thiserror::Error;

pub type ConcretizeResult<T> = Result<T, ConcretizeError>;

#[derive(Clone, Debug, Error, Diagnostic)]
pub enum ConcretizeError {
    #[error("could not resolve `{name}` (searched: {})", .scopes.join(", "))]
    #[diagnostic(
        code(record_hints::unresolved_reference),
        help("register the type in one of the searched scopes before resolving field types")
    )]
    UnresolvedReference { name: String, scopes: Vec<String> },

    #[error("type parameter `{param}` is bound to both `{bound}` and `{conflicting}`")]
    #[diagnostic(
        code(record_hints::generic_conflict),
        help("a type parameter receives exactly one type across the whole inheritance chain")
    )]
    GenericBindingConflict {
        param: TypeParam,
        bound: TypeRef,
        conflicting: TypeRef,
    },

    #[error("`{found}` is not a record type")]
    #[diagnostic(code(record_hints::not_a_record))]
    NotARecord { found: TypeRef },

    #[error("invalid annotation: {message}")]
    #[diagnostic(code(record_hints::annotation))]
    InvalidAnnotation {
        #[source_code]
        annotation: String,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
    },
}

impl ConcretizeError {
    pub fn invalid_annotation(
        annotation: &str,
        span: Range<usize>,
        message: impl Into<String>,
    ) -> Self {
        ConcretizeError::InvalidAnnotation {
            annotation: annotation.to_string(),
            span: (span.start, span.len()).into(),
            message: message.into(),
        }
    }
}
