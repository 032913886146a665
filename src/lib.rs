pub mod diagnostics;
pub mod language;

pub use language::{
    concretize::{
        field_types, fields, unwrap_record, Concretizer, GenericBinder, GenericBindings,
        ResolveOptions, TypeWalker,
    },
    errors::{ConcretizeError, ConcretizeResult},
    record::{Field, RecordBuilder, RecordDef, RecordHandle},
    scopes::{Namespace, NamespaceRegistry, ScopeChain, ScopeResolver},
    types::{Builtin, LiteralValue, NamedType, Origin, TypeParam, TypeRef},
};
