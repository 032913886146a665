use super::binder::GenericBindings;
use crate::language::{
    errors::ConcretizeResult,
    scopes::{Namespace, ScopeChain, ScopeResolver},
    types::TypeRef,
};

/// Rebuilds a type shape with bound parameters and forward references
/// replaced.
pub struct TypeWalker<'a, N: ?Sized> {
    resolver: ScopeResolver<'a, N>,
    bindings: &'a GenericBindings,
}

impl<'a, N: Namespace + ?Sized> TypeWalker<'a, N> {
    pub fn new(resolver: ScopeResolver<'a, N>, bindings: &'a GenericBindings) -> Self {
        Self { resolver, bindings }
    }

    pub fn concretize(&self, ty: &TypeRef, chain: &ScopeChain) -> ConcretizeResult<TypeRef> {
        match ty {
            // The resolved type is final; its own fields are not walked.
            TypeRef::Forward(name) => self.resolver.resolve(name, chain),
            // Unbound parameters stay as they are.
            TypeRef::Param(param) => Ok(self.bindings.get(param).cloned().unwrap_or_else(|| ty.clone())),
            TypeRef::Apply { origin, args } if !args.is_empty() => {
                let args = args
                    .iter()
                    .map(|arg| self.concretize(arg, chain))
                    .collect::<ConcretizeResult<Vec<_>>>()?;
                Ok(TypeRef::apply(origin.clone(), args))
            }
            TypeRef::Apply { .. }
            | TypeRef::Literal(_)
            | TypeRef::Builtin(_)
            | TypeRef::Record(_)
            | TypeRef::Named(_) => Ok(ty.clone()),
        }
    }
}
