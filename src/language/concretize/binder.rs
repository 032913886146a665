use super::walker::TypeWalker;
use crate::language::{
    errors::{ConcretizeError, ConcretizeResult},
    record::RecordDef,
    scopes::{Namespace, ScopeChain, ScopeResolver},
    types::{Origin, TypeParam, TypeRef},
};
use std::collections::HashMap;
use tracing::trace;

/// Parameter bindings discovered for one resolution call.
pub type GenericBindings = HashMap<TypeParam, TypeRef>;

/// Collects the concrete type bound to each parameter reachable from a record
/// type: the arguments of a parameterized view, then the arguments every
/// ancestor passes to its generic bases.
pub struct GenericBinder<'a, N: ?Sized> {
    resolver: ScopeResolver<'a, N>,
    bindings: GenericBindings,
}

impl<'a, N: Namespace + ?Sized> GenericBinder<'a, N> {
    pub fn new(resolver: ScopeResolver<'a, N>) -> Self {
        Self {
            resolver,
            bindings: GenericBindings::new(),
        }
    }

    pub fn bind(mut self, ty: &TypeRef) -> ConcretizeResult<GenericBindings> {
        let record = match ty {
            TypeRef::Apply {
                origin: Origin::Record(record),
                args,
            } => {
                let chain = self.resolver.chain_for(record.module());
                self.add_generics(record, args, &chain)?;
                record
            }
            TypeRef::Record(record) => record,
            other => {
                return Err(ConcretizeError::NotARecord {
                    found: other.clone(),
                })
            }
        };
        self.bind_bases(record)?;
        Ok(self.bindings)
    }

    fn bind_bases(&mut self, record: &RecordDef) -> ConcretizeResult<()> {
        let chain = self.resolver.chain_for(record.module());
        for (base, args) in record.record_bases() {
            self.add_generics(base, args, &chain)?;
            self.bind_bases(base)?;
        }
        Ok(())
    }

    fn add_generics(
        &mut self,
        origin: &RecordDef,
        args: &[TypeRef],
        chain: &ScopeChain,
    ) -> ConcretizeResult<()> {
        for (param, arg) in origin.params().iter().zip(args) {
            // Arguments may name parameters bound further out, or types by name.
            let arg = TypeWalker::new(self.resolver, &self.bindings).concretize(arg, chain)?;
            if matches!(&arg, TypeRef::Param(same) if same == param) {
                continue;
            }
            match self.bindings.get(param) {
                Some(bound) if *bound != arg => {
                    return Err(ConcretizeError::GenericBindingConflict {
                        param: param.clone(),
                        bound: bound.clone(),
                        conflicting: arg,
                    });
                }
                Some(_) => {}
                None => {
                    trace!(record = origin.name(), param = %param, bound = %arg, "bound type parameter");
                    self.bindings.insert(param.clone(), arg);
                }
            }
        }
        Ok(())
    }
}
