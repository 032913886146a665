//! Concrete field types for records declared with generic parameters and
//! forward references.
//!
//! A call walks three things at once: the arguments of a parameterized record
//! view (`Page[Entity]`), the arguments every ancestor passes to its generic
//! bases, and names that are only looked up once all records are registered.

mod binder;
mod hints;
mod walker;


pub use binder::{GenericBinder, GenericBindings};
pub use walker::TypeWalker;

use crate::language::{
    errors::{ConcretizeError, ConcretizeResult},
    record::{Field, RecordDef, RecordHandle},
    scopes::{Namespace, ScopeResolver},
    types::TypeRef,
};
use hints::HintEvaluator;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug_span, trace};

#[derive(Clone, Debug, Default)]
pub struct ResolveOptions {
    /// Names consulted before any scope, e.g. types defined inside a function.
    pub forward_references: HashMap<String, TypeRef>,
}

pub struct Concretizer<'a, N: ?Sized> {
    namespace: &'a N,
    options: ResolveOptions,
}

impl<'a, N: Namespace + ?Sized> Concretizer<'a, N> {
    pub fn new(namespace: &'a N) -> Self {
        Self::with_options(namespace, ResolveOptions::default())
    }

    pub fn with_options(namespace: &'a N, options: ResolveOptions) -> Self {
        Self { namespace, options }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    fn resolver(&self) -> ScopeResolver<'_, N> {
        ScopeResolver::new(self.namespace, &self.options.forward_references)
    }

    /// Fields of the record behind `ty`, inherited ones included.
    pub fn fields<'t>(&self, ty: &'t TypeRef) -> ConcretizeResult<Vec<&'t Field>> {
        fields(ty)
    }

    pub fn bindings(&self, ty: &TypeRef) -> ConcretizeResult<GenericBindings> {
        GenericBinder::new(self.resolver()).bind(ty)
    }

    /// Field name to concrete type, in declaration order.
    pub fn field_types(&self, ty: &TypeRef) -> ConcretizeResult<IndexMap<String, TypeRef>> {
        let record = unwrap_record(ty)?;
        let span = debug_span!("field_types", record = %record.qualified_name(), ty = %ty);
        let _guard = span.enter();

        let resolver = self.resolver();
        let bindings = GenericBinder::new(resolver).bind(ty)?;
        let walker = TypeWalker::new(resolver, &bindings);

        let mut hints = IndexMap::new();
        for (owner, field) in declared_fields(record) {
            let chain = resolver.chain_for(owner.module());
            let declared = match &field.ty {
                TypeRef::Forward(text) => {
                    HintEvaluator::new(resolver, owner, &chain, text).evaluate()?
                }
                declared => declared.clone(),
            };
            let concrete = walker.concretize(&declared, &chain)?;
            trace!(field = %field.name, declared = %field.ty, concrete = %concrete, "concretized field");
            hints.insert(field.name.clone(), concrete);
        }
        Ok(hints)
    }
}

pub fn field_types<N: Namespace + ?Sized>(
    namespace: &N,
    ty: &TypeRef,
) -> ConcretizeResult<IndexMap<String, TypeRef>> {
    Concretizer::new(namespace).field_types(ty)
}

/// Fields of the record behind `ty`. A parameterized view shares the field
/// list of its record definition.
pub fn fields(ty: &TypeRef) -> ConcretizeResult<Vec<&Field>> {
    let record = unwrap_record(ty)?;
    Ok(declared_fields(record)
        .into_iter()
        .map(|(_, field)| field)
        .collect())
}

pub fn unwrap_record(ty: &TypeRef) -> ConcretizeResult<&RecordHandle> {
    ty.record()
        .ok_or_else(|| ConcretizeError::NotARecord { found: ty.clone() })
}

// Fields are gathered in reverse method-resolution order, so a record's own
// fields override its ancestors'. A redeclared field keeps the slot of the one
// it replaces.
fn declared_fields(record: &RecordDef) -> Vec<(&RecordDef, &Field)> {
    let mut collected: Vec<(&RecordDef, &Field)> = Vec::new();
    for owner in linearize(record).into_iter().rev() {
        for field in owner.own_fields() {
            merge_field(&mut collected, owner, field);
        }
    }
    collected
}

/// C3 linearization of `record` and its record bases. Every ancestor appears
/// once, after all of its subclasses.
fn linearize(record: &RecordDef) -> Vec<&RecordDef> {
    let bases: Vec<&RecordDef> = record.record_bases().map(|(base, _)| &**base).collect();
    let mut sequences: Vec<Vec<&RecordDef>> = bases.iter().map(|&base| linearize(base)).collect();
    sequences.push(bases);

    let mut order = vec![record];
    loop {
        sequences.retain(|sequence| !sequence.is_empty());
        if sequences.is_empty() {
            return order;
        }
        let head = sequences
            .iter()
            .map(|sequence| sequence[0])
            .find(|candidate| {
                !sequences
                    .iter()
                    .any(|sequence| sequence[1..].iter().any(|tail| std::ptr::eq(*tail, *candidate)))
            });
        let Some(head) = head else {
            trace!(record = %record.qualified_name(), "no consistent base order, using depth-first order");
            return depth_first(record);
        };
        order.push(head);
        for sequence in &mut sequences {
            if std::ptr::eq(sequence[0], head) {
                sequence.remove(0);
            }
        }
    }
}

// Fallback for hierarchies C3 rejects: depth-first, left to right, keeping
// each record at its last position.
fn depth_first(record: &RecordDef) -> Vec<&RecordDef> {
    fn visit<'r>(record: &'r RecordDef, out: &mut Vec<&'r RecordDef>) {
        out.push(record);
        for (base, _) in record.record_bases() {
            visit(base, out);
        }
    }
    let mut visited = Vec::new();
    visit(record, &mut visited);
    let mut order: Vec<&RecordDef> = Vec::new();
    for (index, entry) in visited.iter().enumerate() {
        if !visited[index + 1..].iter().any(|later| std::ptr::eq(*later, *entry)) {
            order.push(*entry);
        }
    }
    order
}

fn merge_field<'r>(
    collected: &mut Vec<(&'r RecordDef, &'r Field)>,
    owner: &'r RecordDef,
    field: &'r Field,
) {
    let existing = collected
        .iter()
        .position(|(_, existing)| existing.name == field.name);
    match existing {
        Some(index) => collected[index] = (owner, field),
        None => collected.push((owner, field)),
    }
}
