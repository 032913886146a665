use crate::language::{
    errors::{ConcretizeError, ConcretizeResult},
    record::RecordHandle,
    types::{NamedType, TypeRef},
};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Host-side namespace lookup: the set of loaded module namespaces.
pub trait Namespace {
    fn lookup(&self, scope: &str, name: &str) -> Option<TypeRef>;

    /// Scopes searched for names used inside `module`.
    fn chain_for(&self, module: &str) -> ScopeChain {
        ScopeChain::for_module(module)
    }
}

/// Dotted-path ancestry of a module, searched innermost scope first.
///
/// `app.models.page` yields `app.models.page`, `app.models`, `app`. The path
/// is stored once alongside the end offset of every prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeChain {
    path: String,
    ends: Vec<usize>,
}

impl ScopeChain {
    pub fn for_module(module: &str) -> Self {
        let mut ends: Vec<usize> = module
            .char_indices()
            .filter(|(_, ch)| *ch == '.')
            .map(|(index, _)| index)
            .collect();
        ends.push(module.len());
        Self {
            path: module.to_string(),
            ends,
        }
    }

    pub fn module(&self) -> &str {
        &self.path
    }

    pub fn innermost_first(&self) -> impl Iterator<Item = &str> + '_ {
        self.ends.iter().rev().map(move |end| &self.path[..*end])
    }

    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }
}

/// Process-wide registry of scope namespaces. Registration takes `&self` so a
/// host can keep loading modules while resolution runs on other threads.
#[derive(Default)]
pub struct NamespaceRegistry {
    scopes: RwLock<HashMap<String, HashMap<String, TypeRef>>>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, scope: impl Into<String>, name: impl Into<String>, ty: TypeRef) {
        let scope = scope.into();
        let name = name.into();
        trace!(scope = %scope, name = %name, ty = %ty, "registering type");
        self.scopes
            .write()
            .entry(scope)
            .or_default()
            .insert(name, ty);
    }

    /// Registers a record under its own name in its declaring module.
    pub fn register_record(&self, record: &RecordHandle) {
        self.register(record.module(), record.name(), TypeRef::Record(record.clone()));
    }

    pub fn register_named(&self, named: NamedType) {
        self.register(named.module.clone(), named.name.clone(), TypeRef::Named(named));
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.read().contains_key(scope)
    }
}

impl Namespace for NamespaceRegistry {
    fn lookup(&self, scope: &str, name: &str) -> Option<TypeRef> {
        self.scopes
            .read()
            .get(scope)
            .and_then(|names| names.get(name))
            .cloned()
    }
}

/// Resolves textual references against a namespace. Caller-supplied names are
/// consulted first, then each scope of the chain; the first match wins.
pub struct ScopeResolver<'a, N: ?Sized> {
    namespace: &'a N,
    extra: &'a HashMap<String, TypeRef>,
}

impl<N: ?Sized> Clone for ScopeResolver<'_, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N: ?Sized> Copy for ScopeResolver<'_, N> {}

impl<'a, N: Namespace + ?Sized> ScopeResolver<'a, N> {
    pub fn new(namespace: &'a N, extra: &'a HashMap<String, TypeRef>) -> Self {
        Self { namespace, extra }
    }

    pub fn chain_for(&self, module: &str) -> ScopeChain {
        self.namespace.chain_for(module)
    }

    pub fn lookup(&self, name: &str, chain: &ScopeChain) -> Option<TypeRef> {
        if let Some(found) = self.extra.get(name) {
            trace!(name, "resolved from forward references");
            return Some(found.clone());
        }
        chain.innermost_first().find_map(|scope| {
            let found = self.namespace.lookup(scope, name)?;
            trace!(name, scope, "resolved reference");
            Some(found)
        })
    }

    pub fn resolve(&self, name: &str, chain: &ScopeChain) -> ConcretizeResult<TypeRef> {
        self.lookup(name, chain)
            .ok_or_else(|| self.unresolved(name, chain))
    }

    pub fn unresolved(&self, name: &str, chain: &ScopeChain) -> ConcretizeError {
        debug!(name, module = chain.module(), "reference not found in any scope");
        ConcretizeError::UnresolvedReference {
            name: name.to_string(),
            scopes: chain.innermost_first().map(str::to_string).collect(),
        }
    }
}
