use crate::language::{
    errors::ConcretizeResult,
    parser::parse_annotation,
    types::{LiteralValue, Origin, TypeParam, TypeRef},
};
use std::{
    collections::BTreeMap,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
    sync::Arc,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
    pub default: Option<LiteralValue>,
    pub metadata: BTreeMap<String, String>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            default: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Declares a field from annotation text. The text is checked for syntax
    /// now and evaluated in the declaring record's scope on first use.
    pub fn parse(name: impl Into<String>, annotation: &str) -> ConcretizeResult<Self> {
        parse_annotation(annotation)?;
        Ok(Self::new(name, TypeRef::Forward(annotation.trim().to_string())))
    }

    pub fn with_default(mut self, value: LiteralValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A record definition: named, ordered fields plus its generic declaration.
#[derive(Debug)]
pub struct RecordDef {
    name: String,
    module: String,
    params: Vec<TypeParam>,
    bases: Vec<TypeRef>,
    fields: Vec<Field>,
}

impl RecordDef {
    pub fn build(name: impl Into<String>, module: impl Into<String>) -> RecordBuilder {
        RecordBuilder {
            def: RecordDef {
                name: name.into(),
                module: module.into(),
                params: Vec::new(),
                bases: Vec::new(),
                fields: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn qualified_name(&self) -> String {
        if self.module.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.module, self.name)
        }
    }

    pub fn params(&self) -> &[TypeParam] {
        &self.params
    }

    pub fn param_named(&self, name: &str) -> Option<&TypeParam> {
        self.params.iter().find(|param| param.name() == name)
    }

    pub fn bases(&self) -> &[TypeRef] {
        &self.bases
    }

    /// Fields declared on this record itself, without inherited ones.
    pub fn own_fields(&self) -> &[Field] {
        &self.fields
    }

    /// Record bases with the arguments supplied to them. A plain record base
    /// has no arguments; the `Generic` marker and non-record bases are skipped.
    pub fn record_bases(&self) -> impl DoubleEndedIterator<Item = (&RecordHandle, &[TypeRef])> + '_ {
        self.bases.iter().filter_map(|base| match base {
            TypeRef::Record(record) => Some((record, &[] as &[TypeRef])),
            TypeRef::Apply {
                origin: Origin::Record(record),
                args,
            } => Some((record, args.as_slice())),
            _ => None,
        })
    }
}

pub struct RecordBuilder {
    def: RecordDef,
}

impl RecordBuilder {
    /// Declares the record's parameters, as `Generic[T, ...]` does.
    pub fn generic(self, params: impl IntoIterator<Item = TypeParam>) -> Self {
        let marker = TypeRef::apply(Origin::Generic, params.into_iter().map(TypeRef::Param));
        self.extends(marker)
    }

    /// Adds a base. Parameters appearing in its arguments become parameters of
    /// this record too, in order of first appearance.
    pub fn extends(mut self, base: TypeRef) -> Self {
        for param in base.params() {
            if !self.def.params.contains(&param) {
                self.def.params.push(param);
            }
        }
        self.def.bases.push(base);
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.def.fields.push(field);
        self
    }

    pub fn finish(self) -> RecordHandle {
        RecordHandle(Arc::new(self.def))
    }
}

/// Shared handle to a record definition. Equality is identity, as with
/// classes: two separately built records never compare equal.
#[derive(Clone)]
pub struct RecordHandle(Arc<RecordDef>);

impl Deref for RecordHandle {
    type Target = RecordDef;

    fn deref(&self) -> &RecordDef {
        &self.0
    }
}

impl PartialEq for RecordHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for RecordHandle {}

impl Hash for RecordHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RecordHandle")
            .field(&self.qualified_name())
            .finish()
    }
}
