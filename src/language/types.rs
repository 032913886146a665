use crate::language::record::RecordHandle;
use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    Int,
    Float,
    Str,
    Bool,
    Bytes,
    NoneType,
    Any,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        let builtin = match name {
            "int" => Builtin::Int,
            "float" => Builtin::Float,
            "str" => Builtin::Str,
            "bool" => Builtin::Bool,
            "bytes" => Builtin::Bytes,
            "None" | "NoneType" => Builtin::NoneType,
            "Any" => Builtin::Any,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Str => "str",
            Builtin::Bool => "bool",
            Builtin::Bytes => "bytes",
            Builtin::NoneType => "None",
            Builtin::Any => "Any",
        }
    }
}

static NEXT_PARAM_ID: AtomicU64 = AtomicU64::new(0);

/// An unbound generic slot. Identity is the allocation, not the name: two
/// parameters both called `T` never compare equal.
#[derive(Clone)]
pub struct TypeParam {
    id: u64,
    name: Arc<str>,
}

impl TypeParam {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for TypeParam {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeParam {}

impl Hash for TypeParam {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "~{}#{}", self.name, self.id)
    }
}

impl fmt::Display for TypeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A host type the core treats as an opaque leaf, such as an enum class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NamedType {
    pub module: String,
    pub name: String,
}

impl NamedType {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LiteralValue {
    Int(i64),
    Str(String),
    Bool(bool),
    None,
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(value) => write!(f, "{value}"),
            LiteralValue::Str(value) => write!(f, "'{value}'"),
            LiteralValue::Bool(true) => f.write_str("True"),
            LiteralValue::Bool(false) => f.write_str("False"),
            LiteralValue::None => f.write_str("None"),
        }
    }
}

/// Constructor of a composite shape. An origin is always a known type; there
/// is no forward variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    List,
    Dict,
    Set,
    FrozenSet,
    Tuple,
    Union,
    /// `Generic[T, ...]`, the marker a record uses to declare its parameters.
    Generic,
    Record(RecordHandle),
}

impl Origin {
    pub fn from_name(name: &str) -> Option<Self> {
        let origin = match name {
            "list" | "List" => Origin::List,
            "dict" | "Dict" => Origin::Dict,
            "set" | "Set" => Origin::Set,
            "frozenset" | "FrozenSet" => Origin::FrozenSet,
            "tuple" | "Tuple" => Origin::Tuple,
            "Union" => Origin::Union,
            "Generic" => Origin::Generic,
            _ => return None,
        };
        Some(origin)
    }

    pub fn name(&self) -> &str {
        match self {
            Origin::List => "list",
            Origin::Dict => "dict",
            Origin::Set => "set",
            Origin::FrozenSet => "frozenset",
            Origin::Tuple => "tuple",
            Origin::Union => "Union",
            Origin::Generic => "Generic",
            Origin::Record(record) => record.name(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeRef {
    Builtin(Builtin),
    Record(RecordHandle),
    Named(NamedType),
    /// A type given by name, looked up once every type is registered.
    Forward(String),
    Param(TypeParam),
    Apply {
        origin: Origin,
        args: Vec<TypeRef>,
    },
    /// Fixed value set. The arguments are values, never types.
    Literal(Vec<LiteralValue>),
}

impl TypeRef {
    pub fn forward(name: impl Into<String>) -> Self {
        TypeRef::Forward(name.into())
    }

    pub fn apply(origin: Origin, args: impl IntoIterator<Item = TypeRef>) -> Self {
        if origin == Origin::Union {
            return Self::union(args);
        }
        TypeRef::Apply {
            origin,
            args: args.into_iter().collect(),
        }
    }

    pub fn list(item: TypeRef) -> Self {
        Self::apply(Origin::List, [item])
    }

    pub fn dict(key: TypeRef, value: TypeRef) -> Self {
        Self::apply(Origin::Dict, [key, value])
    }

    /// Nested unions are flattened and repeated members dropped. A union left
    /// with a single member is that member.
    pub fn union(members: impl IntoIterator<Item = TypeRef>) -> Self {
        let mut flat: Vec<TypeRef> = Vec::new();
        for member in members {
            let nested = match member {
                TypeRef::Apply {
                    origin: Origin::Union,
                    args,
                } => args,
                other => vec![other],
            };
            for ty in nested {
                if !flat.contains(&ty) {
                    flat.push(ty);
                }
            }
        }
        if flat.len() == 1 {
            if let Some(only) = flat.pop() {
                return only;
            }
        }
        TypeRef::Apply {
            origin: Origin::Union,
            args: flat,
        }
    }

    pub fn optional(inner: TypeRef) -> Self {
        Self::union([inner, TypeRef::Builtin(Builtin::NoneType)])
    }

    /// A parameterized view of a generic record, e.g. `Page[Entity]`.
    pub fn generic(record: &RecordHandle, args: impl IntoIterator<Item = TypeRef>) -> Self {
        Self::apply(Origin::Record(record.clone()), args)
    }

    /// The record definition behind a record or a parameterized record view.
    pub fn record(&self) -> Option<&RecordHandle> {
        match self {
            TypeRef::Record(record)
            | TypeRef::Apply {
                origin: Origin::Record(record),
                ..
            } => Some(record),
            _ => None,
        }
    }

    /// Parameters occurring anywhere in the shape, first occurrence first.
    pub fn params(&self) -> Vec<TypeParam> {
        let mut found = Vec::new();
        self.collect_params(&mut found);
        found
    }

    fn collect_params(&self, found: &mut Vec<TypeParam>) {
        match self {
            TypeRef::Param(param) => {
                if !found.contains(param) {
                    found.push(param.clone());
                }
            }
            TypeRef::Apply { args, .. } => {
                for arg in args {
                    arg.collect_params(found);
                }
            }
            _ => {}
        }
    }

    /// True when no forward reference or type parameter is left in the shape.
    pub fn is_concrete(&self) -> bool {
        match self {
            TypeRef::Forward(_) | TypeRef::Param(_) => false,
            TypeRef::Apply { args, .. } => args.iter().all(TypeRef::is_concrete),
            _ => true,
        }
    }

    pub fn canonical_name(&self) -> String {
        match self {
            TypeRef::Builtin(builtin) => builtin.name().into(),
            TypeRef::Record(record) => record.name().into(),
            TypeRef::Named(named) => named.name.clone(),
            TypeRef::Forward(name) => format!("'{}'", name),
            TypeRef::Param(param) => param.name().into(),
            TypeRef::Apply { origin, args } => {
                if args.is_empty() {
                    origin.name().into()
                } else {
                    let rendered: Vec<String> = args.iter().map(|ty| ty.canonical_name()).collect();
                    format!("{}[{}]", origin.name(), rendered.join(", "))
                }
            }
            TypeRef::Literal(values) => {
                let rendered: Vec<String> = values.iter().map(|value| value.to_string()).collect();
                format!("Literal[{}]", rendered.join(", "))
            }
        }
    }
}

impl From<Builtin> for TypeRef {
    fn from(builtin: Builtin) -> Self {
        TypeRef::Builtin(builtin)
    }
}

impl From<RecordHandle> for TypeRef {
    fn from(record: RecordHandle) -> Self {
        TypeRef::Record(record)
    }
}

impl From<TypeParam> for TypeRef {
    fn from(param: TypeParam) -> Self {
        TypeRef::Param(param)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unions_flatten_and_drop_repeats() {
        let int = TypeRef::Builtin(Builtin::Int);
        let none = TypeRef::Builtin(Builtin::NoneType);
        let nested = TypeRef::optional(TypeRef::union([int.clone(), none.clone()]));
        assert_eq!(nested, TypeRef::optional(int.clone()));
        assert_eq!(nested.canonical_name(), "Union[int, None]");
        assert_eq!(TypeRef::union([int.clone(), int.clone()]), int);
        assert_eq!(TypeRef::optional(none.clone()), none);
        assert_eq!(
            TypeRef::apply(Origin::Union, [int.clone(), TypeRef::union([none.clone(), int])]),
            TypeRef::optional(TypeRef::Builtin(Builtin::Int))
        );
    }

    #[test]
    fn params_with_the_same_name_are_distinct() {
        let first = TypeParam::new("T");
        let second = TypeParam::new("T");
        assert_ne!(first, second);
        assert_eq!(first, first.clone());
    }

    #[test]
    fn canonical_name_uses_annotation_syntax() {
        let t = TypeParam::new("T");
        let ty = TypeRef::dict(
            Builtin::Str.into(),
            TypeRef::optional(TypeRef::list(TypeRef::Param(t))),
        );
        assert_eq!(ty.canonical_name(), "dict[str, Union[list[T], None]]");

        let literal = TypeRef::Literal(vec![
            LiteralValue::Str("a".into()),
            LiteralValue::Int(1),
            LiteralValue::Bool(false),
        ]);
        assert_eq!(literal.to_string(), "Literal['a', 1, False]");
        assert_eq!(TypeRef::forward("Node").to_string(), "'Node'");
    }

    #[test]
    fn params_are_collected_once_in_order() {
        let k = TypeParam::new("K");
        let v = TypeParam::new("V");
        let ty = TypeRef::dict(
            TypeRef::Param(k.clone()),
            TypeRef::list(TypeRef::dict(TypeRef::Param(v.clone()), TypeRef::Param(k.clone()))),
        );
        assert_eq!(ty.params(), vec![k, v]);
        assert!(!ty.is_concrete());
        assert!(TypeRef::list(Builtin::Int.into()).is_concrete());
    }
}
