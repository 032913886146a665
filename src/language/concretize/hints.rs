use crate::language::{
    errors::{ConcretizeError, ConcretizeResult},
    parser::{parse_annotation, Annotation, AnnotationKind},
    record::RecordDef,
    scopes::{Namespace, ScopeChain, ScopeResolver},
    types::{Builtin, LiteralValue, Origin, TypeRef},
};

enum Head {
    Literal,
    Optional,
    Origin(Origin),
}

/// Evaluates a field's annotation text in the scope of the record that
/// declared it. Quoted names nested in the text stay forward references.
pub(crate) struct HintEvaluator<'a, N: ?Sized> {
    resolver: ScopeResolver<'a, N>,
    owner: &'a RecordDef,
    chain: &'a ScopeChain,
    text: &'a str,
}

impl<'a, N: Namespace + ?Sized> HintEvaluator<'a, N> {
    pub(crate) fn new(
        resolver: ScopeResolver<'a, N>,
        owner: &'a RecordDef,
        chain: &'a ScopeChain,
        text: &'a str,
    ) -> Self {
        Self {
            resolver,
            owner,
            chain,
            text,
        }
    }

    pub(crate) fn evaluate(&self) -> ConcretizeResult<TypeRef> {
        let parsed = parse_annotation(self.text)?;
        self.eval(&parsed)
    }

    fn eval(&self, node: &Annotation) -> ConcretizeResult<TypeRef> {
        match &node.kind {
            AnnotationKind::Name(name) => self.name(name),
            AnnotationKind::Str(name) => Ok(TypeRef::Forward(name.clone())),
            AnnotationKind::Int(_) => Err(self.error(node, "integers are only valid inside `Literal[...]`")),
            AnnotationKind::Union(members) => Ok(TypeRef::union(self.eval_all(members)?)),
            AnnotationKind::Subscript { head, args } => match self.head(head, node)? {
                Head::Literal => {
                    let values = args
                        .iter()
                        .map(|arg| self.literal_value(arg))
                        .collect::<ConcretizeResult<Vec<_>>>()?;
                    Ok(TypeRef::Literal(values))
                }
                Head::Optional => match args.as_slice() {
                    [inner] => Ok(TypeRef::optional(self.eval(inner)?)),
                    _ => Err(self.error(node, "`Optional` takes exactly one argument")),
                },
                Head::Origin(origin) => Ok(TypeRef::apply(origin, self.eval_all(args)?)),
            },
        }
    }

    fn eval_all(&self, nodes: &[Annotation]) -> ConcretizeResult<Vec<TypeRef>> {
        nodes.iter().map(|node| self.eval(node)).collect()
    }

    fn name(&self, name: &str) -> ConcretizeResult<TypeRef> {
        if let Some(param) = self.owner.param_named(name) {
            return Ok(TypeRef::Param(param.clone()));
        }
        if let Some(found) = self.resolver.lookup(name, self.chain) {
            return Ok(found);
        }
        if let Some(builtin) = Builtin::from_name(name) {
            return Ok(TypeRef::Builtin(builtin));
        }
        if let Some(origin) = Origin::from_name(name) {
            return Ok(TypeRef::Apply {
                origin,
                args: Vec::new(),
            });
        }
        Err(self.resolver.unresolved(name, self.chain))
    }

    fn head(&self, head: &str, node: &Annotation) -> ConcretizeResult<Head> {
        if self.owner.param_named(head).is_some() {
            return Err(self.error(node, format!("type parameter `{head}` is not subscriptable")));
        }
        if let Some(found) = self.resolver.lookup(head, self.chain) {
            return match found {
                TypeRef::Record(record) if !record.params().is_empty() => {
                    Ok(Head::Origin(Origin::Record(record)))
                }
                other => Err(self.error(node, format!("`{other}` is not a generic type"))),
            };
        }
        match head {
            "Literal" => Ok(Head::Literal),
            "Optional" => Ok(Head::Optional),
            _ => Origin::from_name(head)
                .map(Head::Origin)
                .ok_or_else(|| self.resolver.unresolved(head, self.chain)),
        }
    }

    fn literal_value(&self, node: &Annotation) -> ConcretizeResult<LiteralValue> {
        match &node.kind {
            AnnotationKind::Str(value) => Ok(LiteralValue::Str(value.clone())),
            AnnotationKind::Int(value) => Ok(LiteralValue::Int(*value)),
            AnnotationKind::Name(name) if name == "True" => Ok(LiteralValue::Bool(true)),
            AnnotationKind::Name(name) if name == "False" => Ok(LiteralValue::Bool(false)),
            AnnotationKind::Name(name) if name == "None" => Ok(LiteralValue::None),
            _ => Err(self.error(
                node,
                "`Literal` accepts only str, int, bool and None values",
            )),
        }
    }

    fn error(&self, node: &Annotation, message: impl Into<String>) -> ConcretizeError {
        ConcretizeError::invalid_annotation(self.text, node.span.clone(), message)
    }
}
