use crate::language::errors::{ConcretizeError, ConcretizeResult};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0},
    combinator::{all_consuming, map_res, opt, recognize},
    error::{Error, ErrorKind},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded},
    IResult,
};
use std::ops::Range;

/// Deepest subscript nesting accepted in annotation text.
pub const MAX_NESTING: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub enum AnnotationKind {
    Name(String),
    Str(String),
    Int(i64),
    Subscript { head: String, args: Vec<Annotation> },
    Union(Vec<Annotation>),
}

/// A parsed annotation node. `span` is a byte range into the annotation text.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub span: Range<usize>,
}

impl Annotation {
    // While parsing, spans hold the remaining input length at the node's start
    // and end, the only position nom's &str input carries. Convert them once
    // the total length is known.
    fn anchor(&mut self, total: usize) {
        self.span = total - self.span.start..total - self.span.end;
        match &mut self.kind {
            AnnotationKind::Subscript { args, .. } => {
                for arg in args {
                    arg.anchor(total);
                }
            }
            AnnotationKind::Union(members) => {
                for member in members {
                    member.anchor(total);
                }
            }
            _ => {}
        }
    }
}

/// Parses annotation text such as `dict[str, list['Entity']]` or `int | None`.
pub fn parse_annotation(text: &str) -> ConcretizeResult<Annotation> {
    if text.trim().is_empty() {
        return Err(ConcretizeError::invalid_annotation(
            text,
            0..text.len(),
            "empty annotation",
        ));
    }
    match all_consuming(|input| annotation(input, 0))(text) {
        Ok((_, mut parsed)) => {
            parsed.anchor(text.len());
            Ok(parsed)
        }
        Err(nom::Err::Failure(err)) if err.code == ErrorKind::TooLarge => {
            let offset = text.len() - err.input.len();
            Err(ConcretizeError::invalid_annotation(
                text,
                offset..offset,
                format!("annotation nests deeper than {MAX_NESTING} levels"),
            ))
        }
        Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => {
            let offset = text.len() - err.input.len();
            Err(unexpected(text, offset))
        }
        Err(nom::Err::Incomplete(_)) => Err(unexpected(text, text.len())),
    }
}

fn unexpected(text: &str, offset: usize) -> ConcretizeError {
    match text[offset..].chars().next() {
        Some(found) => ConcretizeError::invalid_annotation(
            text,
            offset..offset + found.len_utf8(),
            format!("unexpected `{found}`"),
        ),
        None => ConcretizeError::invalid_annotation(
            text,
            offset..offset,
            "unexpected end of annotation",
        ),
    }
}

fn node(start: &str, rest: &str, kind: AnnotationKind) -> Annotation {
    Annotation {
        kind,
        span: start.len()..rest.len(),
    }
}

fn annotation(input: &str, depth: usize) -> IResult<&str, Annotation> {
    let (input, first) = primary(input, depth)?;
    let (input, more) = many0(preceded(preceded(multispace0, char('|')), |input| {
        primary(input, depth)
    }))(input)?;
    let (input, _) = multispace0(input)?;
    if more.is_empty() {
        return Ok((input, first));
    }
    let span = first.span.start..more[more.len() - 1].span.end;
    let mut members = vec![first];
    members.extend(more);
    Ok((
        input,
        Annotation {
            kind: AnnotationKind::Union(members),
            span,
        },
    ))
}

fn primary(input: &str, depth: usize) -> IResult<&str, Annotation> {
    let (start, _) = multispace0(input)?;
    if let Ok((rest, text)) = quoted(start) {
        return Ok((rest, node(start, rest, AnnotationKind::Str(text.to_string()))));
    }
    if let Ok((rest, value)) = integer(start) {
        return Ok((rest, node(start, rest, AnnotationKind::Int(value))));
    }
    let (rest, name) = identifier(start)?;
    let (after_open, open) = opt(preceded(multispace0, char('[')))(rest)?;
    if open.is_none() {
        return Ok((rest, node(start, rest, AnnotationKind::Name(name.to_string()))));
    }
    if depth >= MAX_NESTING {
        return Err(nom::Err::Failure(Error::new(start, ErrorKind::TooLarge)));
    }
    let (input, args) = separated_list1(char(','), |input| annotation(input, depth + 1))(after_open)?;
    let (input, _) = opt(char(','))(input)?;
    let (rest, _) = preceded(multispace0, char(']'))(input)?;
    let kind = AnnotationKind::Subscript {
        head: name.to_string(),
        args,
    };
    Ok((rest, node(start, rest, kind)))
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
    ))(input)
}

fn integer(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), |digits: &str| {
        digits.parse::<i64>()
    })(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(text: &str) -> AnnotationKind {
        AnnotationKind::Name(text.to_string())
    }

    #[test]
    fn parses_nested_subscripts() {
        let parsed = parse_annotation("dict[str, list['Entity']]").expect("parse");
        let AnnotationKind::Subscript { head, args } = &parsed.kind else {
            panic!("expected subscript, got {:?}", parsed.kind);
        };
        assert_eq!(head, "dict");
        assert_eq!(args[0].kind, name("str"));
        let AnnotationKind::Subscript { head, args: inner } = &args[1].kind else {
            panic!("expected subscript, got {:?}", args[1].kind);
        };
        assert_eq!(head, "list");
        assert_eq!(inner[0].kind, AnnotationKind::Str("Entity".into()));
    }

    #[test]
    fn spans_point_into_the_source() {
        let text = "  Optional[ 'Node' ]";
        let parsed = parse_annotation(text).expect("parse");
        assert_eq!(&text[parsed.span.clone()], "Optional[ 'Node' ]");
        let AnnotationKind::Subscript { args, .. } = &parsed.kind else {
            panic!("expected subscript");
        };
        assert_eq!(&text[args[0].span.clone()], "'Node'");
    }

    #[test]
    fn pipe_builds_a_union() {
        let parsed = parse_annotation("int | None").expect("parse");
        let AnnotationKind::Union(members) = &parsed.kind else {
            panic!("expected union, got {:?}", parsed.kind);
        };
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].kind, name("None"));
        assert_eq!(parsed.span, 0..10);
    }

    #[test]
    fn literal_arguments_keep_their_values() {
        let parsed = parse_annotation("Literal[\"a\", -2, True,]").expect("parse");
        let AnnotationKind::Subscript { args, .. } = &parsed.kind else {
            panic!("expected subscript");
        };
        let kinds: Vec<_> = args.iter().map(|arg| arg.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![AnnotationKind::Str("a".into()), AnnotationKind::Int(-2), name("True")]
        );
    }

    #[test]
    fn reports_the_offending_position() {
        let err = parse_annotation("list[int").expect_err("unterminated");
        match err {
            ConcretizeError::InvalidAnnotation { span, message, .. } => {
                assert_eq!(span.offset(), 8);
                assert_eq!(message, "unexpected end of annotation");
            }
            other => panic!("unexpected error {other:?}"),
        }

        let err = parse_annotation("list[int] x").expect_err("trailing input");
        match err {
            ConcretizeError::InvalidAnnotation { span, message, .. } => {
                assert_eq!(span.offset(), 10);
                assert_eq!(message, "unexpected `x`");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn deep_nesting_is_an_error_not_a_crash() {
        let depth = 10_000;
        let text = format!("{}int{}", "list[".repeat(depth), "]".repeat(depth));
        match parse_annotation(&text).expect_err("too deep") {
            ConcretizeError::InvalidAnnotation { span, message, .. } => {
                assert_eq!(span.offset(), MAX_NESTING * "list[".len());
                assert!(message.contains("nests deeper"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }

        let allowed = format!("{}int{}", "list[".repeat(MAX_NESTING), "]".repeat(MAX_NESTING));
        assert!(parse_annotation(&allowed).is_ok());
    }

    #[test]
    fn rejects_empty_text() {
        assert!(parse_annotation("   ").is_err());
    }
}
