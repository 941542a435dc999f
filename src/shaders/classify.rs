use super::error::{ReflectionError, Result};
use super::json::{DescriptorKind, ShaderVariable};
use super::lexer::Token;
use super::segments::Segment;
use super::types::ReflectionContext;
use super::variables::{block_size, parse_variable_tokens};

/// the keywords that decide what a segment declares
const STORAGE_KEYWORDS: &[&str] = &["in", "out", "uniform", "buffer", "const"];

/// memory, precision and interpolation qualifiers that may surround a storage keyword
const QUALIFIERS: &[&str] = &[
    "readonly",
    "writeonly",
    "restrict",
    "coherent",
    "volatile",
    "highp",
    "mediump",
    "lowp",
    "flat",
    "smooth",
    "noperspective",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedSegment {
    VertexInput {
        location: u32,
        glsl_type: String,
        name: String,
    },
    /// an 'in' interface block, used only for linking stages
    InputBlock { location: Option<u32>, declaration: String },
    Output { location: Option<u32>, declaration: String },
    Descriptor {
        set: u32,
        binding: u32,
        name: String,
        kind: DescriptorKind,
        /// sum of the block's field sizes; 0 for opaque descriptors
        size: u32,
        fields: Vec<ShaderVariable>,
    },
    PushConstant { fields: Vec<ShaderVariable> },
    SpecializationConstant {
        constant_id: u32,
        glsl_type: String,
        name: String,
    },
}

/// tags one layout segment by the storage keywords that follow its layout qualifier
pub fn classify(segment: &Segment<'_>, context: ReflectionContext<'_>) -> Result<ClassifiedSegment> {
    let head_len = segment
        .body
        .iter()
        .position(|t| t.is_punct('{'))
        .unwrap_or(segment.body.len());
    let head = &segment.body[..head_len];

    // storage keywords only count before the first type or block name,
    // so 'buffer In { ... }' stays a buffer
    let prefix_len = head
        .iter()
        .position(|t| !is_qualifier(t))
        .unwrap_or(head.len());
    let prefix = &head[..prefix_len];

    let keyword = |word: &str| prefix.iter().position(|t| t.is_keyword(word));

    if let Some(index) = keyword("in") {
        if segment.has_braces() {
            return Ok(ClassifiedSegment::InputBlock {
                location: segment.u32_arg("location")?,
                declaration: segment.text.to_string(),
            });
        }

        let location = segment.required_u32_arg("location")?;
        let (glsl_type, name) = type_and_name(segment, &head[index + 1..])?;

        return Ok(ClassifiedSegment::VertexInput {
            location,
            glsl_type: glsl_type.to_string(),
            name: name.to_string(),
        });
    }

    if keyword("out").is_some() {
        return Ok(ClassifiedSegment::Output {
            location: segment.u32_arg("location")?,
            declaration: segment.text.to_string(),
        });
    }

    for storage in ["buffer", "uniform"] {
        if let Some(index) = keyword(storage) {
            return classify_descriptor(segment, storage, &head[index + 1..], context);
        }
    }

    let starts_with_constant_id = segment
        .layout_args
        .first()
        .is_some_and(|arg| arg.key.eq_ignore_ascii_case("constant_id"));
    if starts_with_constant_id {
        return classify_specialization_constant(segment, head, keyword("const"));
    }

    Err(ReflectionError::UnrecognizedSegment {
        segment: segment.text.to_string(),
    })
}

fn classify_descriptor(
    segment: &Segment<'_>,
    storage: &str,
    after_keyword: &[Token<'_>],
    context: ReflectionContext<'_>,
) -> Result<ClassifiedSegment> {
    // 'buffer' blocks are never push constants
    let is_push_constant = storage == "uniform"
        && matches!(
            segment.layout_args.as_slice(),
            [arg] if arg.key.eq_ignore_ascii_case("push_constant") && arg.value.is_none()
        );

    if is_push_constant {
        let fields = block_fields(segment, context)?;
        return Ok(ClassifiedSegment::PushConstant { fields });
    }

    let set = segment.u32_arg("set")?.unwrap_or(0);
    let binding = segment.required_u32_arg("binding")?;

    if segment.has_braces() {
        let name = match after_keyword.last() {
            Some(name) if name.is_ident() => name.text,
            _ => {
                return Err(ReflectionError::malformed(
                    segment.offset,
                    "expected a block name before '{'",
                ));
            }
        };

        let fields = block_fields(segment, context)?;
        let size = block_size(&fields, segment.offset)?;
        let kind = DescriptorKind::from_block_keyword(storage).ok_or_else(|| {
            ReflectionError::malformed(segment.offset, format!("'{storage}' is not a block keyword"))
        })?;

        return Ok(ClassifiedSegment::Descriptor {
            set,
            binding,
            name: name.to_string(),
            kind,
            size,
            fields,
        });
    }

    let (glsl_type, name) = type_and_name(segment, after_keyword)?;
    let kind = context.opaque(glsl_type)?;

    Ok(ClassifiedSegment::Descriptor {
        set,
        binding,
        name: name.to_string(),
        kind,
        size: 0,
        fields: vec![],
    })
}

fn classify_specialization_constant(
    segment: &Segment<'_>,
    head: &[Token<'_>],
    const_index: Option<usize>,
) -> Result<ClassifiedSegment> {
    let constant_id = segment.required_u32_arg("constant_id")?;

    let Some(index) = const_index else {
        return Err(ReflectionError::malformed(
            segment.offset,
            "specialization constant without 'const'",
        ));
    };

    // everything from '=' on is the default value
    let declaration = &head[index + 1..];
    let declaration_len = declaration
        .iter()
        .position(|t| t.is_punct('='))
        .unwrap_or(declaration.len());
    let (glsl_type, name) = type_and_name(segment, &declaration[..declaration_len])?;

    Ok(ClassifiedSegment::SpecializationConstant {
        constant_id,
        glsl_type: glsl_type.to_string(),
        name: name.to_string(),
    })
}

/// '<qualifiers> <type> <name>' with nothing after the name
fn type_and_name<'src>(segment: &Segment<'_>, tokens: &[Token<'src>]) -> Result<(&'src str, &'src str)> {
    let tokens: Vec<_> = tokens
        .iter()
        .skip_while(|t| QUALIFIERS.iter().any(|q| t.is_keyword(q)))
        .collect();

    match tokens.as_slice() {
        [glsl_type, name] if glsl_type.is_ident() && name.is_ident() => {
            Ok((glsl_type.text, name.text))
        }
        [_, _, unexpected, ..] => Err(ReflectionError::malformed(
            unexpected.offset,
            format!("unexpected '{}' after declaration name", unexpected.text),
        )),
        _ => Err(ReflectionError::malformed(
            segment.offset,
            "expected a type and a name",
        )),
    }
}

fn is_qualifier(token: &Token<'_>) -> bool {
    STORAGE_KEYWORDS
        .iter()
        .chain(QUALIFIERS)
        .any(|keyword| token.is_keyword(keyword))
}

/// members between the outermost braces of a block segment
fn block_fields(segment: &Segment<'_>, context: ReflectionContext<'_>) -> Result<Vec<ShaderVariable>> {
    let body = segment.body;
    let open = body.iter().position(|t| t.is_punct('{'));
    let close = body.iter().rposition(|t| t.is_punct('}'));

    match (open, close) {
        (Some(open), Some(close)) if open < close => {
            parse_variable_tokens(&body[open + 1..close], context)
        }
        _ => Err(ReflectionError::malformed(
            segment.offset,
            "block without a '{ ... }' member list",
        )),
    }
}
