use super::error::{ReflectionError, Result};
use super::json::{ArrayLength, ShaderVariable};
use super::lexer::{Token, TokenKind, tokenize};
use super::types::ReflectionContext;

/// parses the ';'-separated members of a block body, e.g. "mat4 model; vec4 tint;"
///
/// offsets are a running sum of the preceding sizes in declaration order.
/// no std140/std430 alignment padding is inserted: the existing shader binaries
/// were built against this sequential packing, so it is kept byte for byte.
pub fn parse_variables(fields: &str, context: ReflectionContext<'_>) -> Result<Vec<ShaderVariable>> {
    let tokens = tokenize(fields);
    parse_variable_tokens(&tokens, context)
}

pub(crate) fn parse_variable_tokens(
    tokens: &[Token<'_>],
    context: ReflectionContext<'_>,
) -> Result<Vec<ShaderVariable>> {
    let mut variables = vec![];
    let mut offset = 0;

    // empty fields are trailing ';' artifacts
    for field in tokens.split(|t| t.is_punct(';')).filter(|f| !f.is_empty()) {
        let (glsl_type, name, array_length) = split_field(field)?;

        let element_size = context.size_of(glsl_type)?;
        let size = match array_length {
            Some(ArrayLength::Fixed(count)) => element_size.checked_mul(count),
            // runtime-sized arrays are sized as a single element
            Some(ArrayLength::Runtime) | None => Some(element_size),
        };
        let too_large = || {
            ReflectionError::malformed(
                field[0].offset,
                format!("field '{name}' does not fit in a block"),
            )
        };
        let size = size.ok_or_else(too_large)?;

        variables.push(ShaderVariable {
            name: name.to_string(),
            glsl_type: glsl_type.to_string(),
            size,
            offset,
            array_length,
        });

        offset = offset.checked_add(size).ok_or_else(too_large)?;
    }

    Ok(variables)
}

/// byte size of a member list; `at` locates the block for the overflow error
pub fn block_size(fields: &[ShaderVariable], at: usize) -> Result<u32> {
    fields
        .iter()
        .try_fold(0u32, |total, field| total.checked_add(field.size))
        .ok_or_else(|| ReflectionError::malformed(at, "block is larger than u32::MAX bytes"))
}

fn split_field<'src>(field: &[Token<'src>]) -> Result<(&'src str, &'src str, Option<ArrayLength>)> {
    let (glsl_type, name, rest) = match field {
        [glsl_type, name, rest @ ..] if glsl_type.is_ident() && name.is_ident() => {
            (glsl_type.text, name.text, rest)
        }
        [first, ..] => {
            return Err(ReflectionError::malformed(
                first.offset,
                "expected a type and a name",
            ));
        }
        [] => unreachable!("empty fields are filtered"),
    };

    let array_length = match rest {
        [] => None,

        [open, close] if open.is_punct('[') && close.is_punct(']') => Some(ArrayLength::Runtime),

        [open, count, close] if open.is_punct('[') && close.is_punct(']') => {
            let count = parse_count(count)?;
            Some(ArrayLength::Fixed(count))
        }

        [unexpected, ..] => {
            return Err(ReflectionError::malformed(
                unexpected.offset,
                format!("unexpected '{}' after field '{name}'", unexpected.text),
            ));
        }
    };

    Ok((glsl_type, name, array_length))
}

fn parse_count(token: &Token<'_>) -> Result<u32> {
    let count = match token.kind {
        TokenKind::Number => token.text.parse().ok(),
        _ => None,
    };

    count.ok_or_else(|| {
        ReflectionError::malformed(
            token.offset,
            format!("array length must be an integer literal, got '{}'", token.text),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::shaders::types::{StructLayout, StructRegistry, TypeTable};

    fn parse(fields: &str) -> Result<Vec<ShaderVariable>> {
        let table = TypeTable::glsl();
        let structs = StructRegistry::new();
        parse_variables(fields, ReflectionContext::new(&table, &structs))
    }

    #[test]
    fn sequential_offsets() {
        let variables = parse("mat4 model;\n  vec3   lightDir;\n float intensity;\n vec4 tint;").unwrap();

        let summary: Vec<_> = variables
            .iter()
            .map(|v| (v.name.as_str(), v.glsl_type.as_str(), v.size, v.offset))
            .collect();
        assert_eq!(
            summary,
            [
                ("model", "mat4", 64, 0),
                ("lightDir", "vec3", 12, 64),
                ("intensity", "float", 4, 76),
                ("tint", "vec4", 16, 80),
            ]
        );
    }

    #[test]
    fn offsets_are_contiguous() {
        let variables = parse("float a; vec3 b; mat3 c; vec2 d; int e; mat4 f; uint g;").unwrap();

        for pair in variables.windows(2) {
            assert_eq!(pair[0].offset + pair[0].size, pair[1].offset);
        }
    }

    #[test]
    fn no_std140_padding() {
        // std140 would place 'b' at 16
        let variables = parse("float a; vec4 b;").unwrap();
        assert_eq!(variables[1].offset, 4);
    }

    #[test]
    fn empty_fields_are_dropped() {
        let variables = parse(";; vec4 a;;  ; vec2 b ;").unwrap();
        assert_eq!(variables.len(), 2);
        assert_eq!(variables[1].offset, 16);
    }

    #[test]
    fn missing_trailing_semicolon() {
        let variables = parse("vec4 a; float b").unwrap();
        assert_eq!(variables.len(), 2);
    }

    #[test]
    fn arrays() {
        let variables = parse("vec4 lights[4]; float weights[ ]; int count;").unwrap();

        assert_eq!(variables[0].size, 64);
        assert_eq!(variables[0].array_length, Some(ArrayLength::Fixed(4)));
        assert_eq!(variables[1].size, 4);
        assert_eq!(variables[1].array_length, Some(ArrayLength::Runtime));
        assert_eq!(variables[2].offset, 68);
    }

    #[test]
    fn unknown_type() {
        let err = parse("vec4 a; dvec4 b;").unwrap_err();
        assert!(matches!(err, ReflectionError::UnknownType { type_name } if type_name == "dvec4"));
    }

    #[test]
    fn struct_members_use_the_registry() {
        let table = TypeTable::glsl();
        let mut structs = StructRegistry::new();
        structs.insert("Light", StructLayout::sized(48));
        let context = ReflectionContext::new(&table, &structs);

        let variables = parse_variables("Light sun; vec4 ambient;", context).unwrap();
        assert_eq!(variables[0].size, 48);
        assert_eq!(variables[1].offset, 48);
    }

    #[test]
    fn symbolic_array_length_is_rejected() {
        let err = parse("vec4 lights[MAX_LIGHTS];").unwrap_err();
        assert!(matches!(err, ReflectionError::MalformedShader { offset: 12, .. }));
    }

    #[test]
    fn oversized_array() {
        let err = parse("float count; vec4 data[1073741824];").unwrap_err();
        assert!(matches!(err, ReflectionError::MalformedShader { offset: 13, .. }));
    }

    #[test]
    fn block_end_past_u32_max() {
        // each field fits, their sum does not
        let err = parse("vec4 a[268435455]; vec4 b[2];").unwrap_err();
        assert!(matches!(err, ReflectionError::MalformedShader { offset: 19, .. }));
    }

    #[test]
    fn sizes_of_member_lists() {
        let variables = parse("mat4 model; vec4 tint;").unwrap();
        assert_eq!(block_size(&variables, 0).unwrap(), 80);
        assert_eq!(block_size(&[], 0).unwrap(), 0);
    }

    #[test]
    fn field_needs_type_and_name() {
        assert!(matches!(
            parse("vec4;").unwrap_err(),
            ReflectionError::MalformedShader { .. }
        ));
        assert!(matches!(
            parse("vec4 a = 1;").unwrap_err(),
            ReflectionError::MalformedShader { .. }
        ));
    }
}
