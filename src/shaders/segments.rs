use log::*;

use super::error::{ReflectionError, Result};
use super::lexer::{Token, TokenKind};

/// one `key` or `key = value` inside `layout(...)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutArg<'src> {
    pub key: &'src str,
    pub value: Option<&'src str>,
}

/// one `layout(...) ...;` declaration, without its terminating ';'
#[derive(Debug, Clone)]
pub struct Segment<'src> {
    pub offset: usize,
    pub text: &'src str,
    pub layout_args: Vec<LayoutArg<'src>>,
    /// everything after the closing ')' of the layout qualifier
    pub body: &'src [Token<'src>],
}

impl<'src> Segment<'src> {
    pub fn arg(&self, key: &str) -> Option<&LayoutArg<'src>> {
        self.layout_args
            .iter()
            .find(|arg| arg.key.eq_ignore_ascii_case(key))
    }

    /// an integer layout argument such as 'binding = 2'
    pub fn u32_arg(&self, key: &str) -> Result<Option<u32>> {
        let Some(arg) = self.arg(key) else {
            return Ok(None);
        };

        let value = arg.value.and_then(|v| v.parse().ok()).ok_or_else(|| {
            ReflectionError::malformed(
                self.offset,
                format!("layout argument '{key}' needs an integer value"),
            )
        })?;

        Ok(Some(value))
    }

    pub fn required_u32_arg(&self, key: &str) -> Result<u32> {
        self.u32_arg(key)?.ok_or_else(|| {
            ReflectionError::malformed(self.offset, format!("missing layout argument '{key}'"))
        })
    }

    pub fn has_braces(&self) -> bool {
        self.body.iter().any(|t| t.is_punct('{'))
    }

    /// `layout(local_size_x = 8) in;` and the like: stage-wide settings,
    /// not something a pipeline layout needs
    fn is_stage_input_artifact(&self) -> bool {
        let last_is_in = self.body.last().is_some_and(|t| t.is_keyword("in"));
        last_is_in && !self.has_braces()
    }
}

/// extracts every layout declaration from comment-stripped source, in source order
///
/// a segment runs from 'layout' to the first ';' outside any braces
pub fn scan_segments<'src>(
    source: &'src str,
    tokens: &'src [Token<'src>],
) -> Result<Vec<Segment<'src>>> {
    let mut segments = vec![];

    let mut index = 0;
    while index < tokens.len() {
        if !tokens[index].is_word("layout") {
            index += 1;
            continue;
        }

        let end = segment_end(tokens, index)?;
        let segment_tokens = &tokens[index..end];
        let segment = parse_segment(source, segment_tokens)?;

        if segment.is_stage_input_artifact() {
            debug!("skipping stage input declaration: {}", segment.text);
        } else {
            trace!("layout segment at {}: {}", segment.offset, segment.text);
            segments.push(segment);
        }

        // past the ';'
        index = end + 1;
    }

    Ok(segments)
}

/// index of the terminating ';'
fn segment_end(tokens: &[Token<'_>], start: usize) -> Result<usize> {
    let mut depth: usize = 0;

    for (index, token) in tokens.iter().enumerate().skip(start) {
        match token.kind {
            TokenKind::Punct('{') => depth += 1,
            TokenKind::Punct('}') => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    ReflectionError::malformed(token.offset, "unbalanced '}'")
                })?;
            }
            TokenKind::Punct(';') if depth == 0 => return Ok(index),
            _ => {}
        }
    }

    Err(ReflectionError::malformed(
        tokens[start].offset,
        "layout declaration is never terminated by ';'",
    ))
}

fn parse_segment<'src>(source: &'src str, tokens: &'src [Token<'src>]) -> Result<Segment<'src>> {
    let first = &tokens[0];
    let last = &tokens[tokens.len() - 1];
    let offset = first.offset;
    let text = &source[offset..last.end()];

    let malformed = |at: &Token<'_>, reason: &str| ReflectionError::malformed(at.offset, reason);

    let mut cursor = 1;
    match tokens.get(cursor) {
        Some(t) if t.is_punct('(') => cursor += 1,
        _ => return Err(malformed(last, "expected '(' after 'layout'")),
    }

    let mut layout_args = vec![];
    loop {
        let Some(key) = tokens.get(cursor) else {
            return Err(malformed(last, "unclosed layout qualifier"));
        };

        if key.is_punct(')') {
            cursor += 1;
            break;
        }
        if !key.is_ident() {
            return Err(malformed(key, "expected a layout argument name"));
        }
        cursor += 1;

        let mut value = None;
        if tokens.get(cursor).is_some_and(|t| t.is_punct('=')) {
            let Some(v) = tokens.get(cursor + 1).filter(|t| !matches!(t.kind, TokenKind::Punct(_)))
            else {
                return Err(malformed(key, "expected a value after '='"));
            };
            value = Some(v.text);
            cursor += 2;
        }

        layout_args.push(LayoutArg {
            key: key.text,
            value,
        });

        match tokens.get(cursor) {
            Some(t) if t.is_punct(',') => cursor += 1,
            Some(t) if t.is_punct(')') => {}
            Some(t) => return Err(malformed(t, "expected ',' or ')' in layout qualifier")),
            None => return Err(malformed(last, "unclosed layout qualifier")),
        }
    }

    Ok(Segment {
        offset,
        text,
        layout_args,
        body: &tokens[cursor..],
    })
}
