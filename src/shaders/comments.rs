use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentState {
    None,
    Line,
    Block,
}

/// removes every '//' and '/* */' comment from glsl source
///
/// everything outside a comment is kept as-is, including the line break that
/// ends a line comment. offsets shift; all later passes run on the stripped text.
/// an unterminated block comment is left in place for the scanner to reject.
pub fn strip_comments(source: &str) -> String {
    let comments = find_comments(source);

    let mut stripped = source.to_string();
    // back to front, so the earlier ranges stay valid
    for range in comments.into_iter().rev() {
        stripped.replace_range(range, "");
    }

    stripped
}

fn find_comments(source: &str) -> Vec<Range<usize>> {
    let bytes = source.as_bytes();
    let mut comments = vec![];

    let mut state = CommentState::None;
    let mut begin = 0;
    let mut i = 0;
    while i + 1 < bytes.len() {
        let (current, next) = (bytes[i], bytes[i + 1]);

        match state {
            CommentState::None => {
                if current == b'/' && next == b'*' {
                    begin = i;
                    state = CommentState::Block;
                } else if current == b'/' && next == b'/' {
                    begin = i;
                    state = CommentState::Line;
                }
            }

            CommentState::Block => {
                // '/*/' must not close itself
                if current == b'*' && next == b'/' && i - begin > 1 {
                    comments.push(begin..i + 2);
                    state = CommentState::None;
                    // step over the closing '/'
                    i += 1;
                }
            }

            CommentState::Line => {
                if next == b'\n' || next == b'\r' {
                    comments.push(begin..i + 1);
                    state = CommentState::None;
                }
            }
        }

        i += 1;
    }

    if state == CommentState::Line {
        comments.push(begin..bytes.len());
    }

    comments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_comments_keep_their_line_break() {
        let source = "#version 450 // core\nlayout(location = 0) in vec3 position; // xyz\n";
        let stripped = strip_comments(source);

        assert_eq!(
            stripped,
            "#version 450 \nlayout(location = 0) in vec3 position; \n"
        );
    }

    #[test]
    fn crlf_line_endings() {
        let stripped = strip_comments("float a; // one\r\nfloat b;");
        assert_eq!(stripped, "float a; \r\nfloat b;");
    }

    #[test]
    fn block_comments_are_removed() {
        let stripped = strip_comments("layout(set = 0, /* the only set */ binding = 1) uniform");
        insta::assert_snapshot!(stripped, @"layout(set = 0,  binding = 1) uniform");
    }

    #[test]
    fn multi_line_block_comment() {
        let source = "a/*\n  b\n  c\n*/d";
        assert_eq!(strip_comments(source), "ad");
    }

    #[test]
    fn slash_star_slash_does_not_close() {
        // the first '*/' overlaps the opening '/*'
        assert_eq!(strip_comments("x/*/ still inside */y"), "xy");
        assert_eq!(strip_comments("x/**/y"), "xy");
    }

    #[test]
    fn adjacent_block_comments() {
        assert_eq!(strip_comments("a/*1*//*2*/b"), "ab");
    }

    #[test]
    fn line_comment_at_end_of_file() {
        assert_eq!(strip_comments("float a; // trailing"), "float a; ");
        assert_eq!(strip_comments("float a; //"), "float a; ");
    }

    #[test]
    fn unterminated_block_comment_is_left_open() {
        let source = "float a; /* never closed";
        assert_eq!(strip_comments(source), source);
    }

    #[test]
    fn stripping_is_idempotent() {
        let sources = [
            "// header\n#version 450\nlayout(location = 0) in vec3 p; /* a */ /**/\n",
            "x/*/ y */z // w",
            "/* open",
            "a/*1*//*2*/b//c\r\nd",
            "/",
            "",
        ];

        for source in sources {
            let once = strip_comments(source);
            let twice = strip_comments(&once);
            assert_eq!(once, twice, "source: {source:?}");
        }
    }

    #[test]
    fn code_without_comments_is_untouched() {
        let source = "layout(push_constant) uniform Push { mat4 model; } push;";
        assert_eq!(strip_comments(source), source);
    }
}
