#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Punct(char),
}

/// a token borrowed from comment-stripped source,
/// with its byte offset for diagnostics and segment slicing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub offset: usize,
}

impl<'src> Token<'src> {
    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Ident
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    /// 'layout' and its arguments were always matched loosely by the shaders this reads
    pub fn is_word(&self, word: &str) -> bool {
        self.is_ident() && self.text.eq_ignore_ascii_case(word)
    }

    /// glsl keywords are case sensitive; 'In' is a name, 'in' is a storage qualifier
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.is_ident() && self.text == keyword
    }

    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// splits stripped source into identifiers, numbers and single-char punctuation
///
/// preprocessor lines ('#' to end of line) produce no tokens
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = vec![];
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c == '#' {
            while chars.next_if(|&(_, c)| c != '\n').is_some() {}
            continue;
        }

        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let kind = if c.is_ascii_alphabetic() || c == '_' {
            TokenKind::Ident
        } else if c.is_ascii_digit() {
            TokenKind::Number
        } else {
            chars.next();
            tokens.push(Token {
                kind: TokenKind::Punct(c),
                text: &source[start..start + c.len_utf8()],
                offset: start,
            });
            continue;
        };

        let mut end = start;
        while let Some((i, c)) =
            chars.next_if(|&(_, c)| is_word_char(c) || (kind == TokenKind::Number && c == '.'))
        {
            end = i + c.len_utf8();
        }

        tokens.push(Token {
            kind,
            text: &source[start..end],
            offset: start,
        });
    }

    tokens
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
