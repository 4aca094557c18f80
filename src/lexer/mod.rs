use crate::lexer::cursor::Cursor;
use crate::span::Span;

pub mod cursor;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    /// Run of `0` and `1` digits
    Bits,
    /// `#` up to end of line
    Comment,
    Whitespace,
    /// Any other run of non-whitespace characters
    Unknown,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.span.as_range()]
    }
}

/// Lazily split program text into tokens, including comments and whitespace.
pub fn tokenize(input: &str) -> impl Iterator<Item = Token> + '_ {
    let mut cursor = Cursor::new(input);
    std::iter::from_fn(move || {
        if cursor.is_eof() {
            return None;
        }
        Some(cursor.advance_token())
    })
}

/// Test if a character separates tokens.
pub(crate) fn is_whitespace(c: char) -> bool {
    c.is_whitespace()
}

impl Cursor<'_> {
    fn advance_token(&mut self) -> Token {
        let start = self.pos();
        let kind = match self.peek() {
            Some('#') => {
                self.eat_while(|c| c != '\n');
                TokenKind::Comment
            }
            Some(c) if is_whitespace(c) => {
                self.eat_while(is_whitespace);
                TokenKind::Whitespace
            }
            _ => {
                let word = self.rest();
                let len = self.eat_while(|c| !is_whitespace(c) && c != '#');
                if word[..len].chars().all(|c| c == '0' || c == '1') {
                    TokenKind::Bits
                } else {
                    TokenKind::Unknown
                }
            }
        };
        Token {
            kind,
            span: Span::new(start, self.pos() - start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, &str)> {
        tokenize(src).map(|tok| (tok.kind, tok.text(src))).collect()
    }

    #[test]
    fn splits_bits_and_comments() {
        assert_eq!(
            kinds("10000010 # LDI R0,8\n00000000"),
            vec![
                (TokenKind::Bits, "10000010"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Comment, "# LDI R0,8"),
                (TokenKind::Whitespace, "\n"),
                (TokenKind::Bits, "00000000"),
            ]
        );
    }

    #[test]
    fn comment_directly_after_literal() {
        assert_eq!(
            kinds("0001#halt"),
            vec![(TokenKind::Bits, "0001"), (TokenKind::Comment, "#halt")]
        );
    }

    #[test]
    fn unknown_words() {
        assert_eq!(
            kinds("0b101 1012"),
            vec![
                (TokenKind::Unknown, "0b101"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Unknown, "1012"),
            ]
        );
    }

    #[test]
    fn empty_input() {
        assert!(tokenize("").next().is_none());
    }
}
