//! Character-level lexer for QL source text.
//!
//! The lexer is a single-pass state machine over bytes. It produces the token
//! stream the parser consumes: identifiers and keywords, decimal number
//! literals, boolean literals, and the fixed symbol set. Compound symbols
//! (`->`, `==`, `>=`, `<=`, `&&`, `||`) are recognized with one byte of
//! lookahead and emitted as single tokens.
//!
//! `//` line comments and whitespace are skipped. A character that starts no
//! token produces an `unknown-character` diagnostic and is skipped, so lexing
//! always reaches the end of input and always terminates the stream with an
//! `Eof` token.

use ql_base::{Diagnostics, Interner, Span};

use crate::token::{Keyword, Sym, Token, TokenKind};

pub struct Lexer<'a, 'int> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    interner: &'int mut Interner,
}

impl<'a, 'int> Lexer<'a, 'int> {
    pub fn new(source: &'a str, interner: &'int mut Interner) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            interner,
        }
    }

    /// Lexes the entire input. The returned stream always ends with `Eof`.
    pub fn tokenize(&mut self, diagnostics: &mut Diagnostics) -> Vec<Token> {
        let mut tokens = Vec::new();

        while self.pos < self.bytes.len() {
            let start = self.pos;
            let b = self.bytes[self.pos];

            match b {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.pos += 1;
                }
                b'/' if self.peek_at(1) == Some(b'/') => {
                    self.skip_line_comment();
                }
                b'0'..=b'9' => {
                    tokens.push(self.lex_number(start));
                }
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                    tokens.push(self.lex_word(start));
                }
                _ => match self.lex_symbol(start) {
                    Some(token) => tokens.push(token),
                    None => {
                        let ch = self.source[start..].chars().next().unwrap_or('\u{fffd}');
                        self.pos += ch.len_utf8();
                        diagnostics.report(
                            "unknown-character",
                            format!("unknown character '{}'", ch),
                            Span::new(start, self.pos),
                        );
                    }
                },
            }
        }

        let eof_span = Span::new(self.source.len(), self.source.len());
        tokens.push(Token::new(TokenKind::Eof, ql_base::Symbol::EMPTY, eof_span));
        tokens
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_line_comment(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
    }

    fn lex_number(&mut self, start: usize) -> Token {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        let text = &self.source[start..self.pos];
        let sym = self.interner.intern(text);
        Token::new(TokenKind::Number(sym), sym, Span::new(start, self.pos))
    }

    fn lex_word(&mut self, start: usize) -> Token {
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_alphanumeric() || self.bytes[self.pos] == b'_')
        {
            self.pos += 1;
        }
        let text = &self.source[start..self.pos];
        let span = Span::new(start, self.pos);
        let sym = self.interner.intern(text);

        let kind = match text {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            _ => match Keyword::from_str(text) {
                Some(kw) => TokenKind::Keyword(kw),
                None => TokenKind::Identifier(sym),
            },
        };
        Token::new(kind, sym, span)
    }

    /// Recognizes a symbol token, longest match first.
    ///
    /// Returns `None` when the current character starts no symbol; the lone
    /// halves `&` and `|` are not symbols of the language.
    fn lex_symbol(&mut self, start: usize) -> Option<Token> {
        let b = self.bytes[self.pos];
        let next = self.peek_at(1);

        let (sym, width) = match (b, next) {
            (b'-', Some(b'>')) => (Sym::Arrow, 2),
            (b'=', Some(b'=')) => (Sym::EqEq, 2),
            (b'>', Some(b'=')) => (Sym::GtEq, 2),
            (b'<', Some(b'=')) => (Sym::LtEq, 2),
            (b'&', Some(b'&')) => (Sym::AndAnd, 2),
            (b'|', Some(b'|')) => (Sym::OrOr, 2),
            (b'+', _) => (Sym::Plus, 1),
            (b'-', _) => (Sym::Minus, 1),
            (b'*', _) => (Sym::Star, 1),
            (b'(', _) => (Sym::LParen, 1),
            (b')', _) => (Sym::RParen, 1),
            (b':', _) => (Sym::Colon, 1),
            (b'{', _) => (Sym::LBrace, 1),
            (b'}', _) => (Sym::RBrace, 1),
            (b'!', _) => (Sym::Bang, 1),
            (b',', _) => (Sym::Comma, 1),
            (b';', _) => (Sym::Semicolon, 1),
            (b'=', _) => (Sym::Equal, 1),
            (b'>', _) => (Sym::Gt, 1),
            (b'<', _) => (Sym::Lt, 1),
            (b'@', _) => (Sym::At, 1),
            _ => return None,
        };

        self.pos += width;
        let text = sym.as_str();
        let lexeme = self.interner.intern(text);
        Some(Token::new(TokenKind::Symbol(sym), lexeme, Span::new(start, self.pos)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_base::Interner;

    fn lex(source: &str) -> (Vec<Token>, Diagnostics) {
        let mut interner = Interner::new();
        let mut diagnostics = Diagnostics::new();
        let tokens = Lexer::new(source, &mut interner).tokenize(&mut diagnostics);
        (tokens, diagnostics)
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        let mut interner = Interner::new();
        let mut diagnostics = Diagnostics::new();
        let tokens = Lexer::new("let counter", &mut interner).tokenize(&mut diagnostics);
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Let));
        match tokens[1].kind {
            TokenKind::Identifier(sym) => assert_eq!(interner.resolve(sym), "counter"),
            other => panic!("expected identifier, got {:?}", other),
        }
        assert!(tokens[2].is_eof());
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn lexes_boolean_literals_as_booleans() {
        let (tokens, _) = lex("true false");
        assert_eq!(tokens[0].kind, TokenKind::Boolean(true));
        assert_eq!(tokens[1].kind, TokenKind::Boolean(false));
    }

    #[test]
    fn type_names_are_keywords() {
        let (tokens, _) = lex("Int Bool String");
        assert_eq!(
            kinds(&tokens[..3]),
            [
                TokenKind::Keyword(Keyword::Int),
                TokenKind::Keyword(Keyword::Bool),
                TokenKind::Keyword(Keyword::String),
            ]
        );
    }

    #[test]
    fn compound_symbols_lex_as_single_tokens() {
        let (tokens, _) = lex("-> == >= <= && ||");
        assert_eq!(
            kinds(&tokens[..6]),
            [
                TokenKind::Symbol(Sym::Arrow),
                TokenKind::Symbol(Sym::EqEq),
                TokenKind::Symbol(Sym::GtEq),
                TokenKind::Symbol(Sym::LtEq),
                TokenKind::Symbol(Sym::AndAnd),
                TokenKind::Symbol(Sym::OrOr),
            ]
        );
    }

    #[test]
    fn arrow_wins_over_minus_then_gt() {
        let (tokens, _) = lex("a->b");
        assert!(matches!(tokens[1].kind, TokenKind::Symbol(Sym::Arrow)));
    }

    #[test]
    fn minus_before_non_gt_is_minus() {
        let (tokens, _) = lex("1 - 2");
        assert!(matches!(tokens[1].kind, TokenKind::Symbol(Sym::Minus)));
    }

    #[test]
    fn number_spans_cover_all_digits() {
        let (tokens, _) = lex("  1234 ");
        assert_eq!(tokens[0].span, Span::new(2, 6));
    }

    #[test]
    fn line_comments_are_skipped() {
        let (tokens, diagnostics) = lex("let x = 1; // trailing note\nlet y = 2;");
        let semis = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Symbol(Sym::Semicolon))
            .count();
        assert_eq!(semis, 2);
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn unknown_character_reports_and_continues() {
        let (tokens, diagnostics) = lex("let x # = 1;");
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.entries()[0].code, "unknown-character");
        // The rest of the line still lexes.
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Symbol(Sym::Equal)));
    }

    #[test]
    fn lone_ampersand_is_unknown() {
        let (_, diagnostics) = lex("a & b");
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn empty_input_yields_only_eof() {
        let (tokens, diagnostics) = lex("");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_eof());
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn attribute_marker_lexes() {
        let (tokens, _) = lex("@main");
        assert_eq!(tokens[0].kind, TokenKind::Symbol(Sym::At));
        assert!(matches!(tokens[1].kind, TokenKind::Identifier(_)));
    }
}
