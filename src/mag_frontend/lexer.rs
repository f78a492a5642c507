use super::cursor::Cursor;
use super::span::Span;
use super::token::{SpannedToken, Token};

pub struct Lexer<'src> {
    source: &'src str,
    cursor: Cursor<'src>,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer from source.
    pub fn new(source: &'src str) -> Self {
        Lexer {
            source,
            cursor: Cursor::new(source),
        }
    }

    /// Returns the next token. Once the source is exhausted every call
    /// returns `Token::EndOfFile`.
    pub fn next_token(&mut self) -> SpannedToken {
        // Get rid of whitespace.
        self.cursor.take_while(is_whitespace_char);

        let start_pos = self.cursor.get_position();
        let token = self.lex_token();
        let end_pos = self.cursor.get_position();

        SpannedToken {
            token,
            span: Span::new(start_pos, end_pos),
        }
    }

    fn lex_token(&mut self) -> Token {
        // A NUL is the end-of-input sentinel and is never consumed.
        let (byte_idx, ch) = match self.cursor.peek() {
            None | Some((_, '\0')) => return Token::EndOfFile,
            Some(t) => t,
        };
        self.cursor.take();

        match ch {
            // Potentially two character tokens.
            '=' => self.look_for_eq_sign(Token::Assign, Token::Equal),
            '!' => self.look_for_eq_sign(Token::Bang, Token::NotEqual),

            // Single-character tokens.
            ';' => Token::Semicolon,
            ':' => Token::Colon,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            ',' => Token::Comma,
            '+' => Token::Plus,
            '{' => Token::LeftBrace,
            '}' => Token::RightBrace,
            '[' => Token::LeftBracket,
            ']' => Token::RightBracket,
            '-' => Token::Minus,
            '*' => Token::Asterisk,
            '/' => Token::Slash,
            '<' => Token::LessThan,
            '>' => Token::GreaterThan,

            // String literals.
            '"' => self.lex_string(byte_idx),

            // Identifiers and keywords.
            _ if is_identifier_char(ch) => self.lex_identifier_or_kw(byte_idx),

            // Integers.
            _ if is_digit_char(ch) => self.lex_integer(byte_idx),

            // Unrecognized token.
            _ => Token::Illegal(ch.to_string()),
        }
    }

    /// Checks if next char is '='. If so, consume it and return t2.
    /// Otherwise, return t1.
    fn look_for_eq_sign(&mut self, t1: Token, t2: Token) -> Token {
        if self.cursor.take_if('=') {
            t2
        } else {
            t1
        }
    }

    /// Scans string up to next '"' and returns associated string.
    /// start_idx is the starting '"'.
    fn lex_string(&mut self, start_idx: usize) -> Token {
        self.cursor.take_until(|ch| ch == '"');

        match self.cursor.peek() {
            Some((end_idx, _)) => {
                // Consume the closing quote.
                self.cursor.take();
                Token::String(self.source[start_idx + 1..end_idx].to_owned())
            }
            None => Token::Illegal(self.source[start_idx..].to_owned()),
        }
    }

    fn lex_integer(&mut self, start_idx: usize) -> Token {
        self.cursor.take_while(is_digit_char);
        let end_idx = self.cursor.offset();
        Token::Int(self.source[start_idx..end_idx].to_owned())
    }

    /// Scan up to end of lexeme and return it as identifier. Checks for keywords.
    fn lex_identifier_or_kw(&mut self, start_idx: usize) -> Token {
        self.cursor.take_while(is_identifier_char);
        let end_idx = self.cursor.offset();
        Token::lookup_ident(&self.source[start_idx..end_idx])
    }

    /// Returns an iterator version of lexer.
    pub fn iter(self) -> LexerIterator<'src> {
        LexerIterator { lexer: self }
    }
}

pub struct LexerIterator<'src> {
    lexer: Lexer<'src>,
}

impl<'src> Iterator for LexerIterator<'src> {
    type Item = SpannedToken;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.lexer.next_token();

        if token.token == Token::EndOfFile {
            return None;
        }

        Some(token)
    }
}

fn is_whitespace_char(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

fn is_digit_char(ch: char) -> bool {
    ch.is_ascii_digit()
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}
