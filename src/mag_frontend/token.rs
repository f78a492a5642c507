use super::span::Span;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Token {
    Illegal(String),
    EndOfFile,

    // Literals.
    Identifier(String),
    Int(String),
    String(String),

    // Operators.
    Assign,
    Plus,
    Minus,
    Bang,
    Asterisk,
    Slash,
    LessThan,
    GreaterThan,
    Equal,
    NotEqual,

    // Delimiters.
    Comma,
    Semicolon,
    Colon,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,

    // Keywords.
    Function,
    Let,
    True,
    False,
    If,
    Else,
    Return,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

impl Token {
    /// Maps a scanned word to its keyword token, or an identifier.
    pub fn lookup_ident(ident: &str) -> Token {
        match ident {
            "funk" => Token::Function,
            "ask" => Token::Let,
            "fact" => Token::True,
            "cap" => Token::False,
            "consider" => Token::If,
            "however" => Token::Else,
            "giving" => Token::Return,
            other => Token::Identifier(other.to_owned()),
        }
    }

    /// Source text the token was scanned from.
    pub fn literal(&self) -> &str {
        match self {
            Token::Illegal(s) | Token::Identifier(s) | Token::Int(s) | Token::String(s) => s,
            Token::EndOfFile => "",
            Token::Function => "funk",
            Token::Let => "ask",
            Token::True => "fact",
            Token::False => "cap",
            Token::If => "consider",
            Token::Else => "however",
            Token::Return => "giving",
            other => other.kind(),
        }
    }

    /// Name of the token's kind, as used in parser diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Illegal(_) => "ILLEGAL",
            Token::EndOfFile => "EOF",
            Token::Identifier(_) => "IDENT",
            Token::Int(_) => "INT",
            Token::String(_) => "STRING",
            Token::Assign => "=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Bang => "!",
            Token::Asterisk => "*",
            Token::Slash => "/",
            Token::LessThan => "<",
            Token::GreaterThan => ">",
            Token::Equal => "==",
            Token::NotEqual => "!=",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::LeftBrace => "{",
            Token::RightBrace => "}",
            Token::LeftBracket => "[",
            Token::RightBracket => "]",
            Token::Function => "FUNK",
            Token::Let => "ASK",
            Token::True => "FACT",
            Token::False => "CAP",
            Token::If => "CONSIDER",
            Token::Else => "HOWEVER",
            Token::Return => "GIVING",
        }
    }

    /// True when both tokens are of the same kind, ignoring any payload.
    pub fn same_kind(&self, other: &Token) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}
