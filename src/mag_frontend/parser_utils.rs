use super::grammar::{InfixOperator, PrefixOperator};
use super::token::Token;
use num_enum::IntoPrimitive;

/// Deepest expression tree the parser builds and the evaluator walks
/// within one function call.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Operators that continue an expression once its left-hand side is parsed.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParserOperator {
    Infix(InfixOperator),
    Call,
    Index,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, IntoPrimitive)]
#[repr(u8)]
pub enum Precedence {
    // Lowest precedence
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index, // Highest precedence
}

impl ParserOperator {
    pub fn from_token(token: &Token) -> Option<ParserOperator> {
        if let Some(op) = Self::try_infix(token) {
            return Some(ParserOperator::Infix(op));
        }

        match token {
            Token::LeftParen => Some(ParserOperator::Call),
            Token::LeftBracket => Some(ParserOperator::Index),
            _ => None,
        }
    }

    fn try_infix(token: &Token) -> Option<InfixOperator> {
        let op = match token {
            Token::Plus => InfixOperator::Add,
            Token::Minus => InfixOperator::Subtract,
            Token::Asterisk => InfixOperator::Multiply,
            Token::Slash => InfixOperator::Divide,
            Token::Equal => InfixOperator::EqualTo,
            Token::NotEqual => InfixOperator::NotEqualTo,
            Token::GreaterThan => InfixOperator::GreaterThan,
            Token::LessThan => InfixOperator::LessThan,
            _ => return None,
        };
        Some(op)
    }

    pub fn precedence(&self) -> Precedence {
        match self {
            ParserOperator::Infix(op) => match op {
                InfixOperator::EqualTo | InfixOperator::NotEqualTo => Precedence::Equals,
                InfixOperator::GreaterThan | InfixOperator::LessThan => Precedence::LessGreater,
                InfixOperator::Add | InfixOperator::Subtract => Precedence::Sum,
                InfixOperator::Multiply | InfixOperator::Divide => Precedence::Product,
            },
            ParserOperator::Call => Precedence::Call,
            ParserOperator::Index => Precedence::Index,
        }
    }

    /// All operators are left associative, so an operator only takes over
    /// the left-hand side when it binds strictly tighter.
    pub fn is_higher_precedence(&self, min_precedence: Precedence) -> bool {
        self.precedence().level() > min_precedence.level()
    }
}

impl Precedence {
    /// Numeric binding power of the level.
    pub fn level(self) -> u8 {
        self.into()
    }
}

pub fn prefix_operator(token: &Token) -> Option<PrefixOperator> {
    match token {
        Token::Bang => Some(PrefixOperator::LogicalNot),
        Token::Minus => Some(PrefixOperator::Negate),
        _ => None,
    }
}
