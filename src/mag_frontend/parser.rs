use super::errors::{ParserError, ParserErrorType, ParserResult};
use super::grammar::{BlockStatement, Expression, FuncInfo, InfixOperator, Program, Statement};
use super::lexer::Lexer;
use super::parser_utils::{prefix_operator, ParserOperator, Precedence, MAX_NESTING_DEPTH};
use super::token::{SpannedToken, Token};

use std::rc::Rc;

const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

pub struct Parser<'s> {
    lexer: Lexer<'s>,
    current: SpannedToken,
    peek: SpannedToken,
    errors: Vec<ParserError>,
    nesting: usize,
}

/// Parses a whole source text, returning the program together with every
/// error found. The program must not be evaluated if errors is non-empty.
pub fn parse(source: &str) -> (Program, Vec<ParserError>) {
    let mut parser = Parser::new(source);
    let program = parser.parse_program();
    (program, parser.errors)
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let peek = lexer.next_token();

        Parser {
            lexer,
            current,
            peek,
            errors: vec![],
            nesting: 0,
        }
    }

    pub fn errors(&self) -> &[ParserError] {
        &self.errors
    }

    /// Advances the stream.
    fn bump(&mut self) {
        let next = self.lexer.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
    }

    fn current_is(&self, t: &Token) -> bool {
        self.current.token.same_kind(t)
    }

    fn peek_is(&self, t: &Token) -> bool {
        self.peek.token.same_kind(t)
    }

    /// Moves onto the lookahead token if it has the expected kind.
    fn expect_peek(&mut self, expected: Token) -> ParserResult<()> {
        if self.peek_is(&expected) {
            self.bump();
            Ok(())
        } else {
            Err(self.peek_error(expected.kind()))
        }
    }

    fn expect_peek_identifier(&mut self) -> ParserResult<String> {
        match &self.peek.token {
            Token::Identifier(name) => {
                let name = name.clone();
                self.bump();
                Ok(name)
            }
            _ => Err(self.peek_error("IDENT")),
        }
    }

    fn peek_error(&self, expected: &'static str) -> ParserError {
        ParserError::new(
            ParserErrorType::ExpectedToken {
                expected,
                got: self.peek.token.kind(),
            },
            self.peek.span,
        )
    }

    /// Skips the lookahead when it is an optional statement terminator.
    fn skip_semicolon(&mut self) {
        if self.peek_is(&Token::Semicolon) {
            self.bump();
        }
    }

    /// Parses program from the top treating it as a set of statements.
    /// A statement that fails is dropped and parsing resumes at the token
    /// after the one the failure left us on.
    pub fn parse_program(&mut self) -> Program {
        let mut statements = vec![];

        while !self.current_is(&Token::EndOfFile) {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(e) if e.error.is_fatal() => {
                    self.errors.push(e);
                    break;
                }
                Err(e) => self.errors.push(e),
            }
            self.bump();
        }

        Program { statements }
    }

    /// On success the current token is the last token of the statement.
    fn parse_statement(&mut self) -> ParserResult<Statement> {
        match self.current.token {
            Token::Let => self.parse_let_statement(),
            Token::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> ParserResult<Statement> {
        let name = self.expect_peek_identifier()?;
        self.expect_peek(Token::Assign)?;
        self.bump();

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Ok(Statement::Let(name, value))
    }

    fn parse_return_statement(&mut self) -> ParserResult<Statement> {
        self.bump();

        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Ok(Statement::Return(value))
    }

    fn parse_expression_statement(&mut self) -> ParserResult<Statement> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.skip_semicolon();

        Ok(Statement::Expression(expr))
    }

    /// Parses the statements of a block whose `{` is the current token.
    /// Errors inside the block are recorded and the block carries on, so
    /// one pass reports as many problems as possible.
    fn parse_block_statement(&mut self) -> ParserResult<BlockStatement> {
        self.bump();
        let mut statements = vec![];

        while !self.current_is(&Token::RightBrace) {
            if self.current_is(&Token::EndOfFile) {
                return Err(ParserError::new(
                    ParserErrorType::ExpectedToken {
                        expected: Token::RightBrace.kind(),
                        got: Token::EndOfFile.kind(),
                    },
                    self.current.span,
                ));
            }

            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(e) if e.error.is_fatal() => return Err(e),
                Err(e) => self.errors.push(e),
            }
            self.bump();
        }

        Ok(BlockStatement { statements })
    }

    /// Pratt parsing algo.
    pub fn parse_expression(&mut self, min_precedence: Precedence) -> ParserResult<Expression> {
        let outer_nesting = self.nesting;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.parse_nested_expression(min_precedence)
        });
        self.nesting = outer_nesting;

        result
    }

    /// Every level counts against the nesting limit: each call, and each
    /// operator that wraps the expression parsed so far.
    fn parse_nested_expression(&mut self, min_precedence: Precedence) -> ParserResult<Expression> {
        self.nest()?;
        let mut lhs = self.parse_prefix()?;

        while !self.peek_is(&Token::Semicolon) {
            let op = match ParserOperator::from_token(&self.peek.token) {
                Some(op) if op.is_higher_precedence(min_precedence) => op,
                _ => break,
            };
            self.nest()?;
            self.bump();

            lhs = match op {
                ParserOperator::Infix(op) => self.parse_infix_expression(op, lhs)?,
                ParserOperator::Call => self.parse_call_expression(lhs)?,
                ParserOperator::Index => self.parse_index_expression(lhs)?,
            };
        }

        Ok(lhs)
    }

    fn nest(&mut self) -> ParserResult<()> {
        self.nesting += 1;
        if self.nesting > MAX_NESTING_DEPTH {
            return Err(ParserError::new(
                ParserErrorType::NestingTooDeep,
                self.current.span,
            ));
        }
        Ok(())
    }

    /// Dispatches on the token that starts an expression.
    fn parse_prefix(&mut self) -> ParserResult<Expression> {
        if let Some(op) = prefix_operator(&self.current.token) {
            self.bump();
            let right = self.parse_expression(Precedence::Prefix)?;
            return Ok(Expression::Prefix(op, Box::new(right)));
        }

        let expr = match &self.current.token {
            Token::Identifier(name) => Expression::Identifier(name.clone()),
            Token::Int(digits) => match digits.parse() {
                Ok(value) => Expression::Integer(value),
                Err(_) => {
                    return Err(ParserError::new(
                        ParserErrorType::InvalidInteger(digits.clone()),
                        self.current.span,
                    ))
                }
            },
            Token::String(s) => Expression::Str(s.clone()),
            Token::True => Expression::Boolean(true),
            Token::False => Expression::Boolean(false),
            Token::LeftParen => return self.parse_grouped_expression(),
            Token::If => return self.parse_if_expression(),
            Token::Function => return self.parse_function_literal(),
            Token::LeftBracket => {
                let elements = self.parse_expression_list(Token::RightBracket)?;
                Expression::Array(elements)
            }
            Token::LeftBrace => return self.parse_hash_literal(),
            Token::Illegal(text) => {
                return Err(ParserError::new(
                    ParserErrorType::IllegalToken(text.clone()),
                    self.current.span,
                ))
            }
            t => {
                return Err(ParserError::new(
                    ParserErrorType::NoPrefixParseFn(t.kind()),
                    self.current.span,
                ))
            }
        };

        Ok(expr)
    }

    fn parse_infix_expression(
        &mut self,
        op: InfixOperator,
        lhs: Expression,
    ) -> ParserResult<Expression> {
        let precedence = ParserOperator::Infix(op).precedence();
        self.bump();
        let rhs = self.parse_expression(precedence)?;

        Ok(Expression::Infix(op, Box::new(lhs), Box::new(rhs)))
    }

    fn parse_call_expression(&mut self, callee: Expression) -> ParserResult<Expression> {
        let args = self.parse_expression_list(Token::RightParen)?;
        Ok(Expression::Call(Box::new(callee), args))
    }

    fn parse_index_expression(&mut self, lhs: Expression) -> ParserResult<Expression> {
        self.bump();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(Token::RightBracket)?;

        Ok(Expression::Index(Box::new(lhs), Box::new(index)))
    }

    fn parse_grouped_expression(&mut self) -> ParserResult<Expression> {
        self.bump();
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(Token::RightParen)?;

        Ok(expr)
    }

    fn parse_if_expression(&mut self) -> ParserResult<Expression> {
        self.expect_peek(Token::LeftParen)?;
        self.bump();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(Token::RightParen)?;

        self.expect_peek(Token::LeftBrace)?;
        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_is(&Token::Else) {
            self.bump();
            self.expect_peek(Token::LeftBrace)?;
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Ok(Expression::If(Box::new(condition), consequence, alternative))
    }

    fn parse_function_literal(&mut self) -> ParserResult<Expression> {
        self.expect_peek(Token::LeftParen)?;
        let params = self.parse_function_params()?;

        self.expect_peek(Token::LeftBrace)?;
        let body = self.parse_block_statement()?;

        Ok(Expression::Function(Rc::new(FuncInfo::new(params, body))))
    }

    fn parse_function_params(&mut self) -> ParserResult<Vec<String>> {
        let mut params = vec![];

        if self.peek_is(&Token::RightParen) {
            self.bump();
            return Ok(params);
        }

        params.push(self.expect_peek_identifier()?);
        while self.peek_is(&Token::Comma) {
            self.bump();
            params.push(self.expect_peek_identifier()?);
        }
        self.expect_peek(Token::RightParen)?;

        Ok(params)
    }

    /// Parses comma separated expressions after the current opening token,
    /// up to and including `end`.
    fn parse_expression_list(&mut self, end: Token) -> ParserResult<Vec<Expression>> {
        let mut exprs = vec![];

        if self.peek_is(&end) {
            self.bump();
            return Ok(exprs);
        }

        self.bump();
        exprs.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(&Token::Comma) {
            self.bump();
            self.bump();
            exprs.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect_peek(end)?;

        Ok(exprs)
    }

    fn parse_hash_literal(&mut self) -> ParserResult<Expression> {
        let mut pairs = vec![];

        while !self.peek_is(&Token::RightBrace) {
            self.bump();
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(Token::Colon)?;
            self.bump();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if !self.peek_is(&Token::RightBrace) {
                self.expect_peek(Token::Comma)?;
            }
        }
        self.expect_peek(Token::RightBrace)?;

        Ok(Expression::Hash(pairs))
    }
}
