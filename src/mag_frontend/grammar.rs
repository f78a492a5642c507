use std::fmt;
use std::rc::Rc;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PrefixOperator {
    Negate,
    LogicalNot,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InfixOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    EqualTo,
    NotEqualTo,
    GreaterThan,
    LessThan,
}

/// Root of a parsed source text.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Let(String, Expression),
    Return(Expression),
    Expression(Expression),
}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Identifier(String),
    Integer(i64),
    Str(String),
    Boolean(bool),
    Prefix(PrefixOperator, Box<Expression>),
    Infix(InfixOperator, Box<Expression>, Box<Expression>),
    If(Box<Expression>, BlockStatement, Option<BlockStatement>),
    Function(Rc<FuncInfo>),
    Call(Box<Expression>, Vec<Expression>),
    Array(Vec<Expression>),
    Index(Box<Expression>, Box<Expression>),
    Hash(Vec<(Expression, Expression)>),
}

/// Parameters and body of a function literal. Shared with the closures
/// created from it.
#[derive(Debug, PartialEq, Clone)]
pub struct FuncInfo {
    pub params: Vec<String>,
    pub body: BlockStatement,
}

impl PrefixOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            PrefixOperator::LogicalNot => "!",
            PrefixOperator::Negate => "-",
        }
    }
}

impl InfixOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            InfixOperator::Add => "+",
            InfixOperator::Subtract => "-",
            InfixOperator::Multiply => "*",
            InfixOperator::Divide => "/",
            InfixOperator::EqualTo => "==",
            InfixOperator::NotEqualTo => "!=",
            InfixOperator::GreaterThan => ">",
            InfixOperator::LessThan => "<",
        }
    }
}

impl Program {
    pub fn token_literal(&self) -> String {
        self.statements
            .first()
            .map(Statement::token_literal)
            .unwrap_or_default()
    }
}

impl Statement {
    /// Literal text of the token the statement starts with.
    pub fn token_literal(&self) -> String {
        match self {
            Statement::Let(..) => "ask".to_owned(),
            Statement::Return(_) => "giving".to_owned(),
            Statement::Expression(expr) => expr.token_literal(),
        }
    }
}

impl BlockStatement {
    pub fn token_literal(&self) -> String {
        "{".to_owned()
    }
}

impl FuncInfo {
    pub fn new(params: Vec<String>, body: BlockStatement) -> Self {
        FuncInfo { params, body }
    }
}

impl Expression {
    /// Literal text of the token the node was built from. For operators
    /// that is the operator itself.
    pub fn token_literal(&self) -> String {
        match self {
            Expression::Identifier(name) => name.clone(),
            Expression::Integer(n) => n.to_string(),
            Expression::Str(s) => s.clone(),
            Expression::Boolean(true) => "fact".to_owned(),
            Expression::Boolean(false) => "cap".to_owned(),
            Expression::Prefix(op, _) => op.symbol().to_owned(),
            Expression::Infix(op, _, _) => op.symbol().to_owned(),
            Expression::If(..) => "consider".to_owned(),
            Expression::Function(_) => "funk".to_owned(),
            Expression::Call(..) => "(".to_owned(),
            Expression::Array(_) | Expression::Index(..) => "[".to_owned(),
            Expression::Hash(_) => "{".to_owned(),
        }
    }
}

/// Writes statements separated by a space. Expression statements that are
/// followed by another statement get a `;` so the output parses back to the
/// same sequence.
fn write_statements(f: &mut fmt::Formatter, stmts: &[Statement]) -> fmt::Result {
    for (i, stmt) in stmts.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", stmt)?;
        if matches!(stmt, Statement::Expression(_)) && i + 1 < stmts.len() {
            write!(f, ";")?;
        }
    }
    Ok(())
}

fn write_comma_sep<T: fmt::Display>(f: &mut fmt::Formatter, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_statements(f, &self.statements)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::Let(name, value) => write!(f, "ask {} = {};", name, value),
            Statement::Return(value) => write!(f, "giving {};", value),
            Statement::Expression(expr) => write!(f, "{}", expr),
        }
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{ ")?;
        write_statements(f, &self.statements)?;
        if !self.statements.is_empty() {
            write!(f, " ")?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for FuncInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "funk(")?;
        write_comma_sep(f, &self.params)?;
        write!(f, ") {}", self.body)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Identifier(name) => write!(f, "{}", name),
            Expression::Integer(n) => write!(f, "{}", n),
            Expression::Str(s) => write!(f, "\"{}\"", s),
            Expression::Boolean(_) => write!(f, "{}", self.token_literal()),
            Expression::Prefix(op, right) => write!(f, "({}{})", op.symbol(), right),
            Expression::Infix(op, lhs, rhs) => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            Expression::If(condition, consequence, alternative) => {
                write!(f, "consider ({}) {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " however {}", alternative)?;
                }
                Ok(())
            }
            Expression::Function(func_info) => write!(f, "{}", func_info),
            Expression::Call(callee, args) => {
                write!(f, "{}(", callee)?;
                write_comma_sep(f, args)?;
                write!(f, ")")
            }
            Expression::Array(elements) => {
                write!(f, "[")?;
                write_comma_sep(f, elements)?;
                write!(f, "]")
            }
            Expression::Index(lhs, index) => write!(f, "({}[{}])", lhs, index),
            Expression::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
