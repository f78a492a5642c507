use super::function::MagFn;
use super::interpreter::Interpreter;
use super::native_function::NativeFn;
use crate::mag_frontend::grammar::{InfixOperator, PrefixOperator};

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

pub const TRUE: Object = Object::Boolean(true);
pub const FALSE: Object = Object::Boolean(false);
pub const NULL: Object = Object::Null;

#[derive(Debug, PartialEq, Clone)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    String(String),
    Array(Rc<Vec<Object>>),
    Hash(Rc<HashObject>),
    Function(MagFn),
    Builtin(&'static NativeFn),
    ReturnValue(Box<Object>),
    Error(String),
    Null,
}

/// The hashable projection of an object.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(String),
}

/// Hash map that remembers the order keys were first inserted in.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct HashObject {
    index: HashMap<HashKey, usize>,
    pairs: Vec<(Object, Object)>,
}

impl HashObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pair. An existing key keeps its position and gets the new
    /// value.
    pub fn insert(&mut self, key: HashKey, key_obj: Object, value: Object) {
        match self.index.get(&key) {
            Some(&slot) => self.pairs[slot] = (key_obj, value),
            None => {
                self.index.insert(key, self.pairs.len());
                self.pairs.push((key_obj, value));
            }
        }
    }

    pub fn get(&self, key: &HashKey) -> Option<&Object> {
        self.index.get(key).map(|&slot| &self.pairs[slot].1)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Object, Object)> {
        self.pairs.iter()
    }
}

pub fn native_bool(value: bool) -> Object {
    if value {
        TRUE
    } else {
        FALSE
    }
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "INTEGER",
            Object::Boolean(_) => "BOOLEAN",
            Object::String(_) => "STRING",
            Object::Array(_) => "ARRAY",
            Object::Hash(_) => "HASH",
            Object::Function(_) => "FUNCTION",
            Object::Builtin(_) => "BUILTIN",
            Object::ReturnValue(_) => "RETURN_VALUE",
            Object::Error(_) => "ERROR",
            Object::Null => "NULL",
        }
    }

    pub fn inspect(&self) -> String {
        self.to_string()
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Null | Object::Boolean(false))
    }

    /// Errors and return signals both abandon whatever expression they
    /// turn up in.
    pub fn is_unwinding(&self) -> bool {
        matches!(self, Object::Error(_) | Object::ReturnValue(_))
    }

    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Object::Integer(n) => Some(HashKey::Integer(*n)),
            Object::Boolean(b) => Some(HashKey::Boolean(*b)),
            Object::String(s) => Some(HashKey::String(s.clone())),
            _ => None,
        }
    }

    /// Equality used by `==` for values that are not integers or strings:
    /// booleans and null compare by value, containers and functions by
    /// reference.
    fn is_identical(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::Null, Object::Null) => true,
            (Object::Array(a), Object::Array(b)) => Rc::ptr_eq(a, b),
            (Object::Hash(a), Object::Hash(b)) => Rc::ptr_eq(a, b),
            (Object::Function(a), Object::Function(b)) => a == b,
            (Object::Builtin(a), Object::Builtin(b)) => a == b,
            _ => false,
        }
    }

    pub fn execute<W: Write>(&self, args: Vec<Object>, interpreter: &mut Interpreter<W>) -> Object {
        match self {
            Object::Function(f) => f.execute(args, interpreter),
            Object::Builtin(f) => f.execute(args, interpreter.output()),
            _ => Object::Error(format!("not a function: {}", self.type_name())),
        }
    }

    pub fn apply_infix_op(op: InfixOperator, lhs: Object, rhs: Object) -> Object {
        match (lhs, rhs) {
            (Object::Integer(a), Object::Integer(b)) => integer_infix_op(op, a, b),
            (Object::String(a), Object::String(b)) => match op {
                InfixOperator::Add => Object::String(a + &b),
                _ => Object::Error(format!("unknown operator: STRING {} STRING", op.symbol())),
            },
            (lhs, rhs) => match op {
                InfixOperator::EqualTo => native_bool(lhs.is_identical(&rhs)),
                InfixOperator::NotEqualTo => native_bool(!lhs.is_identical(&rhs)),
                _ if lhs.type_name() != rhs.type_name() => Object::Error(format!(
                    "type mismatch: {} {} {}",
                    lhs.type_name(),
                    op.symbol(),
                    rhs.type_name()
                )),
                _ => Object::Error(format!(
                    "unknown operator: {} {} {}",
                    lhs.type_name(),
                    op.symbol(),
                    rhs.type_name()
                )),
            },
        }
    }

    pub fn apply_prefix_op(op: PrefixOperator, value: Object) -> Object {
        match op {
            PrefixOperator::LogicalNot => native_bool(!value.is_truthy()),
            PrefixOperator::Negate => match value {
                Object::Integer(n) => Object::Integer(n.wrapping_neg()),
                _ => Object::Error(format!("unknown operator: -{}", value.type_name())),
            },
        }
    }

    pub fn apply_index_op(lhs: Object, index: Object) -> Object {
        match (&lhs, &index) {
            (Object::Array(elements), Object::Integer(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| elements.get(i))
                .cloned()
                .unwrap_or(NULL),
            (Object::Hash(hash), _) => match index.hash_key() {
                Some(key) => hash.get(&key).cloned().unwrap_or(NULL),
                None => Object::Error(format!("unusable as hash key: {}", index.type_name())),
            },
            _ => Object::Error(format!(
                "index operator not supported: {}",
                lhs.type_name()
            )),
        }
    }
}

fn integer_infix_op(op: InfixOperator, a: i64, b: i64) -> Object {
    match op {
        InfixOperator::Add => Object::Integer(a.wrapping_add(b)),
        InfixOperator::Subtract => Object::Integer(a.wrapping_sub(b)),
        InfixOperator::Multiply => Object::Integer(a.wrapping_mul(b)),
        InfixOperator::Divide => {
            if b != 0 {
                Object::Integer(a.wrapping_div(b))
            } else {
                Object::Error("division by zero".to_owned())
            }
        }
        InfixOperator::LessThan => native_bool(a < b),
        InfixOperator::GreaterThan => native_bool(a > b),
        InfixOperator::EqualTo => native_bool(a == b),
        InfixOperator::NotEqualTo => native_bool(a != b),
    }
}

fn write_comma_sep<'a, I>(f: &mut fmt::Formatter, items: I) -> fmt::Result
where
    I: Iterator<Item = &'a Object>,
{
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Object::Integer(n) => write!(f, "{}", n),
            Object::Boolean(true) => write!(f, "fact"),
            Object::Boolean(false) => write!(f, "cap"),
            Object::String(s) => write!(f, "{}", s),
            Object::Array(elements) => {
                write!(f, "[")?;
                write_comma_sep(f, elements.iter())?;
                write!(f, "]")
            }
            Object::Hash(hash) => {
                write!(f, "{{")?;
                for (i, (key, value)) in hash.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Object::Function(func) => write!(f, "{}", func),
            Object::Builtin(_) => write!(f, "builtin function"),
            Object::ReturnValue(value) => write!(f, "{}", value),
            Object::Error(message) => write!(f, "ERROR: {}", message),
            Object::Null => write!(f, "or_nar"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(s: &str) -> Object {
        Object::String(s.to_owned())
    }

    #[test]
    fn test_hash_keys() {
        assert_eq!(string("hello").hash_key(), string("hello").hash_key());
        assert_ne!(string("hello").hash_key(), string("diff").hash_key());
        assert_ne!(
            Object::Integer(1).hash_key(),
            Object::Boolean(true).hash_key()
        );
        assert_eq!(Object::Array(Rc::new(vec![])).hash_key(), None);
    }

    #[test]
    fn test_hash_object_keeps_first_position() {
        let mut hash = HashObject::new();
        for (key, value) in [("a", 1), ("b", 2), ("a", 3)] {
            let key_obj = string(key);
            hash.insert(key_obj.hash_key().unwrap(), key_obj, Object::Integer(value));
        }

        assert_eq!(hash.len(), 2);
        assert_eq!(
            hash.get(&HashKey::String("a".to_owned())),
            Some(&Object::Integer(3))
        );
        assert_eq!(Object::Hash(Rc::new(hash)).inspect(), "{a: 3, b: 2}");
    }

    #[test]
    fn test_inspect() {
        let array = Object::Array(Rc::new(vec![Object::Integer(1), string("two"), NULL]));

        assert_eq!(array.inspect(), "[1, two, or_nar]");
        assert_eq!(TRUE.inspect(), "fact");
        assert_eq!(FALSE.inspect(), "cap");
        assert_eq!(Object::Error("boom".to_owned()).inspect(), "ERROR: boom");
        assert_eq!(
            Object::ReturnValue(Box::new(Object::Integer(7))).inspect(),
            "7"
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(Object::Integer(0).is_truthy());
        assert!(string("").is_truthy());
        assert!(!FALSE.is_truthy());
        assert!(!NULL.is_truthy());
    }

    #[test]
    fn test_infix_ops() {
        assert_eq!(
            Object::apply_infix_op(InfixOperator::Add, string("ab"), string("cd")),
            string("abcd")
        );
        assert_eq!(
            Object::apply_infix_op(InfixOperator::Subtract, string("a"), string("b")),
            Object::Error("unknown operator: STRING - STRING".to_owned())
        );
        assert_eq!(
            Object::apply_infix_op(InfixOperator::Add, Object::Integer(1), TRUE),
            Object::Error("type mismatch: INTEGER + BOOLEAN".to_owned())
        );
        assert_eq!(
            Object::apply_infix_op(InfixOperator::Divide, Object::Integer(1), Object::Integer(0)),
            Object::Error("division by zero".to_owned())
        );
        assert_eq!(
            Object::apply_infix_op(InfixOperator::Add, Object::Integer(i64::MAX), Object::Integer(1)),
            Object::Integer(i64::MIN)
        );
        assert_eq!(
            Object::apply_infix_op(InfixOperator::EqualTo, NULL, NULL),
            TRUE
        );
        assert_eq!(
            Object::apply_infix_op(InfixOperator::EqualTo, Object::Integer(1), TRUE),
            FALSE
        );
    }

    #[test]
    fn test_container_equality_is_by_reference() {
        let shared = Rc::new(vec![Object::Integer(1)]);
        let same = Object::Array(shared.clone());
        let copy = Object::Array(Rc::new(vec![Object::Integer(1)]));

        assert_eq!(
            Object::apply_infix_op(InfixOperator::EqualTo, Object::Array(shared), same),
            TRUE
        );
        assert_eq!(
            Object::apply_infix_op(InfixOperator::NotEqualTo, copy.clone(), copy.clone()),
            FALSE
        );
        assert_eq!(
            Object::apply_infix_op(
                InfixOperator::EqualTo,
                copy,
                Object::Array(Rc::new(vec![Object::Integer(1)]))
            ),
            FALSE
        );
    }

    #[test]
    fn test_index_ops() {
        let array = Object::Array(Rc::new(vec![Object::Integer(1), Object::Integer(2)]));

        assert_eq!(
            Object::apply_index_op(array.clone(), Object::Integer(1)),
            Object::Integer(2)
        );
        assert_eq!(Object::apply_index_op(array.clone(), Object::Integer(2)), NULL);
        assert_eq!(Object::apply_index_op(array, Object::Integer(-1)), NULL);
        assert_eq!(
            Object::apply_index_op(Object::Integer(1), Object::Integer(0)),
            Object::Error("index operator not supported: INTEGER".to_owned())
        );
    }
}
