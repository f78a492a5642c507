use super::object::{Object, NULL};

use std::fmt;
use std::io::Write;
use std::rc::Rc;

type FnType = fn(Vec<Object>, &mut dyn Write) -> Object;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

pub struct NativeFn {
    pub name: &'static str,
    pub arity: Arity,
    pub func: FnType,
}

static NATIVE_FUNCS: [NativeFn; 6] = [
    NativeFn::new("thickness", Arity::Fixed(1), thickness),
    NativeFn::new("first", Arity::Fixed(1), first),
    NativeFn::new("last", Arity::Fixed(1), last),
    NativeFn::new("bum", Arity::Fixed(1), bum),
    NativeFn::new("push", Arity::Fixed(2), push),
    NativeFn::new("log", Arity::Variadic, log),
];

/// Finds the builtin bound to name, if any.
pub fn lookup(name: &str) -> Option<&'static NativeFn> {
    NATIVE_FUNCS.iter().find(|native_fn| native_fn.name == name)
}

impl NativeFn {
    const fn new(name: &'static str, arity: Arity, func: FnType) -> Self {
        NativeFn { name, arity, func }
    }

    pub fn execute(&self, args: Vec<Object>, output: &mut dyn Write) -> Object {
        match self.arity {
            Arity::Fixed(n) if n != args.len() => Object::Error(format!(
                "wrong number of arguments. got={}, want={}",
                args.len(),
                n
            )),
            _ => (self.func)(args, output),
        }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<native-func {}>", self.name)
    }
}

// Function pointers make poor identities, builtins are unique by name.
impl PartialEq<NativeFn> for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for NativeFn {}

fn array_arg<'a>(name: &str, arg: &'a Object) -> Result<&'a Rc<Vec<Object>>, Object> {
    match arg {
        Object::Array(elements) => Ok(elements),
        other => Err(Object::Error(format!(
            "argument to `{}` must be ARRAY, got {}",
            name,
            other.type_name()
        ))),
    }
}

fn thickness(args: Vec<Object>, _output: &mut dyn Write) -> Object {
    match &args[0] {
        Object::String(s) => Object::Integer(s.len() as i64),
        Object::Array(elements) => Object::Integer(elements.len() as i64),
        other => Object::Error(format!(
            "argument to `thickness` not supported, got {}",
            other.type_name()
        )),
    }
}

fn first(args: Vec<Object>, _output: &mut dyn Write) -> Object {
    match array_arg("first", &args[0]) {
        Ok(elements) => elements.first().cloned().unwrap_or(NULL),
        Err(e) => e,
    }
}

fn last(args: Vec<Object>, _output: &mut dyn Write) -> Object {
    match array_arg("last", &args[0]) {
        Ok(elements) => elements.last().cloned().unwrap_or(NULL),
        Err(e) => e,
    }
}

fn bum(args: Vec<Object>, _output: &mut dyn Write) -> Object {
    match array_arg("bum", &args[0]) {
        Ok(elements) if elements.is_empty() => NULL,
        Ok(elements) => Object::Array(Rc::new(elements[1..].to_vec())),
        Err(e) => e,
    }
}

fn push(mut args: Vec<Object>, _output: &mut dyn Write) -> Object {
    let value = args.pop().unwrap_or(NULL);
    match array_arg("push", &args[0]) {
        Ok(elements) => {
            let mut pushed = elements.as_ref().clone();
            pushed.push(value);
            Object::Array(Rc::new(pushed))
        }
        Err(e) => e,
    }
}

fn log(args: Vec<Object>, output: &mut dyn Write) -> Object {
    for arg in args.iter() {
        if let Err(e) = writeln!(output, "{}", arg) {
            return Object::Error(format!("could not write output: {}", e));
        }
    }
    NULL
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Object>) -> Object {
        let mut sink = Vec::new();
        lookup(name).unwrap().execute(args, &mut sink)
    }

    fn array(values: &[i64]) -> Object {
        Object::Array(Rc::new(values.iter().map(|&n| Object::Integer(n)).collect()))
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("thickness").map(|f| f.arity), Some(Arity::Fixed(1)));
        assert_eq!(lookup("log").map(|f| f.arity), Some(Arity::Variadic));
        assert!(lookup("len").is_none());
    }

    #[test]
    fn test_thickness() {
        assert_eq!(
            call("thickness", vec![Object::String("four".to_owned())]),
            Object::Integer(4)
        );
        assert_eq!(call("thickness", vec![array(&[1, 2])]), Object::Integer(2));
        assert_eq!(
            call("thickness", vec![Object::Integer(1)]),
            Object::Error("argument to `thickness` not supported, got INTEGER".to_owned())
        );
        assert_eq!(
            call("thickness", vec![]),
            Object::Error("wrong number of arguments. got=0, want=1".to_owned())
        );
    }

    #[test]
    fn test_array_builtins() {
        assert_eq!(call("first", vec![array(&[1, 2, 3])]), Object::Integer(1));
        assert_eq!(call("last", vec![array(&[1, 2, 3])]), Object::Integer(3));
        assert_eq!(call("first", vec![array(&[])]), NULL);
        assert_eq!(call("bum", vec![array(&[1, 2, 3])]), array(&[2, 3]));
        assert_eq!(call("bum", vec![array(&[])]), NULL);
        assert_eq!(
            call("push", vec![array(&[1]), Object::Integer(2)]),
            array(&[1, 2])
        );
        assert_eq!(
            call("last", vec![Object::Boolean(true)]),
            Object::Error("argument to `last` must be ARRAY, got BOOLEAN".to_owned())
        );
    }

    #[test]
    fn test_push_leaves_original_untouched() {
        let original = array(&[1]);
        call("push", vec![original.clone(), Object::Integer(2)]);
        assert_eq!(original, array(&[1]));
    }

    #[test]
    fn test_log_writes_lines() {
        let mut sink = Vec::new();
        let result = lookup("log").unwrap().execute(
            vec![Object::String("hi".to_owned()), Object::Integer(3)],
            &mut sink,
        );

        assert_eq!(result, NULL);
        assert_eq!(String::from_utf8(sink).unwrap(), "hi\n3\n");
    }
}
