use super::environment::Environment;
use super::interpreter::Interpreter;
use super::object::Object;
use crate::mag_frontend::grammar::FuncInfo;

use std::fmt;
use std::io::Write;
use std::rc::Rc;

pub struct MagFnData {
    pub func_info: Rc<FuncInfo>,
    pub closure: Environment,
}

/// A function literal together with the scope it was created in.
#[derive(Clone)]
pub struct MagFn(Rc<MagFnData>);

impl MagFn {
    pub fn new(func_info: Rc<FuncInfo>, closure: Environment) -> Self {
        MagFn(Rc::new(MagFnData { func_info, closure }))
    }

    pub fn arity(&self) -> usize {
        self.0.func_info.params.len()
    }

    pub fn execute<W: Write>(&self, args: Vec<Object>, interpreter: &mut Interpreter<W>) -> Object {
        if args.len() != self.arity() {
            return Object::Error(format!(
                "wrong number of arguments. got={}, want={}",
                args.len(),
                self.arity()
            ));
        }

        let env = Environment::with_enclosing(&self.0.closure);
        for (param, arg) in self.0.func_info.params.iter().zip(args) {
            env.define(param.clone(), arg);
        }

        match interpreter.call_frame(&self.0.func_info.body, env) {
            Object::ReturnValue(value) => *value,
            obj => obj,
        }
    }
}

impl fmt::Display for MagFn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.func_info)
    }
}

impl fmt::Debug for MagFn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<fn/{}>", self.arity())
    }
}

impl PartialEq<MagFn> for MagFn {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
