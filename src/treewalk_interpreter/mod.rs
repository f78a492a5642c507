mod environment;
mod function;
mod interpreter;
mod native_function;
mod object;

pub use environment::Environment;
pub use function::MagFn;
pub use interpreter::{Interpreter, InterpreterConfig, DEFAULT_MAX_CALL_DEPTH};
pub use native_function::{Arity, NativeFn};
pub use object::{HashKey, HashObject, Object, FALSE, NULL, TRUE};

use crate::mag_frontend::grammar::Program;

/// Evaluates a program against env with builtin output going to stdout.
pub fn evaluate(program: &Program, env: &Environment) -> Object {
    Interpreter::new().eval_program(program, env)
}
