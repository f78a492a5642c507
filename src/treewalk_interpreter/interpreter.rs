use super::environment::Environment;
use super::function::MagFn;
use super::native_function;
use super::object::{native_bool, HashObject, Object, NULL};
use crate::mag_frontend::grammar::{BlockStatement, Expression, Program, Statement};
use crate::mag_frontend::parser_utils::MAX_NESTING_DEPTH;

use std::io::{self, Write};
use std::rc::Rc;
use tracing::trace;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Nested user-function calls allowed before evaluation gives up.
    pub max_call_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

pub struct Interpreter<W: Write> {
    output: W,
    config: InterpreterConfig,
    depth: usize,
    nesting: usize,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Interpreter::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(output: W) -> Self {
        Interpreter {
            output,
            config: InterpreterConfig::default(),
            depth: 0,
            nesting: 0,
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn eval_program(&mut self, program: &Program, env: &Environment) -> Object {
        let mut result = NULL;
        for statement in program.statements.iter() {
            match self.eval_statement(statement, env) {
                Object::ReturnValue(value) => return *value,
                obj @ Object::Error(_) => return obj,
                obj => result = obj,
            }
        }
        result
    }

    /// Runs statements in the given scope. A return signal or an error is
    /// handed back still wrapped so callers further out stop too.
    pub fn eval_block_statement(&mut self, block: &BlockStatement, env: &Environment) -> Object {
        let mut result = NULL;
        for statement in block.statements.iter() {
            result = self.eval_statement(statement, env);
            if result.is_unwinding() {
                return result;
            }
        }
        result
    }

    pub fn eval_statement(&mut self, statement: &Statement, env: &Environment) -> Object {
        match statement {
            Statement::Expression(expr) => self.eval_expression(expr, env),
            Statement::Return(expr) => match self.eval_expression(expr, env) {
                obj if obj.is_unwinding() => obj,
                obj => Object::ReturnValue(Box::new(obj)),
            },
            Statement::Let(name, expr) => match self.eval_expression(expr, env) {
                obj if obj.is_unwinding() => obj,
                obj => {
                    env.define(name.clone(), obj);
                    NULL
                }
            },
        }
    }

    /// Expressions nest at most `MAX_NESTING_DEPTH` deep within one call,
    /// the same bound the parser applies.
    pub fn eval_expression(&mut self, expr: &Expression, env: &Environment) -> Object {
        if self.nesting >= MAX_NESTING_DEPTH {
            return Object::Error("expression nested too deeply".to_owned());
        }

        self.nesting += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.eval_nested_expression(expr, env)
        });
        self.nesting -= 1;

        result
    }

    fn eval_nested_expression(&mut self, expr: &Expression, env: &Environment) -> Object {
        #[cfg(feature = "trace-execution")]
        trace!(expr = %expr, depth = self.depth, nesting = self.nesting, "eval");

        match expr {
            Expression::Integer(n) => Object::Integer(*n),
            Expression::Str(s) => Object::String(s.clone()),
            Expression::Boolean(b) => native_bool(*b),
            Expression::Identifier(name) => self.eval_identifier(name, env),
            Expression::Prefix(op, rhs) => match self.eval_expression(rhs, env) {
                obj if obj.is_unwinding() => obj,
                obj => Object::apply_prefix_op(*op, obj),
            },
            Expression::Infix(op, lhs, rhs) => {
                let lhs = self.eval_expression(lhs, env);
                if lhs.is_unwinding() {
                    return lhs;
                }
                let rhs = self.eval_expression(rhs, env);
                if rhs.is_unwinding() {
                    return rhs;
                }
                Object::apply_infix_op(*op, lhs, rhs)
            }
            Expression::If(condition, consequence, alternative) => {
                self.eval_if_expression(condition, consequence, alternative.as_ref(), env)
            }
            Expression::Function(func_info) => {
                Object::Function(MagFn::new(func_info.clone(), env.clone()))
            }
            Expression::Call(callee, args) => self.eval_call_expression(callee, args, env),
            Expression::Array(elements) => match self.eval_expressions(elements, env) {
                Ok(elements) => Object::Array(Rc::new(elements)),
                Err(obj) => obj,
            },
            Expression::Index(lhs, index) => {
                let lhs = self.eval_expression(lhs, env);
                if lhs.is_unwinding() {
                    return lhs;
                }
                let index = self.eval_expression(index, env);
                if index.is_unwinding() {
                    return index;
                }
                Object::apply_index_op(lhs, index)
            }
            Expression::Hash(pairs) => self.eval_hash_literal(pairs, env),
        }
    }

    fn eval_identifier(&mut self, name: &str, env: &Environment) -> Object {
        if let Some(obj) = env.get(name) {
            return obj;
        }
        match native_function::lookup(name) {
            Some(native_fn) => Object::Builtin(native_fn),
            None => Object::Error(format!("identifier not found: {}", name)),
        }
    }

    fn eval_if_expression(
        &mut self,
        condition: &Expression,
        consequence: &BlockStatement,
        alternative: Option<&BlockStatement>,
        env: &Environment,
    ) -> Object {
        let condition = self.eval_expression(condition, env);
        if condition.is_unwinding() {
            return condition;
        }

        if condition.is_truthy() {
            self.eval_block_statement(consequence, env)
        } else if let Some(alternative) = alternative {
            self.eval_block_statement(alternative, env)
        } else {
            NULL
        }
    }

    fn eval_call_expression(
        &mut self,
        callee: &Expression,
        args: &[Expression],
        env: &Environment,
    ) -> Object {
        let callee = self.eval_expression(callee, env);
        if callee.is_unwinding() {
            return callee;
        }

        match self.eval_expressions(args, env) {
            Ok(args) => callee.execute(args, self),
            Err(obj) => obj,
        }
    }

    /// Evaluates left to right, stopping at the first error.
    fn eval_expressions(
        &mut self,
        exprs: &[Expression],
        env: &Environment,
    ) -> Result<Vec<Object>, Object> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs.iter() {
            let obj = self.eval_expression(expr, env);
            if obj.is_unwinding() {
                return Err(obj);
            }
            values.push(obj);
        }
        Ok(values)
    }

    fn eval_hash_literal(&mut self, pairs: &[(Expression, Expression)], env: &Environment) -> Object {
        let mut hash = HashObject::new();
        for (key_expr, value_expr) in pairs.iter() {
            let key_obj = self.eval_expression(key_expr, env);
            if key_obj.is_unwinding() {
                return key_obj;
            }
            let key = match key_obj.hash_key() {
                Some(key) => key,
                None => {
                    return Object::Error(format!(
                        "unusable as hash key: {}",
                        key_obj.type_name()
                    ))
                }
            };

            let value = self.eval_expression(value_expr, env);
            if value.is_unwinding() {
                return value;
            }
            hash.insert(key, key_obj, value);
        }
        Object::Hash(Rc::new(hash))
    }

    /// Evaluates a function body one level deeper in the call stack.
    pub fn call_frame(&mut self, body: &BlockStatement, env: Environment) -> Object {
        if self.depth >= self.config.max_call_depth {
            return Object::Error(format!(
                "maximum call depth of {} exceeded",
                self.config.max_call_depth
            ));
        }

        self.depth += 1;
        let outer_nesting = std::mem::replace(&mut self.nesting, 0);
        trace!(depth = self.depth, "enter function");
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.eval_block_statement(body, &env)
        });
        self.nesting = outer_nesting;
        self.depth -= 1;

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mag_frontend::grammar::PrefixOperator;
    use crate::mag_frontend::parse;
    use crate::treewalk_interpreter::evaluate;

    fn run(source: &str) -> Object {
        run_with_output(source).0
    }

    fn run_with_output(source: &str) -> (Object, String) {
        let (program, errors) = parse(source);
        assert!(errors.is_empty(), "parse errors: {:?}", errors);

        let mut interpreter = Interpreter::with_output(Vec::new());
        let result = interpreter.eval_program(&program, &Environment::new());
        let output = String::from_utf8(interpreter.into_output()).unwrap();
        (result, output)
    }

    fn error(message: &str) -> Object {
        Object::Error(message.to_owned())
    }

    fn assert_integers(cases: &[(&str, i64)]) {
        for (source, expected) in cases.iter() {
            assert_eq!(run(source), Object::Integer(*expected), "{}", source);
        }
    }

    #[test]
    fn test_integer_expressions() {
        assert_integers(&[
            ("5", 5),
            ("-10", -10),
            ("5 + 5 + 5 + 5 - 10", 10),
            ("2 * 2 * 2 * 2 * 2", 32),
            ("-50 + 100 + -50", 0),
            ("20 + 2 * -10", 0),
            ("50 / 2 * 2 + 10", 60),
            ("3 * (3 * 3) + 10", 37),
            ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
        ]);
    }

    #[test]
    fn test_boolean_expressions() {
        let cases = [
            ("fact", true),
            ("cap", false),
            ("1 < 2", true),
            ("1 > 2", false),
            ("1 == 1", true),
            ("1 != 1", false),
            ("fact == fact", true),
            ("fact != cap", true),
            ("(1 < 2) == fact", true),
            ("(1 > 2) == fact", false),
        ];
        for (source, expected) in cases.iter() {
            assert_eq!(run(source), native_bool(*expected), "{}", source);
        }
    }

    #[test]
    fn test_bang_operator() {
        let cases = [
            ("!fact", false),
            ("!cap", true),
            ("!5", false),
            ("!!fact", true),
            ("!!5", true),
        ];
        for (source, expected) in cases.iter() {
            assert_eq!(run(source), native_bool(*expected), "{}", source);
        }
    }

    #[test]
    fn test_if_else_expressions() {
        assert_eq!(run("consider (fact) { 10 }"), Object::Integer(10));
        assert_eq!(run("consider (cap) { 10 }"), NULL);
        assert_eq!(run("consider (1) { 10 }"), Object::Integer(10));
        assert_eq!(run("consider (1 > 2) { 10 } however { 20 }"), Object::Integer(20));
        assert_eq!(run("consider (1 < 2) { 10 } however { 20 }"), Object::Integer(10));
    }

    #[test]
    fn test_return_statements() {
        assert_integers(&[
            ("giving 10;", 10),
            ("giving 10; 9;", 10),
            ("giving 2 * 5; 9;", 10),
            ("9; giving 2 * 5; 9;", 10),
            (
                "consider (10 > 1) { consider (10 > 1) { giving 10; } giving 1; }",
                10,
            ),
            (
                "ask f = funk(x) { giving x; x + 10; }; f(10);",
                10,
            ),
            (
                "ask f = funk(x) { ask result = x + 10; giving result; giving 10; }; f(10);",
                20,
            ),
        ]);
    }

    #[test]
    fn test_return_inside_nested_expression_unwinds() {
        assert_eq!(
            run("ask f = funk() { ask x = consider (fact) { giving 1; }; 2 }; f()"),
            Object::Integer(1)
        );
        assert_eq!(
            run("ask f = funk() { [1, consider (fact) { giving 3; }] }; f()"),
            Object::Integer(3)
        );
    }

    #[test]
    fn test_error_handling() {
        let cases = [
            ("5 + fact;", "type mismatch: INTEGER + BOOLEAN"),
            ("5 + fact; 5;", "type mismatch: INTEGER + BOOLEAN"),
            ("-fact", "unknown operator: -BOOLEAN"),
            ("fact + cap;", "unknown operator: BOOLEAN + BOOLEAN"),
            ("5; fact + cap; 5", "unknown operator: BOOLEAN + BOOLEAN"),
            ("consider (10 > 1) { fact + cap; }", "unknown operator: BOOLEAN + BOOLEAN"),
            (
                "consider (10 > 1) { consider (10 > 1) { giving fact + cap; } giving 1; }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            ("foobar", "identifier not found: foobar"),
            (r#""Hello" - "World""#, "unknown operator: STRING - STRING"),
            (
                r#"{"name": "Mag"}[funk(x) { x }];"#,
                "unusable as hash key: FUNCTION",
            ),
            ("{[1]: 2}", "unusable as hash key: ARRAY"),
            ("1[0]", "index operator not supported: INTEGER"),
            ("5(1)", "not a function: INTEGER"),
            ("10 / 0", "division by zero"),
        ];
        for (source, expected) in cases.iter() {
            assert_eq!(run(source), error(expected), "{}", source);
        }
    }

    #[test]
    fn test_first_error_wins() {
        assert_eq!(
            run("[missing, 1 + fact]"),
            error("identifier not found: missing")
        );
        assert_eq!(
            run("ask f = funk(a, b) { a }; f(1 + fact, nope)"),
            error("type mismatch: INTEGER + BOOLEAN")
        );
        assert_eq!(run("ask x = -fact; x"), error("unknown operator: -BOOLEAN"));
    }

    #[test]
    fn test_let_statements() {
        assert_integers(&[
            ("ask a = 5; a;", 5),
            ("ask a = 5 * 5; a;", 25),
            ("ask a = 5; ask b = a; b;", 5),
            ("ask a = 5; ask b = a; ask c = a + b + 5; c;", 15),
        ]);
        assert_eq!(run("ask a = 5;"), NULL);
        assert_eq!(run(""), NULL);
    }

    #[test]
    fn test_function_object() {
        match run("funk(x) { x + 2; };") {
            Object::Function(func) => {
                assert_eq!(func.arity(), 1);
                assert_eq!(
                    Object::Function(func).inspect(),
                    "funk(x) { (x + 2) }"
                );
            }
            obj => panic!("expected function, got {:?}", obj),
        }
    }

    #[test]
    fn test_function_application() {
        assert_integers(&[
            ("ask identity = funk(x) { x; }; identity(5);", 5),
            ("ask identity = funk(x) { giving x; }; identity(5);", 5),
            ("ask double = funk(x) { x * 2; }; double(5);", 10),
            ("ask add = funk(x, y) { x + y; }; add(5, 5);", 10),
            ("ask add = funk(x, y) { x + y; }; add(5 + 5, add(5, 5));", 20),
            ("funk(x) { x; }(5)", 5),
        ]);
        assert_eq!(run("funk() { }()"), NULL);
    }

    #[test]
    fn test_closures() {
        assert_integers(&[
            (
                "ask newAdder = funk(x) { funk(y) { x + y }; }; ask addTwo = newAdder(2); addTwo(2);",
                4,
            ),
            (
                "ask x = 10; ask f = funk() { x }; ask x = 20; f()",
                20,
            ),
            (
                "ask fib = funk(n) { consider (n < 2) { n } however { fib(n - 1) + fib(n - 2) } }; fib(15)",
                610,
            ),
        ]);
    }

    #[test]
    fn test_arity_mismatch() {
        assert_eq!(
            run("ask f = funk(a, b) { a }; f(1)"),
            error("wrong number of arguments. got=1, want=2")
        );
        assert_eq!(
            run("funk() { 1 }(1, 2)"),
            error("wrong number of arguments. got=2, want=0")
        );
    }

    #[test]
    fn test_call_depth_limit() {
        let (program, errors) = parse("ask loop = funk(n) { loop(n + 1) }; loop(0)");
        assert!(errors.is_empty());

        let config = InterpreterConfig { max_call_depth: 5 };
        let mut interpreter = Interpreter::with_output(Vec::new()).with_config(config);
        assert_eq!(
            interpreter.eval_program(&program, &Environment::new()),
            error("maximum call depth of 5 exceeded")
        );

        // The counter unwinds with the error.
        let (program, _) = parse("ask f = funk(n) { consider (n > 0) { f(n - 1) } however { 0 } }; f(4)");
        assert_eq!(
            interpreter.eval_program(&program, &Environment::new()),
            Object::Integer(0)
        );
    }

    #[test]
    fn test_deep_recursion_through_evaluate() {
        let (program, errors) =
            parse("ask f = funk(n) { consider (n == 0) { 0 } however { f(n - 1) } }; f(990)");
        assert!(errors.is_empty());

        assert_eq!(evaluate(&program, &Environment::new()), Object::Integer(0));
    }

    fn negations(depth: usize) -> Expression {
        let mut expr = Expression::Integer(1);
        for _ in 0..depth {
            expr = Expression::Prefix(PrefixOperator::Negate, Box::new(expr));
        }
        expr
    }

    #[test]
    fn test_expression_nesting_limit() {
        let mut interpreter = Interpreter::with_output(Vec::new());
        let env = Environment::new();

        assert_eq!(
            interpreter.eval_expression(&negations(MAX_NESTING_DEPTH + 10), &env),
            error("expression nested too deeply")
        );
        assert_eq!(
            interpreter.eval_expression(&negations(MAX_NESTING_DEPTH - 2), &env),
            Object::Integer(1)
        );
    }

    #[test]
    fn test_nesting_budget_restarts_in_each_call() {
        // Each argument is nested 200 deep; two calls together would not fit.
        let source = format!(
            "ask f = funk(n) {{ consider (n == 0) {{ 0 }} however {{ f({}n - 1) }} }}; f(3)",
            "--".repeat(100)
        );
        assert_eq!(run(&source), Object::Integer(0));
    }

    #[test]
    fn test_environment_persists_between_programs() {
        let env = Environment::new();
        let mut interpreter = Interpreter::with_output(Vec::new());

        for source in ["ask x = 5;", "ask f = funk() { x };"] {
            let (program, errors) = parse(source);
            assert!(errors.is_empty());
            assert_eq!(interpreter.eval_program(&program, &env), NULL);
        }

        let (program, _) = parse("f()");
        assert_eq!(interpreter.eval_program(&program, &env), Object::Integer(5));
    }

    #[test]
    fn test_string_expressions() {
        assert_eq!(
            run(r#""Hello World!""#),
            Object::String("Hello World!".to_owned())
        );
        assert_eq!(
            run(r#""Hello" + " " + "World!""#),
            Object::String("Hello World!".to_owned())
        );
        assert_eq!(
            run(r#""a" == "a""#),
            error("unknown operator: STRING == STRING")
        );
    }

    #[test]
    fn test_builtin_functions() {
        assert_integers(&[
            (r#"thickness("")"#, 0),
            (r#"thickness("four")"#, 4),
            (r#"thickness("hello world")"#, 11),
            ("thickness([1, 2, 3])", 3),
            ("first([1, 2, 3])", 1),
            ("last([1, 2, 3])", 3),
        ]);
        assert_eq!(
            run("thickness(1)"),
            error("argument to `thickness` not supported, got INTEGER")
        );
        assert_eq!(
            run(r#"thickness("one", "two")"#),
            error("wrong number of arguments. got=2, want=1")
        );
        assert_eq!(run("first([])"), NULL);
        assert_eq!(run("bum([1, 2, 3])").inspect(), "[2, 3]");
        assert_eq!(run("bum([])"), NULL);
        assert_eq!(run("push([], 1)").inspect(), "[1]");
        assert_eq!(
            run("push(1, 1)"),
            error("argument to `push` must be ARRAY, got INTEGER")
        );
    }

    #[test]
    fn test_environment_shadows_builtins() {
        assert_eq!(run("ask first = 5; first"), Object::Integer(5));
        assert_eq!(run("first").inspect(), "builtin function");
    }

    #[test]
    fn test_log_output() {
        let (result, output) = run_with_output(r#"log("hello", 1 + 2); log([1, fact])"#);
        assert_eq!(result, NULL);
        assert_eq!(output, "hello\n3\n[1, fact]\n");
    }

    #[test]
    fn test_higher_order_builtins() {
        let source = "
            ask map = funk(arr, f) {
                ask iter = funk(arr, accumulated) {
                    consider (thickness(arr) == 0) {
                        accumulated
                    } however {
                        iter(bum(arr), push(accumulated, f(first(arr))));
                    }
                };
                iter(arr, []);
            };
            ask double = funk(x) { x * 2 };
            map([1, 2, 3, 4], double);
        ";
        assert_eq!(run(source).inspect(), "[2, 4, 6, 8]");
    }

    #[test]
    fn test_array_literals_and_indexing() {
        assert_eq!(run("[1, 2 * 2, 3 + 3]").inspect(), "[1, 4, 6]");
        assert_integers(&[
            ("[1, 2, 3][0]", 1),
            ("[1, 2, 3][2]", 3),
            ("ask i = 0; [1][i];", 1),
            ("[1, 2, 3][1 + 1];", 3),
            ("ask myArray = [1, 2, 3]; myArray[0] + myArray[1] + myArray[2];", 6),
        ]);
        assert_eq!(run("[1, 2, 3][3]"), NULL);
        assert_eq!(run("[1, 2, 3][-1]"), NULL);
    }

    #[test]
    fn test_hash_literals_and_indexing() {
        let source = r#"
            ask two = "two";
            {
                "one": 10 - 9,
                two: 1 + 1,
                "thr" + "ee": 6 / 2,
                4: 4,
                fact: 5,
                cap: 6
            }
        "#;
        assert_eq!(
            run(source).inspect(),
            "{one: 1, two: 2, three: 3, 4: 4, fact: 5, cap: 6}"
        );

        assert_integers(&[
            (r#"{"foo": 5}["foo"]"#, 5),
            (r#"ask key = "foo"; {"foo": 5}[key]"#, 5),
            ("{5: 5}[5]", 5),
            ("{fact: 5}[fact]", 5),
            (r#"{"a": 1, "a": 2}["a"]"#, 2),
        ]);
        assert_eq!(run(r#"{"foo": 5}["bar"]"#), NULL);
        assert_eq!(run(r#"{}["foo"]"#), NULL);
    }

    #[test]
    fn test_identity_equality() {
        let cases = [
            ("ask a = [1]; a == a", true),
            ("[1] == [1]", false),
            ("ask f = funk() { 1 }; f == f", true),
            ("first == first", true),
            ("first == last", false),
            ("1 == fact", false),
            ("1 != fact", true),
        ];
        for (source, expected) in cases.iter() {
            assert_eq!(run(source), native_bool(*expected), "{}", source);
        }
    }
}
