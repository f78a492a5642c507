use rusty_mag::mag_frontend::parse;
use rusty_mag::treewalk_interpreter::{
    Environment, Interpreter, InterpreterConfig, Object, DEFAULT_MAX_CALL_DEPTH,
};

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, BufRead, Write};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const PROMPT: &str = "(mag) ";

/// Interpreter for the Mag language. Starts a prompt when no script is given.
#[derive(Parser, Debug)]
#[clap(name = "rmag", version)]
struct Args {
    /// Script to run
    script: Option<String>,

    /// Nested function calls allowed before evaluation stops
    #[clap(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,
}

fn main() -> Result<()> {
    install_tracing();
    let args = Args::parse();
    let config = InterpreterConfig {
        max_call_depth: args.max_call_depth,
    };
    debug!(max_call_depth = config.max_call_depth, "starting");

    match args.script {
        Some(script) => run_file(&script, config),
        None => run_prompt(config),
    }
}

fn install_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_prompt(config: InterpreterConfig) -> Result<()> {
    let mut interpreter = Interpreter::new().with_config(config);
    let env = Environment::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{}", PROMPT);
        io::stdout().flush().context("failed to flush stdout")?;

        let line = match lines.next() {
            Some(line) => line.context("failed to read from stdin")?,
            None => break,
        };
        if line.trim() == "exit" {
            break;
        }

        run(&mut interpreter, &env, &line)?;
    }

    Ok(())
}

fn run_file(filename: &str, config: InterpreterConfig) -> Result<()> {
    let contents =
        fs::read_to_string(filename).with_context(|| format!("failed to read {}", filename))?;
    let mut interpreter = Interpreter::new().with_config(config);

    run(&mut interpreter, &Environment::new(), &contents)
}

fn run<W: Write>(interpreter: &mut Interpreter<W>, env: &Environment, source: &str) -> Result<()> {
    let (program, errors) = parse(source);
    debug!(
        statements = program.statements.len(),
        errors = errors.len(),
        "parsed input"
    );

    if !errors.is_empty() {
        for error in errors.iter() {
            println!("{}", error.render(source));
        }
        return Ok(());
    }

    #[cfg(feature = "print-ast")]
    println!("{}", program);

    let result = interpreter.eval_program(&program, env);
    debug!(kind = result.type_name(), "evaluated program");

    if result != Object::Null {
        println!("{}", result.inspect());
    }
    interpreter.output().flush().context("failed to flush output")
}
