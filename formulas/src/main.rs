//! Command-line interface for `formulas`.
//!
//! Without a formula, prints the grammar's rules. With one, evaluates it
//! against two demonstration functions, `quadratic(x, a, b, c)` and
//! `sigmoid(x)`, and any variables given with `--var`.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser as ClapParser;
use formulas::{ArithmeticParser, FunctionTable, VariableTable};
use std::io::Write;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Formula to evaluate
    formula: Option<String>,

    /// Variable binding, e.g. `--var x=1.5` (repeatable)
    #[arg(short, long = "var", value_name = "NAME=VALUE", value_parser = parse_binding)]
    vars: Vec<(String, f64)>,

    /// Print LR(0) item sets and FIRST/FOLLOW sets instead of the rule list
    #[arg(long)]
    tables: bool,
}

fn parse_binding(arg: &str) -> Result<(String, f64)> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got {arg:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("empty variable name in {arg:?}");
    }
    let value = value
        .trim()
        .parse()
        .with_context(|| format!("invalid value for {name}"))?;
    Ok((name.to_owned(), value))
}

fn quadratic(x: f64, a: f64, b: f64, c: f64) -> f64 {
    a * x * x + b * x + c
}

fn sigmoid(x: f64) -> f64 {
    1.0 / ((-x).exp() + 1.0)
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let parser = ArithmeticParser::new().context("can't build the formula parser")?;
    let mut out = std::io::stdout().lock();

    let Some(formula) = args.formula else {
        if args.tables {
            parser.write_tables(&mut out)?;
        } else {
            write!(out, "{}", parser.dump())?;
        }
        return Ok(());
    };

    let mut functions = FunctionTable::new();
    functions
        .register("quadratic", quadratic)
        .register("sigmoid", sigmoid);

    let variables: VariableTable = args
        .vars
        .iter()
        .map(|(name, value)| (name.as_str(), *value))
        .collect();

    let result = parser
        .evaluate(&functions, &variables, &formula)
        .with_context(|| format!("can't evaluate {formula:?}"))?;
    writeln!(out, "{formula} = {result}")?;
    Ok(())
}
