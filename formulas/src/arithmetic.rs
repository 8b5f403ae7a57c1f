//! # Arithmetic Evaluator
//!
//! Couples the arithmetic grammar and lexicon with the semantic actions that
//! compute a formula's value. It exposes:
//!
//! - [`GRAMMAR`] and [`LEXICON`]: the language, as `lrkit` descriptions,
//! - [`ArithmeticRule`]: the grammar's rules by index,
//! - [`ArithmeticParser`]: the compiled parser and the `evaluate` entry point.
//!
//! ## Behavior highlights
//! - **Precedence** is encoded in the grammar: sums over products over
//!   exponentials over signed values. All binary operators, `^` included,
//!   are left-associative, so `2^3^2` is `(2^3)^2`.
//! - **Identifiers** are variables unless followed by `(`, in which case
//!   they name a function from the [`FunctionTable`].
//! - **Arguments** of a call are delimited on the value stack by a
//!   boundary marker pushed when the argument list opens, so calls nest.
//! - Floating-point results are not checked: `1/0` is infinite.

use crate::error::EvalError;
use crate::function::FunctionTable;
use crate::variables::VariableTable;
use lrkit::{Grammar, GrammarError, Lexicon, Parser, ParserDriver, Token};
use num_enum::TryFromPrimitive;
use std::io::{self, Write};

/// Productions of the formula language. Rule numbers are line numbers in
/// this text, counting from 0.
pub const GRAMMAR: &str = "\
Start -> Sums
Sums -> Sums plus Products
Sums -> Sums minus Products
Sums -> Products
Products -> Products multiply Exponentials
Products -> Products divide Exponentials
Products -> Exponentials
Exponentials -> Exponentials power SignedValue
Exponentials -> SignedValue
SignedValue -> Value
SignedValue -> plus Value
SignedValue -> minus Value
Value -> identifier
Value -> number
Value -> parenthesesStart Sums parenthesesEnd
Value -> identifier parenthesesStart parenthesesEnd
Value -> identifier parenthesesStart ParametersBegin Parameters parenthesesEnd
ParametersBegin ->
Parameters -> Parameters comma Sums
Parameters -> Sums
";

/// Token patterns of the formula language.
pub const LEXICON: &str = r#"
INTEGER = [1-9]\d*|0

plus:             <emit> \+
minus:            <emit> \-
multiply:         <emit> \*
divide:           <emit> \/
power:            <emit> \^
identifier:       <emit> [a-zA-Z]\w*
number:           <emit> {{INTEGER}}(\.\d+)?
parenthesesStart: <emit> \(
parenthesesEnd:   <emit> \)
comma:            <emit> ,
whitespace:       <skip> \s+
"#;

/// Rules of [`GRAMMAR`] by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(usize)]
pub enum ArithmeticRule {
    Start = 0,
    SumsPlus = 1,
    SumsMinus = 2,
    Sums = 3,
    ProductsMultiply = 4,
    ProductsDivide = 5,
    Products = 6,
    ExponentialsPower = 7,
    Exponentials = 8,
    SignedValue = 9,
    SignedValuePlus = 10,
    SignedValueMinus = 11,
    ValueIdentifier = 12,
    ValueNumber = 13,
    ValueParentheses = 14,
    ValueCall = 15,
    ValueCallParameters = 16,
    ParametersBegin = 17,
    ParametersComma = 18,
    Parameters = 19,
}

/// The compiled formula parser.
///
/// Holds only immutable data, so one instance can serve any number of
/// threads; every [`ArithmeticParser::evaluate`] call gets fresh stacks.
///
/// # Example
/// ```rust
/// # use formulas::{ArithmeticParser, FunctionTable, VariableTable};
/// let parser = ArithmeticParser::new().unwrap();
/// let mut functions = FunctionTable::new();
/// functions.register("max", f64::max);
/// let variables: VariableTable = [("x", 5.0)].into_iter().collect();
///
/// let v = parser.evaluate(&functions, &variables, "max(x, 2) * -(1 + 1)").unwrap();
/// assert_eq!(v, -10.0);
/// ```
#[derive(Debug, Clone)]
pub struct ArithmeticParser {
    parser: Parser,
    identifier: usize,
    number: usize,
}

impl ArithmeticParser {
    /// Compiles [`GRAMMAR`] and [`LEXICON`].
    pub fn new() -> Result<Self, GrammarError> {
        let grammar = Grammar::parse(GRAMMAR)?;
        let lexicon = Lexicon::parse(LEXICON)?;
        let parser = Parser::new(grammar, &lexicon)?;
        let terminal = |name: &str| {
            parser
                .terminal(name)
                .ok_or_else(|| GrammarError::UndefinedTerminal { name: name.into() })
        };
        let identifier = terminal("identifier")?;
        let number = terminal("number")?;
        log::debug!(
            "arithmetic parser: {} rules, {} states",
            parser.grammar().len(),
            parser.table().len()
        );
        Ok(Self {
            parser,
            identifier,
            number,
        })
    }

    /// Computes the value of `formula`.
    ///
    /// Identifiers are looked up in `variables`, calls in `functions`. The
    /// tables are only read.
    pub fn evaluate(
        &self,
        functions: &FunctionTable,
        variables: &VariableTable,
        formula: &str,
    ) -> Result<f64, EvalError> {
        let mut driver = EvalDriver::new(self, functions, variables);
        self.parser.parse(formula, &mut driver)?;
        driver.finish()
    }

    /// The compiled grammar.
    pub fn grammar(&self) -> &Grammar {
        self.parser.grammar()
    }

    /// The rules, one per line, as `index: Lhs -> rhs`.
    pub fn dump(&self) -> String {
        self.parser.grammar().dump()
    }

    /// Writes the rules, LR(0) item sets and FIRST/FOLLOW sets.
    pub fn write_tables<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.parser.write_tables(out)
    }
}

/// Semantic actions for one evaluation.
///
/// Identifier and number tokens wait on the token stack until the rule that
/// consumes them is reduced; computed numbers live on the value stack;
/// `boundaries` records the value-stack depth at which each open argument
/// list begins.
struct EvalDriver<'a> {
    functions: &'a FunctionTable,
    variables: &'a VariableTable,
    identifier: usize,
    number: usize,
    tokens: Vec<Token>,
    values: Vec<f64>,
    boundaries: Vec<usize>,
}

impl<'a> EvalDriver<'a> {
    fn new(
        parser: &ArithmeticParser,
        functions: &'a FunctionTable,
        variables: &'a VariableTable,
    ) -> Self {
        Self {
            functions,
            variables,
            identifier: parser.identifier,
            number: parser.number,
            tokens: Vec::new(),
            values: Vec::new(),
            boundaries: Vec::new(),
        }
    }

    fn pop_token(&mut self) -> Result<Token, EvalError> {
        self.tokens
            .pop()
            .ok_or_else(|| EvalError::fault("token stack underflow"))
    }

    fn pop_value(&mut self) -> Result<f64, EvalError> {
        self.values
            .pop()
            .ok_or_else(|| EvalError::fault("value stack underflow"))
    }

    /// Pops the right operand, then the left one.
    fn pop_operands(&mut self) -> Result<(f64, f64), EvalError> {
        let rhs = self.pop_value()?;
        let lhs = self.pop_value()?;
        Ok((lhs, rhs))
    }

    fn binary(&mut self, op: impl FnOnce(f64, f64) -> f64) -> Result<(), EvalError> {
        let (lhs, rhs) = self.pop_operands()?;
        self.values.push(op(lhs, rhs));
        Ok(())
    }

    fn call(&self, text: &str, name: &Token, arguments: &[f64]) -> Result<f64, EvalError> {
        let name_text = name.text(text);
        let function = self
            .functions
            .get(name_text)
            .ok_or_else(|| EvalError::UndefinedFunction {
                name: name_text.into(),
                span: name.span,
            })?;
        let result = function
            .invoke(arguments)
            .map_err(|e| EvalError::ArityMismatch {
                name: name_text.into(),
                expected: e.expected,
                supplied: e.supplied,
            })?;
        log::trace!("{}{:?} = {}", name_text, arguments, result);
        Ok(result)
    }

    /// Checks the final stacks and returns the single remaining value.
    fn finish(mut self) -> Result<f64, EvalError> {
        if !self.tokens.is_empty() {
            return Err(EvalError::fault(format!(
                "{} tokens left on the stack",
                self.tokens.len()
            )));
        }
        if self.values.len() != 1 {
            return Err(EvalError::fault(format!(
                "{} values left on the stack",
                self.values.len()
            )));
        }
        self.pop_value()
    }
}

impl ParserDriver for EvalDriver<'_> {
    type Error = EvalError;

    fn shift(&mut self, _text: &str, token: &Token) -> Result<(), EvalError> {
        if token.terminal == self.identifier || token.terminal == self.number {
            self.tokens.push(*token);
        }
        Ok(())
    }

    fn reduce(&mut self, text: &str, rule: usize, _lookahead: &Token) -> Result<(), EvalError> {
        let rule = ArithmeticRule::try_from(rule)
            .map_err(|_| EvalError::fault(format!("unknown rule {rule}")))?;
        match rule {
            ArithmeticRule::Start
            | ArithmeticRule::Sums
            | ArithmeticRule::Products
            | ArithmeticRule::Exponentials
            | ArithmeticRule::SignedValue
            | ArithmeticRule::SignedValuePlus
            | ArithmeticRule::ValueParentheses
            | ArithmeticRule::ParametersComma
            | ArithmeticRule::Parameters => {}
            ArithmeticRule::SumsPlus => {
                // Sums -> Sums plus Products
                self.binary(|a, b| a + b)?;
            }
            ArithmeticRule::SumsMinus => {
                // Sums -> Sums minus Products
                self.binary(|a, b| a - b)?;
            }
            ArithmeticRule::ProductsMultiply => {
                // Products -> Products multiply Exponentials
                self.binary(|a, b| a * b)?;
            }
            ArithmeticRule::ProductsDivide => {
                // Products -> Products divide Exponentials
                self.binary(|a, b| a / b)?;
            }
            ArithmeticRule::ExponentialsPower => {
                // Exponentials -> Exponentials power SignedValue
                self.binary(f64::powf)?;
            }
            ArithmeticRule::SignedValueMinus => {
                // SignedValue -> minus Value
                let v = self.pop_value()?;
                self.values.push(-v);
            }
            ArithmeticRule::ValueIdentifier => {
                // Value -> identifier
                let tok = self.pop_token()?;
                let name = tok.text(text);
                let value =
                    self.variables
                        .get(name)
                        .ok_or_else(|| EvalError::UndefinedVariable {
                            name: name.into(),
                            span: tok.span,
                        })?;
                self.values.push(value);
            }
            ArithmeticRule::ValueNumber => {
                // Value -> number
                let tok = self.pop_token()?;
                let literal = tok.text(text);
                let value = literal
                    .parse::<f64>()
                    .map_err(|source| EvalError::MalformedNumber {
                        text: literal.into(),
                        source,
                    })?;
                self.values.push(value);
            }
            ArithmeticRule::ValueCall => {
                // Value -> identifier parenthesesStart parenthesesEnd
                let name = self.pop_token()?;
                let result = self.call(text, &name, &[])?;
                self.values.push(result);
            }
            ArithmeticRule::ValueCallParameters => {
                // Value -> identifier parenthesesStart ParametersBegin Parameters parenthesesEnd
                let name = self.pop_token()?;
                let base = *self
                    .boundaries
                    .last()
                    .ok_or_else(|| EvalError::fault("no open argument list"))?;
                if base > self.values.len() {
                    return Err(EvalError::fault(format!(
                        "argument boundary {base} above value stack depth {}",
                        self.values.len()
                    )));
                }
                let result = self.call(text, &name, &self.values[base..])?;
                self.values.truncate(base);
                self.boundaries.pop();
                self.values.push(result);
            }
            ArithmeticRule::ParametersBegin => {
                // ParametersBegin ->
                self.boundaries.push(self.values.len());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrkit::Span;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn _assert_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn parser_is_send_sync() {
        _assert_send_sync_static::<ArithmeticParser>();
    }

    fn functions() -> FunctionTable {
        let mut functions = FunctionTable::new();
        functions
            .register("pi", || std::f64::consts::PI)
            .register("add", |a: f64, b: f64| a + b)
            .register("neg", |x: f64| -x);
        functions
    }

    fn eval(formula: &str) -> Result<f64, EvalError> {
        init_logger();
        let parser = ArithmeticParser::new().unwrap();
        parser.evaluate(&functions(), &VariableTable::new(), formula)
    }

    fn assert_close(got: f64, want: f64) {
        assert!(
            (got - want).abs() <= 1e-9 * want.abs().max(1.0),
            "got {got}, want {want}"
        );
    }

    #[test]
    fn binary_operators_match_native_arithmetic() {
        let parser = ArithmeticParser::new().unwrap();
        let (f, v) = (functions(), VariableTable::new());
        for (a, b) in [(3.0, 4.0), (1.5, 0.25), (10.0, 3.0), (0.0, 7.0), (2.0, 0.5)] {
            let cases: [(&str, f64); 5] = [
                ("+", a + b),
                ("-", a - b),
                ("*", a * b),
                ("/", a / b),
                ("^", f64::powf(a, b)),
            ];
            for (op, want) in cases {
                let formula = format!("{a} {op} {b}");
                assert_close(parser.evaluate(&f, &v, &formula).unwrap(), want);
            }
        }
    }

    #[test]
    fn precedence_and_grouping() {
        assert_eq!(eval("2+3*4").unwrap(), 14.0);
        assert_eq!(eval("(2+3)*4").unwrap(), 20.0);
        assert_eq!(eval("2*3+4*5").unwrap(), 26.0);
        assert_eq!(eval("8-2-1").unwrap(), 5.0);
        assert_eq!(eval("16/4/2").unwrap(), 2.0);
        assert_eq!(eval("2*3^2").unwrap(), 18.0);
    }

    #[test]
    fn power_is_left_associative() {
        assert_eq!(eval("2^3^2").unwrap(), 64.0);
    }

    #[test]
    fn signs() {
        assert_eq!(eval("-3+5").unwrap(), 2.0);
        assert_eq!(eval("+3").unwrap(), 3.0);
        assert_eq!(eval("2*-3").unwrap(), -6.0);
        assert_eq!(eval("2^-1").unwrap(), 0.5);
        assert_eq!(eval("-(1+2)").unwrap(), -3.0);
    }

    #[test]
    fn number_literals() {
        assert_eq!(eval("0.25").unwrap(), 0.25);
        assert_eq!(eval("  42  ").unwrap(), 42.0);
        assert!(eval("1/0").unwrap().is_infinite());
    }

    #[test]
    fn variables_are_resolved() {
        let parser = ArithmeticParser::new().unwrap();
        let vars: VariableTable = [("x", 5.0)].into_iter().collect();
        assert_eq!(parser.evaluate(&functions(), &vars, "x*2").unwrap(), 10.0);
    }

    #[test]
    fn undefined_variable_reports_name_and_span() {
        match eval("1 + x") {
            Err(EvalError::UndefinedVariable { name, span }) => {
                assert_eq!(name, "x");
                assert_eq!(span, Span::new(4, 5));
            }
            other => panic!("expected UndefinedVariable, got {other:?}"),
        }
    }

    #[test]
    fn function_calls() {
        assert_close(eval("pi()").unwrap(), std::f64::consts::PI);
        assert_eq!(eval("add(1+1, 2*3)").unwrap(), 8.0);
        assert_eq!(eval("add(add(1,2),3)").unwrap(), 6.0);
        assert_eq!(eval("add(neg(1), add(2, pi()*0))").unwrap(), 1.0);
        assert_eq!(eval("2*add(1,1)^2").unwrap(), 8.0);
    }

    #[test]
    fn arity_mismatch() {
        for formula in ["add(1)", "add(1,2,3)", "add()"] {
            match eval(formula) {
                Err(EvalError::ArityMismatch {
                    name, expected, ..
                }) => {
                    assert_eq!(name, "add");
                    assert_eq!(expected, 2);
                }
                other => panic!("{formula}: expected ArityMismatch, got {other:?}"),
            }
        }
        assert!(matches!(
            eval("add(1,2,3)"),
            Err(EvalError::ArityMismatch { supplied: 3, .. })
        ));
    }

    #[test]
    fn undefined_function_for_any_argument_count() {
        for formula in ["nope()", "nope(1)", "nope(1, 2, 3)"] {
            match eval(formula) {
                Err(EvalError::UndefinedFunction { name, span }) => {
                    assert_eq!(name, "nope");
                    assert_eq!(span, Span::new(0, 4));
                }
                other => panic!("{formula}: expected UndefinedFunction, got {other:?}"),
            }
        }
    }

    #[test]
    fn engine_errors_pass_through() {
        assert!(matches!(
            eval("2 $ 3"),
            Err(EvalError::Lexical { span }) if span == Span::new(2, 3)
        ));
        assert!(matches!(eval("(1+2"), Err(EvalError::Syntax { .. })));
        assert!(matches!(eval("1 2"), Err(EvalError::Syntax { .. })));
        assert!(matches!(eval(""), Err(EvalError::Syntax { .. })));
        assert!(matches!(eval("add(1,)"), Err(EvalError::Syntax { .. })));
    }

    #[test]
    fn evaluation_is_repeatable_and_leaves_tables_alone() {
        let parser = ArithmeticParser::new().unwrap();
        let f = functions();
        let vars: VariableTable = [("x", 2.0), ("y", 3.0)].into_iter().collect();
        let before = vars.clone();
        let first = parser.evaluate(&f, &vars, "add(x, y) * x").unwrap();
        let second = parser.evaluate(&f, &vars, "add(x, y) * x").unwrap();
        assert_eq!(first, 10.0);
        assert_eq!(first, second);
        assert_eq!(vars, before);
        assert_eq!(f.names().collect::<Vec<_>>(), ["pi", "add", "neg"]);
    }

    #[test]
    fn rule_enum_matches_grammar() {
        let parser = ArithmeticParser::new().unwrap();
        let g = parser.grammar();
        assert_eq!(g.len(), 20);
        let cases = [
            (ArithmeticRule::Start, "Start -> Sums"),
            (ArithmeticRule::SumsPlus, "Sums -> Sums plus Products"),
            (ArithmeticRule::SumsMinus, "Sums -> Sums minus Products"),
            (ArithmeticRule::Sums, "Sums -> Products"),
            (
                ArithmeticRule::ProductsMultiply,
                "Products -> Products multiply Exponentials",
            ),
            (
                ArithmeticRule::ProductsDivide,
                "Products -> Products divide Exponentials",
            ),
            (ArithmeticRule::Products, "Products -> Exponentials"),
            (
                ArithmeticRule::ExponentialsPower,
                "Exponentials -> Exponentials power SignedValue",
            ),
            (ArithmeticRule::Exponentials, "Exponentials -> SignedValue"),
            (ArithmeticRule::SignedValue, "SignedValue -> Value"),
            (ArithmeticRule::SignedValuePlus, "SignedValue -> plus Value"),
            (ArithmeticRule::SignedValueMinus, "SignedValue -> minus Value"),
            (ArithmeticRule::ValueIdentifier, "Value -> identifier"),
            (ArithmeticRule::ValueNumber, "Value -> number"),
            (
                ArithmeticRule::ValueParentheses,
                "Value -> parenthesesStart Sums parenthesesEnd",
            ),
            (
                ArithmeticRule::ValueCall,
                "Value -> identifier parenthesesStart parenthesesEnd",
            ),
            (
                ArithmeticRule::ValueCallParameters,
                "Value -> identifier parenthesesStart ParametersBegin Parameters parenthesesEnd",
            ),
            (ArithmeticRule::ParametersBegin, "ParametersBegin ->"),
            (
                ArithmeticRule::ParametersComma,
                "Parameters -> Parameters comma Sums",
            ),
            (ArithmeticRule::Parameters, "Parameters -> Sums"),
        ];
        for (i, (rule, text)) in cases.into_iter().enumerate() {
            assert_eq!(rule as usize, i);
            assert_eq!(ArithmeticRule::try_from(i), Ok(rule));
            assert_eq!(g.rule_text(i), text);
        }
        assert!(ArithmeticRule::try_from(20).is_err());
    }

    #[test]
    fn dump_is_stable() {
        let parser = ArithmeticParser::new().unwrap();
        let dump = parser.dump();
        assert_eq!(dump.lines().count(), 20);
        assert!(dump.starts_with(" 0: Start -> Sums\n"));
        assert_eq!(dump, ArithmeticParser::new().unwrap().dump());

        let mut buf = Vec::new();
        parser.write_tables(&mut buf).unwrap();
        assert!(!buf.is_empty());
    }

    fn driver_for<'a>(
        parser: &ArithmeticParser,
        functions: &'a FunctionTable,
        variables: &'a VariableTable,
    ) -> EvalDriver<'a> {
        EvalDriver::new(parser, functions, variables)
    }

    #[test]
    fn unknown_rule_is_internal_fault() {
        let parser = ArithmeticParser::new().unwrap();
        let (f, v) = (FunctionTable::new(), VariableTable::new());
        let mut d = driver_for(&parser, &f, &v);
        let end = Token {
            terminal: 0,
            span: Span::new(0, 0),
        };
        let err = d.reduce("", 42, &end).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn stack_underflow_is_internal_fault() {
        let parser = ArithmeticParser::new().unwrap();
        let (f, v) = (FunctionTable::new(), VariableTable::new());
        let end = Token {
            terminal: 0,
            span: Span::new(0, 0),
        };
        let mut d = driver_for(&parser, &f, &v);
        assert!(d
            .reduce("", ArithmeticRule::SumsPlus as usize, &end)
            .unwrap_err()
            .is_internal());

        let mut d = driver_for(&parser, &f, &v);
        assert!(d
            .reduce("", ArithmeticRule::ValueNumber as usize, &end)
            .unwrap_err()
            .is_internal());

        let mut d = driver_for(&parser, &f, &v);
        d.tokens.push(end);
        assert!(d
            .reduce("", ArithmeticRule::ValueCallParameters as usize, &end)
            .unwrap_err()
            .is_internal());
    }

    #[test]
    fn leftover_stacks_are_internal_faults() {
        let parser = ArithmeticParser::new().unwrap();
        let (f, v) = (FunctionTable::new(), VariableTable::new());

        let mut d = driver_for(&parser, &f, &v);
        d.values.extend([1.0, 2.0]);
        assert!(d.finish().unwrap_err().is_internal());

        let d = driver_for(&parser, &f, &v);
        assert!(d.finish().unwrap_err().is_internal());

        let mut d = driver_for(&parser, &f, &v);
        d.values.push(1.0);
        d.tokens.push(Token {
            terminal: parser.identifier,
            span: Span::new(0, 1),
        });
        assert!(d.finish().unwrap_err().is_internal());
    }

    #[test]
    fn boundary_above_stack_is_internal_fault() {
        let parser = ArithmeticParser::new().unwrap();
        let (f, v) = (functions(), VariableTable::new());
        let text = "add";
        let name = Token {
            terminal: parser.identifier,
            span: Span::new(0, 3),
        };
        let mut d = driver_for(&parser, &f, &v);
        d.tokens.push(name);
        d.boundaries.push(3);
        d.values.push(1.0);
        assert!(d
            .reduce(text, ArithmeticRule::ValueCallParameters as usize, &name)
            .unwrap_err()
            .is_internal());
    }

    #[test]
    fn malformed_number_literal() {
        let parser = ArithmeticParser::new().unwrap();
        let (f, v) = (FunctionTable::new(), VariableTable::new());
        let text = "1.2.3";
        let tok = Token {
            terminal: parser.number,
            span: Span::new(0, text.len()),
        };
        let mut d = driver_for(&parser, &f, &v);
        d.shift(text, &tok).unwrap();
        match d.reduce(text, ArithmeticRule::ValueNumber as usize, &tok) {
            Err(EvalError::MalformedNumber { text, .. }) => assert_eq!(text, "1.2.3"),
            other => panic!("expected MalformedNumber, got {other:?}"),
        }
    }

    #[test]
    fn only_identifiers_and_numbers_are_kept() {
        let parser = ArithmeticParser::new().unwrap();
        let (f, v) = (FunctionTable::new(), VariableTable::new());
        let plus = parser.parser.terminal("plus").unwrap();
        let mut d = driver_for(&parser, &f, &v);
        d.shift(
            "+",
            &Token {
                terminal: plus,
                span: Span::new(0, 1),
            },
        )
        .unwrap();
        assert!(d.tokens.is_empty());
    }
}
