//! Table-driven SLR(1) parser.
//!
//! The parser owns the grammar, its table and the tokenizer. It keeps only
//! the state stack; everything semantic happens in a [`ParserDriver`], which
//! is told about every shift and every reduction in LR order, the post-order
//! of the parse tree.

use crate::error::{GrammarError, ParseError, Span};
use crate::grammar::Grammar;
use crate::lexicon::Lexicon;
use crate::slr::{Action, ParseTable};
use crate::tokenizer::{Lexemes, Tokenizer};
use smartstring::alias::String;
use std::io::{self, Write};

/// A terminal occurrence handed to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Index of the grammar terminal.
    pub terminal: usize,
    pub span: Span,
}

impl Token {
    /// The matched characters.
    #[inline]
    pub fn text<'a>(&self, text: &'a str) -> &'a str {
        self.span.slice(text)
    }
}

/// Receives the parser's events for one input.
pub trait ParserDriver {
    type Error: From<ParseError>;

    /// Called when `token` is shifted.
    fn shift(&mut self, text: &str, token: &Token) -> Result<(), Self::Error>;

    /// Called when the right-hand side of `rule` has been recognized.
    /// `lookahead` is the token that triggered the reduction. Rule 0 is
    /// reported last, once the whole input is accepted.
    fn reduce(&mut self, text: &str, rule: usize, lookahead: &Token) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserStats {
    pub tokens: usize,
    pub shifts: usize,
    pub reductions: usize,
}

/// A grammar, its SLR(1) table and a tokenizer for its terminals.
#[derive(Debug, Clone)]
pub struct Parser {
    grammar: Grammar,
    table: ParseTable,
    tokenizer: Tokenizer,
    /// Grammar terminal for each lexicon rule, `None` when the grammar has
    /// no terminal of that name.
    terminals: Vec<Option<usize>>,
    rule_names: Vec<String>,
}

impl Parser {
    /// Builds the table and the tokenizer and pairs lexicon rules with
    /// grammar terminals by name.
    pub fn new(grammar: Grammar, lexicon: &Lexicon) -> Result<Self, GrammarError> {
        let table = ParseTable::build(&grammar)?;
        let tokenizer = Tokenizer::new(lexicon)?;

        for name in grammar.terminals() {
            let emitted = lexicon.rules().iter().any(|r| !r.skip && r.name == name);
            if !emitted {
                return Err(GrammarError::UndefinedTerminal { name: name.into() });
            }
        }

        let terminals = lexicon
            .rules()
            .iter()
            .map(|r| grammar.terminal(&r.name).filter(|_| !r.skip))
            .collect();
        let rule_names = lexicon.rules().iter().map(|r| r.name.clone()).collect();

        Ok(Self {
            grammar,
            table,
            tokenizer,
            terminals,
            rule_names,
        })
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn table(&self) -> &ParseTable {
        &self.table
    }

    /// Index of the terminal called `name`.
    pub fn terminal(&self, name: &str) -> Option<usize> {
        self.grammar.terminal(name)
    }

    /// Writes the rule list followed by the item sets and FIRST/FOLLOW sets.
    pub fn write_tables<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.grammar.write_rules(out)?;
        writeln!(out)?;
        self.table.write_tables(&self.grammar, out)
    }

    /// Parses `text`, reporting every shift and reduction to `driver`.
    pub fn parse<D: ParserDriver>(&self, text: &str, driver: &mut D) -> Result<(), D::Error> {
        self.parse_with_stats(text, driver).map(|_| ())
    }

    /// Like [`Parser::parse`], also returning event counts.
    pub fn parse_with_stats<D: ParserDriver>(
        &self,
        text: &str,
        driver: &mut D,
    ) -> Result<ParserStats, D::Error> {
        let mut stats = ParserStats::default();
        let mut lexemes = self.tokenizer.tokenize(text);
        let mut states = vec![self.table.start_state()];

        let mut token = self.next_token(text, &mut lexemes)?;
        stats.tokens += 1;

        loop {
            if log::log_enabled!(log::Level::Trace) {
                self.dump_state(text, &states, &token);
            }
            let state = *states
                .last()
                .ok_or_else(|| ParseError::Internal("empty state stack".into()))?;

            match self.table.action(state, token.terminal) {
                Some(Action::Shift(next)) => {
                    log::trace!("Shift {}", next);
                    driver.shift(text, &token)?;
                    states.push(next);
                    stats.shifts += 1;
                    token = self.next_token(text, &mut lexemes)?;
                    stats.tokens += 1;
                }

                Some(Action::Reduce(rule_idx)) => {
                    log::trace!("Reduce {} ({})", rule_idx, self.grammar.rule_text(rule_idx));
                    let rule = self.grammar.rule(rule_idx).ok_or_else(|| {
                        ParseError::Internal(format!("no rule {rule_idx}").into())
                    })?;
                    driver.reduce(text, rule_idx, &token)?;
                    let n = rule.rhs.len();
                    if n >= states.len() {
                        return Err(ParseError::Internal("state stack underflow".into()).into());
                    }
                    states.truncate(states.len() - n);
                    let top = states[states.len() - 1];
                    let next = self.table.goto(top, rule.lhs).ok_or_else(|| {
                        ParseError::Internal(format!("no goto from state {top}").into())
                    })?;
                    states.push(next);
                    stats.reductions += 1;
                }

                Some(Action::Accept) => {
                    log::trace!("Accept");
                    driver.reduce(text, 0, &token)?;
                    stats.reductions += 1;
                    log::debug!(
                        "parsed {} bytes: {} tokens, {} shifts, {} reductions",
                        text.len(),
                        stats.tokens,
                        stats.shifts,
                        stats.reductions
                    );
                    return Ok(stats);
                }

                Some(Action::Goto(_)) => {
                    return Err(ParseError::Internal(format!(
                        "goto on terminal in state {state}"
                    )
                    .into())
                    .into());
                }

                None => {
                    return Err(ParseError::Syntax {
                        found: self.describe(token.terminal),
                        span: token.span,
                    }
                    .into());
                }
            }
        }
    }

    fn next_token(&self, text: &str, lexemes: &mut Lexemes<'_>) -> Result<Token, ParseError> {
        match lexemes.next() {
            None => Ok(Token {
                terminal: self.grammar.end_terminal(),
                span: Span::new(text.len(), text.len()),
            }),
            Some(Err(e)) => Err(e),
            Some(Ok(lexeme)) => match self.terminals.get(lexeme.rule).copied().flatten() {
                Some(terminal) => Ok(Token {
                    terminal,
                    span: lexeme.span,
                }),
                None => Err(ParseError::Syntax {
                    found: self
                        .rule_names
                        .get(lexeme.rule)
                        .cloned()
                        .unwrap_or_default(),
                    span: lexeme.span,
                }),
            },
        }
    }

    fn describe(&self, terminal: usize) -> String {
        if terminal == self.grammar.end_terminal() {
            String::from("end of input")
        } else {
            self.grammar.terminal_name(terminal).into()
        }
    }

    fn dump_state(&self, text: &str, states: &[usize], incoming: &Token) {
        let mut output = std::string::String::new();
        for state in states {
            output.push_str(&format!("<{state}> "));
        }
        output.push_str(&format!(
            "<-  {} {:?}",
            self.grammar.terminal_name(incoming.terminal),
            incoming.text(text)
        ));
        log::trace!("{}", output);
    }
}
