//! Grammar descriptions: reading, validation and the rule dump.
//!
//! A grammar is a list of productions, one per line:
//!
//! ```text
//! Start -> Expr
//! Expr  -> Expr plus number
//! Expr  -> number
//! Empty ->
//! ```
//!
//! Rules are numbered by declaration order and the number is the only
//! identity a [`ParserDriver`](crate::ParserDriver) sees on reduction. Rule 0
//! is the start rule; its left-hand side must have that one production only
//! and must not occur on any right-hand side.

mod lexer;
mod parser;

pub use parser::{Rule, Symbol};

use crate::error::GrammarError;
use crate::symtab::Symtab;
use anyhow::Context;
use chumsky::Parser as _;
use lexer::LexContext;
use smartstring::alias::String;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

/// Name of the synthetic terminal that marks the end of the input.
pub const END: &str = "$end";

/// A validated grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    nonterms: Symtab,
    terms: Symtab,
    rules: Vec<Rule>,
}

impl Grammar {
    /// Reads a grammar from its text description.
    ///
    /// # Example
    /// ```rust
    /// # use lrkit::Grammar;
    /// let g = Grammar::parse("Start -> List\nList -> List comma item\nList -> item\n").unwrap();
    /// assert_eq!(g.len(), 3);
    /// assert_eq!(g.rule_text(1), "List -> List comma item");
    /// assert!(g.terminal("comma").is_some());
    /// ```
    pub fn parse(text: &str) -> Result<Self, GrammarError> {
        let mut source = std::string::String::from(text);
        if !source.ends_with('\n') {
            source.push('\n');
        }

        let mut ctx = LexContext::default();
        let lexed = lexer::tokenize_all(&source, &mut ctx)?;
        let rules = parser::parser()
            .parse(lexed.tokens.as_slice())
            .into_result()
            .map_err(|errs| {
                let at = errs.first().map_or(0, |e| e.span().start);
                GrammarError::Parse {
                    line: lexed
                        .lines
                        .get(at)
                        .or(lexed.lines.last())
                        .copied()
                        .unwrap_or(1),
                }
            })?;

        let LexContext { mut terms, nonterms } = ctx;
        terms.add(END);

        let grammar = Self {
            nonterms,
            terms,
            rules,
        };
        grammar.validate()?;
        log::debug!(
            "grammar: {} rules, {} nonterminals, {} terminals",
            grammar.rules.len(),
            grammar.nonterms.len(),
            grammar.terms.len()
        );
        Ok(grammar)
    }

    /// Reads a grammar description from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("can't read grammar {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid grammar {}", path.display()))
    }

    fn validate(&self) -> Result<(), GrammarError> {
        let start = self.rules.first().ok_or(GrammarError::NoRules)?.lhs;

        let bad_start = self.rules.iter().skip(1).any(|r| {
            r.lhs == start || r.rhs.contains(&Symbol::NonTerm(start))
        }) || self.rules[0].rhs.contains(&Symbol::NonTerm(start));
        if bad_start {
            return Err(GrammarError::BadStartRule {
                lhs: self.nonterm_name(start).into(),
            });
        }

        for rule in &self.rules {
            for sym in &rule.rhs {
                if let Symbol::NonTerm(n) = *sym {
                    if !self.rules.iter().any(|r| r.lhs == n) {
                        return Err(GrammarError::UndefinedNonterminal {
                            name: self.nonterm_name(n).into(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// All rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of nonterminals.
    pub fn n_nonterms(&self) -> usize {
        self.nonterms.len()
    }

    /// Number of terminals, the end marker included.
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// Index of the terminal called `name`.
    pub fn terminal(&self, name: &str) -> Option<usize> {
        self.terms.idx(name)
    }

    /// Index of the end-of-input terminal.
    pub fn end_terminal(&self) -> usize {
        self.terms.len() - 1
    }

    pub fn terminal_name(&self, index: usize) -> &str {
        self.terms.sym(index).unwrap_or("?")
    }

    pub fn nonterm_name(&self, index: usize) -> &str {
        self.nonterms.sym(index).unwrap_or("?")
    }

    /// Terminal names, the end marker excluded.
    pub fn terminals(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|s| s.as_str()).filter(|s| *s != END)
    }

    /// Names of all symbols in table-column order: nonterminals first, then
    /// terminals.
    pub fn symbol_names(&self) -> Vec<String> {
        self.nonterms.iter().chain(self.terms.iter()).cloned().collect()
    }

    /// Rules as integer vectors: the left-hand side at position 0, then the
    /// right-hand side with terminals offset by the number of nonterminals.
    pub fn encode(&self) -> Vec<Vec<usize>> {
        let n_nonterms = self.nonterms.len();
        self.rules
            .iter()
            .map(|rule| {
                std::iter::once(rule.lhs)
                    .chain(rule.rhs.iter().map(|sym| match *sym {
                        Symbol::NonTerm(i) => i,
                        Symbol::Term(i) => i + n_nonterms,
                    }))
                    .collect()
            })
            .collect()
    }

    /// Renders one rule as `Lhs -> sym sym`.
    pub fn rule_text(&self, index: usize) -> String {
        let mut out = String::new();
        if let Some(rule) = self.rules.get(index) {
            let _ = write!(out, "{} ->", self.nonterm_name(rule.lhs));
            for sym in &rule.rhs {
                let name = match *sym {
                    Symbol::Term(t) => self.terminal_name(t),
                    Symbol::NonTerm(n) => self.nonterm_name(n),
                };
                let _ = write!(out, " {name}");
            }
        }
        out
    }

    /// Writes every rule as `index: Lhs -> rhs`, one per line, with the
    /// index right-aligned to two columns.
    pub fn write_rules<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for i in 0..self.rules.len() {
            writeln!(out, "{:>2}: {}", i, self.rule_text(i))?;
        }
        Ok(())
    }

    /// The rule dump as a string.
    pub fn dump(&self) -> std::string::String {
        let mut buf = Vec::new();
        // writing to a Vec can't fail
        let _ = self.write_rules(&mut buf);
        std::string::String::from_utf8_lossy(&buf).into_owned()
    }
}
