//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Runtime SLR(1) parsing.
//!
//! `lrkit` turns two small text descriptions into a working parser:
//!  * a **grammar** ([`Grammar`]), one `Lhs -> symbols` production per line,
//!    compiled into an SLR(1) table ([`ParseTable`]);
//!  * a **lexicon** ([`Lexicon`]), named regular expressions compiled into a
//!    single longest-match DFA ([`Tokenizer`]).
//!
//! A [`Parser`] pairs the two by terminal name and feeds every shift and
//! reduction to a [`ParserDriver`], which does the actual work.
//!
//! # Example
//!
//! ```rust
//! use lrkit::{Grammar, Lexicon, ParseError, Parser, ParserDriver, Token};
//!
//! struct Sum(Vec<i64>);
//!
//! impl ParserDriver for Sum {
//!     type Error = ParseError;
//!
//!     fn shift(&mut self, text: &str, token: &Token) -> Result<(), ParseError> {
//!         if let Ok(n) = token.text(text).parse() {
//!             self.0.push(n);
//!         }
//!         Ok(())
//!     }
//!
//!     fn reduce(&mut self, _: &str, rule: usize, _: &Token) -> Result<(), ParseError> {
//!         if rule == 1 {
//!             let b = self.0.pop().unwrap();
//!             let a = self.0.pop().unwrap();
//!             self.0.push(a + b);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let grammar = Grammar::parse("Start -> E\nE -> E plus num\nE -> num\n").unwrap();
//! let lexicon = Lexicon::parse("num: <emit> [0-9]+\nplus: <emit> \\+\n").unwrap();
//! let parser = Parser::new(grammar, &lexicon).unwrap();
//!
//! let mut sum = Sum(Vec::new());
//! parser.parse("1+2+39", &mut sum).unwrap();
//! assert_eq!(sum.0, [42]);
//! ```

pub mod error;
pub mod grammar;
pub mod lexicon;
pub mod parser;
pub mod slr;
pub mod symtab;
pub mod tokenizer;

pub use error::{GrammarError, LexiconError, ParseError, Span};
pub use grammar::{Grammar, Rule, Symbol};
pub use lexicon::{LexRule, Lexicon};
pub use parser::{Parser, ParserDriver, ParserStats, Token};
pub use slr::{Action, ParseTable};
pub use tokenizer::{Lexeme, Lexemes, Tokenizer};
