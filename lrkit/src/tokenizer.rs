//! Longest-match tokenizer over a compiled [`Lexicon`].
//!
//! All patterns go into one anchored dense DFA. At each position the DFA is
//! run until it dies or the input ends; the last match seen wins, and among
//! rules matching the same length the earliest declared one is chosen.
//! Rules marked `<skip>` are consumed silently.

use crate::error::{LexiconError, ParseError, Span};
use crate::lexicon::Lexicon;
use regex_automata::{
    Anchored, Input, MatchKind,
    dfa::{Automaton, StartKind, dense},
    nfa::thompson,
    util::syntax,
};
use std::iter::FusedIterator;

/// A matched lexicon rule and the bytes it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    /// Index of the rule in the lexicon.
    pub rule: usize,
    pub span: Span,
}

/// A compiled lexicon. Immutable and shareable between threads; every call
/// to [`Tokenizer::tokenize`] gets its own cursor.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    dfa: dense::DFA<Vec<u32>>,
    skip: Vec<bool>,
}

impl Tokenizer {
    /// Compiles all rules of `lexicon` into a single DFA.
    pub fn new(lexicon: &Lexicon) -> Result<Self, LexiconError> {
        lexicon.validate()?;
        let patterns: Vec<&str> = lexicon.rules().iter().map(|r| r.pattern.as_str()).collect();
        let dfa = dense::Builder::new()
            .syntax(syntax::Config::new().unicode(false).utf8(false))
            .thompson(thompson::Config::new().utf8(false))
            .configure(
                dense::DFA::config()
                    .match_kind(MatchKind::All)
                    .start_kind(StartKind::Anchored),
            )
            .build_many(&patterns)?;
        log::debug!(
            "tokenizer: {} patterns, {} bytes of DFA",
            patterns.len(),
            dfa.memory_usage()
        );
        Ok(Self {
            dfa,
            skip: lexicon.rules().iter().map(|r| r.skip).collect(),
        })
    }

    /// Number of rules the tokenizer was built from.
    pub fn len(&self) -> usize {
        self.skip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skip.is_empty()
    }

    /// Lazily splits `text` into lexemes, dropping skipped rules.
    ///
    /// # Example
    /// ```rust
    /// # use lrkit::{Lexicon, Tokenizer, Span};
    /// let lex = Lexicon::new().emit("num", "[0-9]+").emit("plus", r"\+").skip("ws", " +");
    /// let tk = Tokenizer::new(&lex).unwrap();
    /// let rules: Vec<usize> = tk.tokenize("12 + 3").map(|l| l.unwrap().rule).collect();
    /// assert_eq!(rules, [0, 1, 0]);
    /// ```
    pub fn tokenize<'t>(&'t self, text: &'t str) -> Lexemes<'t> {
        Lexemes {
            tokenizer: self,
            text,
            pos: 0,
            done: false,
        }
    }

    /// Finds the longest match at the start of `bytes`. Returns the rule
    /// index and the match length, or `None` when nothing matches.
    pub fn longest_match(&self, bytes: &[u8]) -> Result<Option<(usize, usize)>, ParseError> {
        let dfa = &self.dfa;
        let mut state = dfa
            .start_state_forward(&Input::new(bytes).anchored(Anchored::Yes))
            .map_err(|e| ParseError::Internal(e.to_string().into()))?;
        let mut last_match = None;

        for (i, &b) in bytes.iter().enumerate() {
            state = dfa.next_state(state, b);
            if !dfa.is_special_state(state) {
                continue;
            }
            if dfa.is_match_state(state) {
                // matches are delayed by one byte: this one ends before `b`
                last_match = Some((self.best_pattern(state), i));
            } else if dfa.is_dead_state(state) || dfa.is_quit_state(state) {
                log::trace!("DEAD: i={}, b={:?}", i, b as char);
                return Ok(last_match);
            }
        }

        state = dfa.next_eoi_state(state);
        if dfa.is_match_state(state) {
            last_match = Some((self.best_pattern(state), bytes.len()));
        }
        Ok(last_match)
    }

    /// Lowest pattern index among those matching in `state`.
    fn best_pattern(&self, state: regex_automata::util::primitives::StateID) -> usize {
        (0..self.dfa.match_len(state))
            .map(|i| self.dfa.match_pattern(state, i).as_usize())
            .min()
            .unwrap_or(0)
    }
}

/// Iterator returned by [`Tokenizer::tokenize`]. Yields at most one error,
/// after which it is exhausted.
#[derive(Debug, Clone)]
pub struct Lexemes<'t> {
    tokenizer: &'t Tokenizer,
    text: &'t str,
    pos: usize,
    done: bool,
}

impl Lexemes<'_> {
    fn fail(&mut self) -> ParseError {
        self.done = true;
        let width = self
            .text
            .get(self.pos..)
            .and_then(|s| s.chars().next())
            .map_or(1, char::len_utf8);
        ParseError::Lexical {
            span: Span::new(self.pos, self.pos + width),
        }
    }
}

impl Iterator for Lexemes<'_> {
    type Item = Result<Lexeme, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done && self.pos < self.text.len() {
            let rest = &self.text.as_bytes()[self.pos..];
            let (rule, len) = match self.tokenizer.longest_match(rest) {
                Ok(Some((rule, len))) if len > 0 => (rule, len),
                Ok(_) => return Some(Err(self.fail())),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            let span = Span::new(self.pos, self.pos + len);
            self.pos += len;
            log::trace!("MATCHED: rule={}, span={}, text={:?}", rule, span, span.slice(self.text));
            if !self.tokenizer.skip[rule] {
                return Some(Ok(Lexeme { rule, span }));
            }
        }
        self.done = true;
        None
    }
}

impl FusedIterator for Lexemes<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn _assert_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn tokenizer_is_send_sync() {
        _assert_send_sync_static::<Tokenizer>();
    }

    fn lexicon() -> Lexicon {
        Lexicon::parse(
            r#"
ident:  <emit> [a-zA-Z]\w*
number: <emit> ([1-9]\d*|0)(\.\d+)?
minus:  <emit> \-
arrow:  <emit> \->
let:    <emit> let
ws:     <skip> \s+
"#,
        )
        .unwrap()
    }

    fn lex(text: &str) -> Vec<(usize, &str)> {
        let lex = lexicon();
        let tk = Tokenizer::new(&lex).unwrap();
        tk.tokenize(text)
            .map(|l| {
                let l = l.unwrap();
                (l.rule, l.span.slice(text))
            })
            .collect()
    }

    #[test]
    fn longest_match_wins() {
        init_logger();
        assert_eq!(lex("a->b"), [(0, "a"), (3, "->"), (0, "b")]);
        assert_eq!(lex("12.5-x"), [(1, "12.5"), (2, "-"), (0, "x")]);
    }

    #[test]
    fn earliest_rule_wins_ties() {
        // `let` is also an identifier, and ident is declared first
        assert_eq!(lex("let letter"), [(0, "let"), (0, "letter")]);
    }

    #[test]
    fn incomplete_longer_match_backs_off() {
        // `1.` can't finish a number, so the number ends before the dot
        let lex = lexicon();
        let tk = Tokenizer::new(&lex).unwrap();
        let mut it = tk.tokenize("1.x");
        assert_eq!(
            it.next(),
            Some(Ok(Lexeme {
                rule: 1,
                span: Span::new(0, 1)
            }))
        );
        assert_eq!(
            it.next(),
            Some(Err(ParseError::Lexical {
                span: Span::new(1, 2)
            }))
        );
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn whitespace_only_yields_nothing() {
        assert!(lex("  \t\n ").is_empty());
        assert!(lex("").is_empty());
    }

    #[test]
    fn leading_zero_splits_number() {
        assert_eq!(lex("007"), [(1, "0"), (1, "0"), (1, "7")]);
    }

    #[test]
    fn unknown_character_spans_whole_char() {
        let lex = lexicon();
        let tk = Tokenizer::new(&lex).unwrap();
        let text = "x é";
        let errs: Vec<_> = tk.tokenize(text).filter_map(Result::err).collect();
        assert_eq!(
            errs,
            [ParseError::Lexical {
                span: Span::new(2, 4)
            }]
        );
    }

    #[test]
    fn empty_match_is_lexical_error() {
        let lex = Lexicon::new().emit("as", "a*");
        let tk = Tokenizer::new(&lex).unwrap();
        let got: Vec<_> = tk.tokenize("aab").collect();
        assert_eq!(got.len(), 2);
        assert_eq!(
            got[1],
            Err(ParseError::Lexical {
                span: Span::new(2, 3)
            })
        );
    }

    #[test]
    fn invalid_pattern_fails_to_build() {
        let lex = Lexicon::new().emit("bad", "(a");
        assert!(matches!(Tokenizer::new(&lex), Err(LexiconError::Build(_))));
    }
}
