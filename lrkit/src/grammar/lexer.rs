//! Tokenizer for grammar descriptions.
//!
//! Grammar text is line oriented: each production is `Lhs -> sym sym ...`
//! terminated by a line feed. Identifiers starting with an uppercase letter
//! are nonterminals, identifiers starting with a lowercase letter are
//! terminals, `--` starts a comment that runs to the end of the line.
//! Symbols are interned into the [`LexContext`] as they are met, so indices
//! follow first appearance.
use crate::error::GrammarError;
use crate::symtab::Symtab;
use logos::Logos;

/// Symbol tables filled while tokenizing a grammar description.
#[derive(Default, Debug)]
pub struct LexContext {
    /// Terminal symbols.
    pub terms: Symtab,

    /// Nonterminal symbols.
    pub nonterms: Symtab,
}

/// Tokens produced by the grammar tokenizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A nonterminal symbol (e.g., `Sums`), by index into `nonterms`.
    NonTerm(usize),

    /// The production arrow (`->`).
    Prod,

    /// A terminal symbol (e.g., `plus`), by index into `terms`.
    Term(usize),

    /// A line feed, ending a production.
    LineFeed,
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\f\r]+")]
enum LogosToken {
    #[token("\n")]
    LineFeed,

    #[regex(r"--[^\n]*")]
    Comment,

    #[token("->")]
    Prod,

    #[regex(r"[a-z][a-zA-Z0-9_]*")]
    Term,

    #[regex(r"[A-Z][a-zA-Z0-9_]*")]
    NonTerm,
}

/// Output of [`tokenize_all`]: the token stream and, for every token, the
/// 1-based grammar line it was read from.
#[derive(Debug, Default)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub lines: Vec<usize>,
}

/// Tokenizes a whole grammar description.
pub fn tokenize_all(input: &str, ctx: &mut LexContext) -> Result<Lexed, GrammarError> {
    let mut inner = LogosToken::lexer(input);
    let mut out = Lexed::default();
    let mut line = 1;
    while let Some(kind) = inner.next() {
        let slice = inner.slice();
        let tok = match kind {
            Ok(LogosToken::Comment) => continue,
            Ok(LogosToken::LineFeed) => Token::LineFeed,
            Ok(LogosToken::Prod) => Token::Prod,
            Ok(LogosToken::Term) => Token::Term(ctx.terms.add(slice)),
            Ok(LogosToken::NonTerm) => Token::NonTerm(ctx.nonterms.add(slice)),
            Err(()) => {
                return Err(GrammarError::Lex {
                    line,
                    text: slice.into(),
                });
            }
        };
        out.tokens.push(tok);
        out.lines.push(line);
        if matches!(out.tokens.last(), Some(Token::LineFeed)) {
            line += 1;
        }
    }
    Ok(out)
}
