use super::lexer::Token;
use chumsky::prelude::*;

/// A right-hand-side symbol, by index into the terminal or nonterminal table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Term(usize),
    NonTerm(usize),
}

/// One production: `lhs -> rhs...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub lhs: usize,
    pub rhs: Vec<Symbol>,
}

pub type Extra<'a> = extra::Err<Simple<'a, Token>>;

/// Parses a token stream into productions, skipping blank lines.
pub fn parser<'a>() -> impl Parser<'a, &'a [Token], Vec<Rule>, Extra<'a>> {
    let symbol = select! {
        Token::Term(t) => Symbol::Term(t),
        Token::NonTerm(n) => Symbol::NonTerm(n),
    }
    .labelled("symbol");

    let rhs = symbol.repeated().collect::<Vec<_>>();

    let lhs = select! {
        Token::NonTerm(n) => n,
    }
    .labelled("left");

    let arrow = select! { Token::Prod => () }.labelled("arrow");
    let lf = select! { Token::LineFeed => () }.labelled("line feed");

    let production = lhs
        .then_ignore(arrow)
        .then(rhs)
        .then_ignore(lf.clone())
        .map(|(lhs, rhs)| Some(Rule { lhs, rhs }));

    let empty_line = lf.map(|_| None::<Rule>);

    production
        .or(empty_line)
        .repeated()
        .collect::<Vec<_>>()
        .map(|items| items.into_iter().flatten().collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_production() {
        let tokens = vec![
            Token::NonTerm(1),
            Token::Prod,
            Token::Term(2),
            Token::NonTerm(3),
            Token::LineFeed,
        ];
        let rules = parser().parse(tokens.as_slice()).into_result().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].lhs, 1);
        assert_eq!(rules[0].rhs, vec![Symbol::Term(2), Symbol::NonTerm(3)]);
    }

    #[test]
    fn empty_lines_are_skipped() {
        let tokens = vec![Token::LineFeed, Token::LineFeed];
        let rules = parser().parse(tokens.as_slice()).into_result().unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn empty_rhs_and_following_rule() {
        let tokens = vec![
            Token::NonTerm(0),
            Token::Prod,
            Token::LineFeed,
            Token::NonTerm(2),
            Token::Prod,
            Token::Term(5),
            Token::LineFeed,
        ];
        let rules = parser().parse(tokens.as_slice()).into_result().unwrap();
        assert_eq!(rules.len(), 2);
        assert!(rules[0].rhs.is_empty());
        assert_eq!(rules[1].rhs, vec![Symbol::Term(5)]);
    }

    #[test]
    fn missing_arrow_is_rejected_at_its_token() {
        let tokens = vec![
            Token::NonTerm(0),
            Token::Prod,
            Token::Term(1),
            Token::LineFeed,
            Token::NonTerm(0),
            Token::Term(1),
            Token::LineFeed,
        ];
        let errs = parser().parse(tokens.as_slice()).into_result().unwrap_err();
        assert!(!errs.is_empty());
        assert!(errs.iter().any(|e| e.span().start >= 4));
    }
}
