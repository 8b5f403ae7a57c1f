//! LR(0) item machinery, FIRST/FOLLOW sets and SLR(1) table construction.
//!
//! All functions here operate on the integer encoding produced by
//! [`Grammar::encode`]: every production is a vector whose element 0 is the
//! left-hand side, symbols below `n_nonterm` are nonterminals and the last
//! terminal is the end marker.

use crate::error::GrammarError;
use crate::grammar::Grammar;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{self, Write};

/// An LR(0) item: a production and the position of the dot in it.
///
/// `dot` counts from the left-hand side, so `dot == 1` means nothing of the
/// right-hand side has been recognized yet and `dot == prod.len()` means the
/// item is complete.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Item {
    pub prod: usize,
    pub dot: usize,
}

pub type ItemSet = BTreeSet<Item>;

/// Computes the LR(0) closure of `items`.
pub fn closure(items: &ItemSet, prods: &[Vec<usize>], n_nonterm: usize) -> ItemSet {
    let mut c = items.clone();
    let mut pending: Vec<Item> = items.iter().copied().collect();
    while let Some(item) = pending.pop() {
        let Some(&t) = prods[item.prod].get(item.dot) else {
            continue;
        };
        if t >= n_nonterm {
            continue;
        }
        for (j, p) in prods.iter().enumerate() {
            if p[0] == t {
                let new_item = Item { prod: j, dot: 1 };
                if c.insert(new_item) {
                    pending.push(new_item);
                }
            }
        }
    }
    c
}

/// Advances every item of `items` that expects `sym` and closes the result.
pub fn goto(items: &ItemSet, sym: usize, prods: &[Vec<usize>], n_nonterm: usize) -> ItemSet {
    let moved: ItemSet = items
        .iter()
        .filter(|item| prods[item.prod].get(item.dot) == Some(&sym))
        .map(|item| Item {
            prod: item.prod,
            dot: item.dot + 1,
        })
        .collect();
    closure(&moved, prods, n_nonterm)
}

/// The canonical LR(0) collection, states numbered in discovery order, and
/// the transitions found while building it.
///
/// State 0 is the closure of the start item.
pub fn construct_set(
    prods: &[Vec<usize>],
    n_nonterm: usize,
) -> (Vec<ItemSet>, Vec<BTreeMap<usize, usize>>) {
    let start = closure(&ItemSet::from([Item { prod: 0, dot: 1 }]), prods, n_nonterm);
    let mut states = vec![start.clone()];
    let mut index = BTreeMap::from([(start, 0)]);
    let mut edges: Vec<BTreeMap<usize, usize>> = vec![BTreeMap::new()];

    let mut i = 0;
    while i < states.len() {
        let expected: BTreeSet<usize> = states[i]
            .iter()
            .filter_map(|item| prods[item.prod].get(item.dot).copied())
            .collect();
        for sym in expected {
            let nxt = goto(&states[i], sym, prods, n_nonterm);
            let target = match index.get(&nxt) {
                Some(&s) => s,
                None => {
                    let s = states.len();
                    index.insert(nxt.clone(), s);
                    states.push(nxt);
                    edges.push(BTreeMap::new());
                    s
                }
            };
            edges[i].insert(sym, target);
        }
        i += 1;
    }
    (states, edges)
}

/// Computes FIRST sets and nullability for every symbol.
pub fn first_sets(
    prods: &[Vec<usize>],
    n_nonterm: usize,
    n_term: usize,
) -> (Vec<BTreeSet<usize>>, Vec<bool>) {
    let n_sym = n_nonterm + n_term;
    let mut first: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n_sym];
    let mut nullable = vec![false; n_sym];
    for (t, set) in first.iter_mut().enumerate().skip(n_nonterm) {
        set.insert(t);
    }
    let mut changed = true;
    while changed {
        changed = false;
        for prod in prods {
            let lhs = prod[0];
            let mut all_nullable = true;
            for &sym in &prod[1..] {
                let first_sym = first[sym].clone();
                for f in first_sym {
                    changed |= first[lhs].insert(f);
                }
                if !nullable[sym] {
                    all_nullable = false;
                    break;
                }
            }
            if all_nullable && !nullable[lhs] {
                nullable[lhs] = true;
                changed = true;
            }
        }
    }
    (first, nullable)
}

/// Computes FOLLOW sets for every nonterminal. The start symbol (the
/// left-hand side of production 0) is followed by the end marker.
pub fn follow_sets(
    prods: &[Vec<usize>],
    n_nonterm: usize,
    n_term: usize,
    first: &[BTreeSet<usize>],
    nullable: &[bool],
) -> Vec<BTreeSet<usize>> {
    let eos = n_nonterm + n_term - 1;
    let mut follow: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n_nonterm];
    follow[prods[0][0]].insert(eos);
    let mut changed = true;
    while changed {
        changed = false;
        for prod in prods {
            let lhs = prod[0];
            let rhs = &prod[1..];
            for (i, &b) in rhs.iter().enumerate() {
                if b >= n_nonterm {
                    continue;
                }
                let mut beta_nullable = true;
                let mut first_beta = BTreeSet::new();
                for &sym in &rhs[i + 1..] {
                    first_beta.extend(first[sym].iter().copied());
                    if !nullable[sym] {
                        beta_nullable = false;
                        break;
                    }
                }
                if beta_nullable {
                    first_beta.extend(follow[lhs].iter().copied());
                }
                for f in first_beta {
                    changed |= follow[b].insert(f);
                }
            }
        }
    }
    follow
}

/// One cell of the parse table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    /// The input is complete and reduces to the start rule.
    Accept,
    /// Consume the token and enter the state.
    Shift(usize),
    /// Apply the rule with this index.
    Reduce(usize),
    /// After a reduction, enter the state.
    Goto(usize),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Accept => write!(f, "accept"),
            Action::Shift(s) => write!(f, "shift {s}"),
            Action::Reduce(r) => write!(f, "reduce {r}"),
            Action::Goto(s) => write!(f, "goto {s}"),
        }
    }
}

/// An SLR(1) parse table: one row per LR(0) state, one column per symbol
/// with nonterminals first and terminals after them.
#[derive(Debug, Clone)]
pub struct ParseTable {
    states: Vec<ItemSet>,
    cells: Vec<Vec<Option<Action>>>,
    n_nonterm: usize,
}

impl ParseTable {
    /// Builds the table for `grammar`, failing on the first cell that would
    /// hold two different actions.
    pub fn build(grammar: &Grammar) -> Result<Self, GrammarError> {
        let prods = grammar.encode();
        let n_nonterm = grammar.n_nonterms();
        let n_term = grammar.n_terms();
        let n_sym = n_nonterm + n_term;
        let eos = n_sym - 1;

        let (states, edges) = construct_set(&prods, n_nonterm);
        let (first, nullable) = first_sets(&prods, n_nonterm, n_term);
        let follow = follow_sets(&prods, n_nonterm, n_term, &first, &nullable);

        let mut tab: Vec<Vec<BTreeSet<Action>>> = vec![vec![BTreeSet::new(); n_sym]; states.len()];
        for (state, items) in states.iter().enumerate() {
            for (&sym, &target) in &edges[state] {
                let act = if sym < n_nonterm {
                    Action::Goto(target)
                } else {
                    Action::Shift(target)
                };
                tab[state][sym].insert(act);
            }
            for item in items.iter().filter(|it| it.dot == prods[it.prod].len()) {
                if item.prod == 0 {
                    tab[state][eos].insert(Action::Accept);
                } else {
                    for &t in &follow[prods[item.prod][0]] {
                        tab[state][t].insert(Action::Reduce(item.prod));
                    }
                }
            }
        }

        let names = grammar.symbol_names();
        let mut cells = Vec::with_capacity(tab.len());
        for (state, row) in tab.into_iter().enumerate() {
            let mut out = Vec::with_capacity(n_sym);
            for (sym, acts) in row.into_iter().enumerate() {
                if acts.len() > 1 {
                    let actions = acts
                        .iter()
                        .map(|a| a.to_string())
                        .collect::<Vec<_>>()
                        .join(" / ");
                    return Err(GrammarError::Conflict {
                        state,
                        symbol: names[sym].clone(),
                        actions: actions.into(),
                    });
                }
                out.push(acts.into_iter().next());
            }
            cells.push(out);
        }

        log::debug!("parse table: {} states, {} symbols", states.len(), n_sym);
        Ok(Self {
            states,
            cells,
            n_nonterm,
        })
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn start_state(&self) -> usize {
        0
    }

    /// The action for `state` on the terminal with index `terminal`.
    #[inline]
    pub fn action(&self, state: usize, terminal: usize) -> Option<Action> {
        self.cells
            .get(state)?
            .get(self.n_nonterm + terminal)
            .copied()
            .flatten()
    }

    /// The state entered from `state` after reducing to `nonterm`.
    #[inline]
    pub fn goto(&self, state: usize, nonterm: usize) -> Option<usize> {
        match self.cells.get(state)?.get(nonterm).copied().flatten() {
            Some(Action::Goto(s)) => Some(s),
            _ => None,
        }
    }

    /// Terminals that have an action in `state`.
    pub fn expected(&self, state: usize) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .get(state)
            .into_iter()
            .flat_map(move |row| row[self.n_nonterm..].iter().enumerate())
            .filter_map(|(t, a)| a.map(|_| t))
    }

    /// Writes the item sets, FIRST and FOLLOW sets and every non-empty
    /// table cell in a readable form.
    pub fn write_tables<W: Write>(&self, grammar: &Grammar, out: &mut W) -> io::Result<()> {
        let prods = grammar.encode();
        let names = grammar.symbol_names();
        let n_term = grammar.n_terms();

        writeln!(out, "STATES {}", self.states.len())?;
        for (i, state) in self.states.iter().enumerate() {
            writeln!(out)?;
            writeln!(out, "state {i}")?;
            for item in state {
                let p = &prods[item.prod];
                write!(out, "    {} ->", names[p[0]])?;
                for (j, &t) in p.iter().enumerate().skip(1) {
                    if j == item.dot {
                        write!(out, " .")?;
                    }
                    write!(out, " {}", names[t])?;
                }
                if item.dot == p.len() {
                    write!(out, " .")?;
                }
                writeln!(out)?;
            }
            for (sym, cell) in self.cells[i].iter().enumerate() {
                if let Some(act) = cell {
                    writeln!(out, "    on {} {}", names[sym], act)?;
                }
            }
        }

        let (first, nullable) = first_sets(&prods, self.n_nonterm, n_term);
        let follow = follow_sets(&prods, self.n_nonterm, n_term, &first, &nullable);
        writeln!(out)?;
        write_fstflw(out, "FIRST", &first[..self.n_nonterm], Some(&nullable), &names)?;
        writeln!(out)?;
        write_fstflw(out, "FOLLOW", &follow, None, &names)
    }
}

fn write_fstflw<W: Write>(
    out: &mut W,
    label: &str,
    sets: &[BTreeSet<usize>],
    nullable: Option<&[bool]>,
    names: &[smartstring::alias::String],
) -> io::Result<()> {
    for (sym, set) in sets.iter().enumerate() {
        write!(out, "{label} {} = {{", names[sym])?;
        let mut members: Vec<&str> = set.iter().map(|&t| names[t].as_str()).collect();
        if nullable.is_some_and(|n| n[sym]) {
            members.insert(0, "`empty'");
        }
        writeln!(out, "{}}}", members.join(", "))?;
    }
    Ok(())
}
