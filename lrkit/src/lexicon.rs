//! Lexicon descriptions: named token patterns in declaration order.
//!
//! ```text
//! -- fragments, usable as {{NAME}} in later lines
//! DIGIT = [0-9]
//!
//! number:     <emit> {{DIGIT}}+
//! plus:       <emit> \+
//! whitespace: <skip> \s+
//! ```
//!
//! `<emit>` rules produce tokens whose name is matched against the grammar
//! terminals, `<skip>` rules are consumed and dropped.

use crate::error::LexiconError;
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use smartstring::alias::String;
use std::collections::{HashMap, HashSet};
use std::path::Path;

static VAR_DEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^([A-Z_][A-Z0-9_]*)\s*=\s*(.*)$"#).unwrap());

static LEX_RULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^([A-Za-z_][A-Za-z0-9_]*)\s*:\s*<([^>]*)>\s*(.+)$"#).unwrap());

static VAR_IN_REGEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}"#).unwrap());

const MAX_EXPANSION_DEPTH: usize = 64;

/// One named pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexRule {
    pub name: String,
    /// The pattern with all fragments expanded.
    pub pattern: String,
    /// Matches of this rule are consumed without producing a token.
    pub skip: bool,
    /// Line of the description the rule was read from, 0 for rules added
    /// through the builder methods.
    pub line_no: usize,
}

/// An ordered set of token patterns.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    rules: Vec<LexRule>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a lexicon from its text description.
    pub fn parse(text: &str) -> Result<Self, LexiconError> {
        let mut vars: HashMap<String, String> = HashMap::new();
        let mut lexicon = Self::new();

        for (i, raw_line) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw_line.trim();

            if line.is_empty() || line.starts_with("--") {
                continue;
            }

            if let Some(cap) = VAR_DEF_RE.captures(line) {
                let value = expand_vars(cap[2].trim(), &vars, line_no)?;
                vars.insert(cap[1].into(), value);
                continue;
            }

            if let Some(cap) = LEX_RULE_RE.captures(line) {
                let skip = match cap[2].trim() {
                    "emit" => false,
                    "skip" => true,
                    other => {
                        return Err(LexiconError::Mode {
                            line: line_no,
                            mode: other.into(),
                        });
                    }
                };
                lexicon.rules.push(LexRule {
                    name: cap[1].into(),
                    pattern: expand_vars(cap[3].trim(), &vars, line_no)?,
                    skip,
                    line_no,
                });
                continue;
            }

            return Err(LexiconError::Syntax {
                line: line_no,
                text: line.into(),
            });
        }

        lexicon.validate()?;
        log::debug!("lexicon: {} rules", lexicon.rules.len());
        Ok(lexicon)
    }

    /// Reads a lexicon description from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("can't read lexicon {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid lexicon {}", path.display()))
    }

    /// Appends an emitted rule.
    ///
    /// # Example
    /// ```rust
    /// # use lrkit::Lexicon;
    /// let lex = Lexicon::new().emit("word", "[a-z]+").skip("space", " +");
    /// assert_eq!(lex.rules().len(), 2);
    /// assert!(lex.rules()[1].skip);
    /// ```
    pub fn emit(self, name: &str, pattern: &str) -> Self {
        self.with_rule(name, pattern, false)
    }

    /// Appends a skipped rule.
    pub fn skip(self, name: &str, pattern: &str) -> Self {
        self.with_rule(name, pattern, true)
    }

    pub fn with_rule(mut self, name: &str, pattern: &str, skip: bool) -> Self {
        self.rules.push(LexRule {
            name: name.into(),
            pattern: pattern.into(),
            skip,
            line_no: 0,
        });
        self
    }

    pub fn rules(&self) -> &[LexRule] {
        &self.rules
    }

    /// Index of the rule called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.rules.iter().position(|r| r.name == name)
    }

    /// Checks that the lexicon has rules and that their names are unique.
    pub fn validate(&self) -> Result<(), LexiconError> {
        if self.rules.is_empty() {
            return Err(LexiconError::Empty);
        }
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.name.as_str()) {
                return Err(LexiconError::Duplicate {
                    name: rule.name.clone(),
                });
            }
        }
        Ok(())
    }
}

fn expand_vars(
    input: &str,
    vars: &HashMap<String, String>,
    line: usize,
) -> Result<String, LexiconError> {
    let mut out = std::string::String::from(input);
    let mut seen_any = true;
    let mut depth = 0;

    while seen_any {
        depth += 1;
        if depth > MAX_EXPANSION_DEPTH {
            return Err(LexiconError::ExpansionDepth { line });
        }

        seen_any = false;
        let mut missing: Vec<std::string::String> = Vec::new();

        let expanded = VAR_IN_REGEX_RE
            .replace_all(&out, |caps: &Captures| match vars.get(&caps[1]) {
                Some(val) => {
                    seen_any = true;
                    format!("(?:{val})")
                }
                None => {
                    missing.push(caps[1].to_owned());
                    caps[0].to_owned()
                }
            })
            .into_owned();

        if !missing.is_empty() {
            missing.sort_unstable();
            missing.dedup();
            return Err(LexiconError::UnknownVariable {
                line,
                names: missing.join(", ").into(),
            });
        }
        out = expanded;
    }
    Ok(out.into())
}
