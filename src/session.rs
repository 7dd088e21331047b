/*
    This module keeps the active grammar between calls
*/

use std::fmt::Display;

use itertools::Itertools;
use log::{debug, info};
use rand::Rng;

use crate::cleaner::{clean, Cleaned};
use crate::cnf::{convert, CnfGrammar};
use crate::cyk::recognise;
use crate::error_handling::*;
use crate::generator::{self, GenResult, GenerateOptions, GenerationError};
use crate::grammar::*;
use crate::parser::{grammar_from_rows, LineResult, Row};
use crate::tree::{reconstruct, Tree};

#[derive(Debug, Clone, PartialEq)]
pub struct Limits {
    // Longest input the recognizer accepts, in tokens
    pub max_tokens: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits { max_tokens: 30 }
    }
}

#[derive(Debug, PartialEq)]
pub enum ValidationError {
    NoGrammar,
    TooManyTokens { count: usize, limit: usize },
    // The input was accepted but its derivation could not be rebuilt
    Reconstruction(Tree),
}

impl ErrorType for ValidationError {}

impl Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NoGrammar => write!(f, "Grammar is not set"),
            ValidationError::TooManyTokens { count, limit } => write!(f, "Input has {} tokens, at most {} are allowed", count, limit),
            ValidationError::Reconstruction(tree) => write!(f, "Derivation tree is incomplete:\n{}", tree),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Recognition {
    pub accepted: bool,
    pub tree: Option<Tree>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrammarSummary {
    pub variables: usize,
    pub productions: usize,
    pub cnf_variables: usize,
    pub cnf_productions: usize,
    // Variables introduced by the conversion
    pub synthetic: usize,
    pub cnf_start: String,
    pub removed: Vec<String>,
}

impl Display for GrammarSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Grammar: {} variables, {} productions", self.variables, self.productions)?;
        writeln!(
            f,
            "Chomsky normal form: {} variables ({} new), {} productions, start `{}`",
            self.cnf_variables, self.synthetic, self.cnf_productions, self.cnf_start
        )?;
        if !self.removed.is_empty() {
            writeln!(f, "Removed: {}", self.removed.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct ActiveGrammar {
    cleaned: Grammar,
    cnf: CnfGrammar,
}

impl ActiveGrammar {
    fn build(start: &str, rows: &[Row]) -> LineResult<(ActiveGrammar, GrammarSummary)> {
        let Cleaned { grammar, useless, unreachable } = clean(grammar_from_rows(start, rows)?)?;
        let cnf = convert(&grammar);

        let summary = GrammarSummary {
            variables: grammar.rules.len(),
            productions: grammar.production_count(),
            cnf_variables: cnf.grammar.rules.len(),
            cnf_productions: cnf.grammar.production_count(),
            synthetic: cnf.grammar.rules.keys().filter(|v| v.origin() != Origin::Declared).count(),
            cnf_start: cnf.start().name().to_string(),
            removed: useless.iter().chain(&unreachable).map(|v| v.name().to_string()).collect(),
        };

        Ok((ActiveGrammar { cleaned: grammar, cnf }, summary))
    }

    // ε belongs to the language
    fn accepts_empty(&self) -> bool {
        self.cleaned.has_epsilon_rule(&self.cleaned.start_symbol) || self.cnf.accepts_empty()
    }
}

// The grammar currently in use, and the last derivation tree found with it.
#[derive(Debug, Default)]
pub struct Session {
    limits: Limits,
    active: Option<ActiveGrammar>,
    last_tree: Option<Tree>,
}

impl Session {
    pub fn new(limits: Limits) -> Self {
        Session {
            limits,
            active: None,
            last_tree: None,
        }
    }

    // Validates, cleans and converts `rows`, then makes the result the
    // active grammar. On failure the previous grammar stays active.
    pub fn set_grammar(&mut self, start: &str, rows: &[Row]) -> LineResult<GrammarSummary> {
        let (active, summary) = ActiveGrammar::build(start, rows)?;

        info!("Active grammar starts at `{}`", active.cleaned.start_symbol);
        self.active = Some(active);
        self.last_tree = None;
        Ok(summary)
    }

    pub fn grammar(&self) -> Option<&Grammar> {
        self.active.as_ref().map(|active| &active.cleaned)
    }

    pub fn cnf(&self) -> Option<&CnfGrammar> {
        self.active.as_ref().map(|active| &active.cnf)
    }

    pub fn generate<R: Rng>(&self, options: &GenerateOptions, rng: &mut R) -> GenResult {
        let active = self.active.as_ref().ok_or(GenerationError::NoGrammar)?;
        generator::generate(&active.cleaned, options, rng)
    }

    // Decides whether `tokens` is a sentence of the active grammar. An
    // accepted input also becomes the last tree.
    pub fn validate<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<Recognition, ValidationError> {
        if tokens.len() > self.limits.max_tokens {
            return Err(ValidationError::TooManyTokens {
                count: tokens.len(),
                limit: self.limits.max_tokens,
            });
        }
        let active = self.active.as_ref().ok_or(ValidationError::NoGrammar)?;
        self.last_tree = None;

        let start = &active.cleaned.start_symbol;
        if tokens.is_empty() {
            if !active.accepts_empty() {
                return Ok(Recognition { accepted: false, tree: None });
            }
            let tree = Tree::node(start.name(), vec![Tree::Epsilon]);
            self.last_tree = Some(tree.clone());
            return Ok(Recognition { accepted: true, tree: Some(tree) });
        }

        let table = recognise(&active.cnf, tokens);
        if !table.derives(active.cnf.start()) {
            debug!("Rejected `{}`", tokens.iter().map(|token| token.as_ref()).join(" "));
            return Ok(Recognition { accepted: false, tree: None });
        }

        let tree = reconstruct(&table, &active.cnf).relabel(start.name());
        if !tree.is_complete() {
            return Err(ValidationError::Reconstruction(tree));
        }

        self.last_tree = Some(tree.clone());
        Ok(Recognition { accepted: true, tree: Some(tree) })
    }

    pub fn last_tree(&self) -> Option<&Tree> {
        self.last_tree.as_ref()
    }
}
