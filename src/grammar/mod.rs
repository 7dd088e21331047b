/*
    This module is for storing and manipulating grammars
*/

use std::collections::BTreeMap;
use std::fmt::Display;

use itertools::Itertools;
use log::{error, trace};

pub const EPSILON: &str = "ε";

// Why a variable exists. Decided once when the variable is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Origin {
    // Written by the user
    Declared,
    // Replacement start for a start symbol that derives ε
    Start,
    // One link of a right-factored long right-hand side
    Chain,
    // Stands in for a single terminal next to another symbol
    Wrapper,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    name: String,
    origin: Origin,
}

impl Variable {
    pub fn new(name: String, origin: Origin) -> Self {
        Variable { name, origin }
    }

    pub fn declared(name: &str) -> Self {
        Variable::new(name.to_string(), Origin::Declared)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn is_chain(&self) -> bool {
        self.origin == Origin::Chain
    }

    pub fn is_wrapper(&self) -> bool {
        self.origin == Origin::Wrapper
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

// Whether `text` names a variable: `[A-Z][A-Za-z0-9_]*'?`.
pub fn is_variable_name(text: &str) -> bool {
    let mut chars = text.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_uppercase()) {
        return false;
    }
    let rest = chars.as_str();
    let body = rest.strip_suffix('\'').unwrap_or(rest);
    body.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// The base unit in a grammar rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Terminal(String),
    Variable(Variable),
    Epsilon,
}

impl Symbol {
    // Tags a word from a right-hand side. This is the only place the lexical
    // variable rule is applied.
    pub fn classify(word: &str) -> Symbol {
        if word == EPSILON {
            Symbol::Epsilon
        } else if is_variable_name(word) {
            Symbol::Variable(Variable::declared(word))
        } else {
            Symbol::Terminal(word.to_string())
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Symbol::Variable(v) => Some(v),
            _ => None,
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Terminal(t) => write!(f, "{}", t),
            Symbol::Variable(v) => write!(f, "{}", v),
            Symbol::Epsilon => write!(f, "{}", EPSILON),
        }
    }
}

// The symbols in a single alternative
pub type Alternative = Vec<Symbol>;

// The alternatives of a rewrite rule
pub type Rewrite = Vec<Alternative>;

pub type Rules = BTreeMap<Variable, Rewrite>;

pub fn is_epsilon(alternative: &[Symbol]) -> bool {
    alternative == [Symbol::Epsilon]
}

pub fn is_unit(alternative: &[Symbol]) -> bool {
    matches!(alternative, [Symbol::Variable(_)])
}

pub fn variables_of(alternative: &[Symbol]) -> impl Iterator<Item = &Variable> {
    alternative.iter().filter_map(Symbol::as_variable)
}

// Appends an alternative unless the rewrite already has it
pub fn push_unique(rewrite: &mut Rewrite, alternative: Alternative) -> bool {
    if rewrite.contains(&alternative) {
        false
    } else {
        rewrite.push(alternative);
        true
    }
}

pub fn format_alternative(alternative: &[Symbol]) -> String {
    alternative.iter().join(" ")
}

// Repeats a monotone update until `step` reports that nothing changed.
//
// Every update in this crate grows a set bounded by the number of
// variables, so `limit` passes are never needed for a correct model; hitting
// the limit is logged as an error and the loop stops with what it has.
pub fn fixpoint(what: &str, limit: usize, mut step: impl FnMut() -> bool) {
    for pass in 1..=limit {
        if !step() {
            trace!("{} settled after {} passes", what, pass);
            return;
        }
    }
    error!("{} did not settle within {} passes", what, limit);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    pub start_symbol: Variable,
    pub rules: Rules,
}

impl Grammar {
    pub fn rewrite(&self, variable: &Variable) -> Option<&Rewrite> {
        self.rules.get(variable)
    }

    pub fn productions(&self) -> impl Iterator<Item = (&Variable, &Alternative)> {
        self.rules
            .iter()
            .flat_map(|(variable, rewrite)| rewrite.iter().map(move |alternative| (variable, alternative)))
    }

    pub fn production_count(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn has_epsilon_rule(&self, variable: &Variable) -> bool {
        self.rewrite(variable)
            .is_some_and(|rewrite| rewrite.iter().any(|alternative| is_epsilon(alternative)))
    }
}

impl Display for Grammar {
    // Start symbol first, the rest in name order
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let start = self.rules.get_key_value(&self.start_symbol);
        let rest = self.rules.iter().filter(|(variable, _)| **variable != self.start_symbol);
        for (variable, rewrite) in start.into_iter().chain(rest) {
            writeln!(f, "{} -> {}", variable, rewrite.iter().map(|a| format_alternative(a)).join(" | "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::iter::zip;

    use super::*;

    #[test]
    fn variable_names() {
        let names = vec!["S", "NP", "Det", "X1", "S'", "A_b2", "s", "1A", "S''", "A-b", "", "'", "Ab'c"];
        let answers = vec![true, true, true, true, true, true, false, false, false, false, false, false, false];

        for (name, answer) in zip(names, answers) {
            assert_eq!(is_variable_name(name), answer, "{:?}", name);
        }
    }

    #[test]
    fn classify_words() {
        assert_eq!(Symbol::classify("NP"), Symbol::Variable(Variable::declared("NP")));
        assert_eq!(Symbol::classify("the"), Symbol::Terminal("the".to_string()));
        assert_eq!(Symbol::classify("+"), Symbol::Terminal("+".to_string()));
        assert_eq!(Symbol::classify("ε"), Symbol::Epsilon);
    }

    #[test]
    fn origin_is_not_read_from_the_name() {
        let declared = Variable::declared("X1");
        let chain = Variable::new("X1".to_string(), Origin::Chain);
        assert!(!declared.is_chain());
        assert!(chain.is_chain());
        assert_ne!(declared, chain);
    }

    #[test]
    fn display_puts_start_first() {
        let mut rules = Rules::new();
        rules.insert(Variable::declared("A"), vec![vec![Symbol::classify("a")]]);
        rules.insert(
            Variable::declared("S"),
            vec![
                vec![Symbol::classify("A"), Symbol::classify("S")],
                vec![Symbol::Epsilon],
            ],
        );
        let grammar = Grammar {
            start_symbol: Variable::declared("S"),
            rules,
        };

        assert_eq!(grammar.to_string(), "S -> A S | ε\nA -> a\n");
        assert_eq!(grammar.production_count(), 3);
        assert!(grammar.has_epsilon_rule(&Variable::declared("S")));
        assert!(!grammar.has_epsilon_rule(&Variable::declared("A")));
    }

    #[test]
    fn push_unique_deduplicates() {
        let mut rewrite = Rewrite::new();
        assert!(push_unique(&mut rewrite, vec![Symbol::classify("a")]));
        assert!(!push_unique(&mut rewrite, vec![Symbol::classify("a")]));
        assert_eq!(rewrite.len(), 1);
    }
}
