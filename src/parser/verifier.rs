use std::collections::BTreeMap;

use crate::grammar::{format_alternative, variables_of, Alternative, Rewrite, Variable};
use super::GrammarErrorType::{UndeclaredStart, UndeclaredVariable};
use super::{GrammarError, GrammarErrors, LineResult, Location};

pub type IntermediateRuleset = BTreeMap<Variable, (Rewrite, Location)>;

fn get_alternative_undefined_symbols(variable: &Variable, alternative: &Alternative, location: &Location, rules: &IntermediateRuleset) -> GrammarErrors {
    // Keep only the variables of the alternative, then the ones that have no
    // rule of their own.
    variables_of(alternative)
        .filter(|symbol| !rules.contains_key(*symbol))
        .map(|symbol| GrammarError::at(location, UndeclaredVariable {
            name: symbol.name().to_string(),
            rule: format!("{} -> {}", variable, format_alternative(alternative))
        }))
        .collect()
}

fn get_rewrite_undefined_symbols(variable: &Variable, rewrite: &Rewrite, location: &Location, rules: &IntermediateRuleset) -> GrammarErrors {
    rewrite.iter()
        .flat_map(|alternative| get_alternative_undefined_symbols(variable, alternative, location, rules))
        .collect()
}

fn get_undefined_symbols(rules: &IntermediateRuleset) -> GrammarErrors {
    rules.iter()
        .flat_map(|(variable, (rewrite, location))| get_rewrite_undefined_symbols(variable, rewrite, location, rules))
        .collect()
}

// Reports the first problem only; a grammar is either accepted whole or not
// at all.
pub fn verify_rules(start: &Variable, rules: &IntermediateRuleset) -> LineResult<()> {
    if !rules.contains_key(start) {
        return Err(GrammarError::unlocated(UndeclaredStart(start.name().to_string())));
    }

    match get_undefined_symbols(rules).into_iter().next() {
        Some(error) => Err(error),
        None => Ok(())
    }
}
