/*
    This module removes variables that can never take part in a derivation
*/

use std::collections::BTreeSet;

use log::{debug, warn};

use crate::grammar::*;
use crate::parser::{GrammarError, GrammarErrorType, LineResult};

#[derive(Debug, PartialEq)]
pub struct Cleaned {
    pub grammar: Grammar,
    // Variables that derive no terminal string
    pub useless: Vec<Variable>,
    // Variables the start symbol never mentions
    pub unreachable: Vec<Variable>,
}

fn is_generating(alternative: &[Symbol], useful: &BTreeSet<Variable>) -> bool {
    variables_of(alternative).all(|variable| useful.contains(variable))
}

pub fn useful_variables(rules: &Rules) -> BTreeSet<Variable> {
    let mut useful = BTreeSet::new();

    fixpoint("usefulness", rules.len() + 1, || {
        let mut changed = false;
        for (variable, rewrite) in rules {
            if !useful.contains(variable)
                && rewrite.iter().any(|alternative| is_generating(alternative, &useful))
            {
                useful.insert(variable.clone());
                changed = true;
            }
        }
        changed
    });

    useful
}

// Depth-first from `start`, following the variables of every alternative
pub fn reachable_variables(start: &Variable, rules: &Rules) -> BTreeSet<Variable> {
    let mut reachable = BTreeSet::from([start.clone()]);
    let mut stack = vec![start];

    while let Some(variable) = stack.pop() {
        let Some(rewrite) = rules.get(variable) else {
            continue;
        };
        for next in rewrite.iter().flat_map(|alternative| variables_of(alternative)) {
            if rules.contains_key(next) && reachable.insert(next.clone()) {
                stack.push(next);
            }
        }
    }

    reachable
}

pub fn clean(grammar: Grammar) -> LineResult<Cleaned> {
    let Grammar { start_symbol, rules } = grammar;

    let useful = useful_variables(&rules);
    if !useful.contains(&start_symbol) {
        return Err(GrammarError::unlocated(GrammarErrorType::UselessStart(start_symbol.name().to_string())));
    }

    let (kept, dropped): (Rules, Rules) = rules.into_iter().partition(|(variable, _)| useful.contains(variable));
    let useless: Vec<Variable> = dropped.into_keys().collect();
    for variable in &useless {
        debug!("Removing `{}`: it generates no terminal string", variable);
    }

    let rules: Rules = kept
        .into_iter()
        .map(|(variable, rewrite)| {
            let rewrite = rewrite
                .into_iter()
                .filter(|alternative| is_generating(alternative, &useful))
                .collect();
            (variable, rewrite)
        })
        .collect();

    let reachable = reachable_variables(&start_symbol, &rules);
    let (rules, dropped): (Rules, Rules) = rules.into_iter().partition(|(variable, _)| reachable.contains(variable));
    let unreachable: Vec<Variable> = dropped.into_keys().collect();
    for variable in &unreachable {
        warn!("Removing `{}`: it is not reachable from `{}`", variable, start_symbol);
    }

    Ok(Cleaned {
        grammar: Grammar {
            start_symbol,
            rules,
        },
        useless,
        unreachable,
    })
}
