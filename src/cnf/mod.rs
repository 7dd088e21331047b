/*
    This module converts a cleaned grammar into Chomsky Normal Form
*/

mod names;

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::Display;

use itertools::Itertools;
use log::{debug, info, trace};

use crate::cleaner::reachable_variables;
use crate::grammar::*;
use names::Names;

// A grammar whose productions are `A -> B C` or `A -> a`, plus `S' -> ε`
// when the start symbol was renamed.
//
// `wrappers` maps each isolated terminal to the variable standing in for it
// and `wrapped` is its inverse. Every wrapper has exactly one production,
// its terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct CnfGrammar {
    pub grammar: Grammar,
    pub wrappers: BTreeMap<String, Variable>,
    pub wrapped: BTreeMap<Variable, String>,
}

impl CnfGrammar {
    pub fn start(&self) -> &Variable {
        &self.grammar.start_symbol
    }

    pub fn accepts_empty(&self) -> bool {
        self.grammar.has_epsilon_rule(self.start())
    }

    pub fn terminal_of(&self, variable: &Variable) -> Option<&str> {
        self.wrapped.get(variable).map(String::as_str)
    }

    pub fn binary_rules(&self) -> impl Iterator<Item = (&Variable, &Variable, &Variable)> {
        self.grammar.productions().filter_map(|(variable, alternative)| match alternative.as_slice() {
            [Symbol::Variable(left), Symbol::Variable(right)] => Some((variable, left, right)),
            _ => None,
        })
    }

    pub fn terminal_rules(&self) -> impl Iterator<Item = (&Variable, &str)> {
        self.grammar.productions().filter_map(|(variable, alternative)| match alternative.as_slice() {
            [Symbol::Terminal(terminal)] => Some((variable, terminal.as_str())),
            _ => None,
        })
    }

    // Every production is binary over variables or a single terminal; ε is
    // only allowed on the start symbol.
    pub fn is_normal_form(&self) -> bool {
        self.grammar.productions().all(|(variable, alternative)| match alternative.as_slice() {
            [Symbol::Variable(_), Symbol::Variable(_)] | [Symbol::Terminal(_)] => true,
            [Symbol::Epsilon] => variable == self.start(),
            _ => false,
        })
    }
}

impl Display for CnfGrammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.grammar)
    }
}

pub fn nullable_variables(rules: &Rules) -> BTreeSet<Variable> {
    let mut nullable = BTreeSet::new();

    fixpoint("nullability", rules.len() + 1, || {
        let mut changed = false;
        for (variable, rewrite) in rules {
            if nullable.contains(variable) {
                continue;
            }
            let derives_epsilon = rewrite.iter().any(|alternative| {
                alternative.iter().all(|symbol| match symbol {
                    Symbol::Epsilon => true,
                    Symbol::Variable(v) => nullable.contains(v),
                    Symbol::Terminal(_) => false,
                })
            });
            if derives_epsilon {
                nullable.insert(variable.clone());
                changed = true;
            }
        }
        changed
    });

    nullable
}

// Every way of keeping or dropping the nullable variables of `alternative`,
// the all-kept version first. An alternative with k nullable occurrences
// yields 2^k results.
fn drop_nullable(alternative: &[Symbol], nullable: &BTreeSet<Variable>) -> Vec<Alternative> {
    let mut leads = vec![vec![]];
    for symbol in alternative {
        match symbol {
            Symbol::Epsilon => {}
            Symbol::Variable(v) if nullable.contains(v) => {
                for lead in std::mem::take(&mut leads) {
                    let mut kept = lead.clone();
                    kept.push(symbol.clone());
                    leads.push(kept);
                    leads.push(lead);
                }
            }
            _ => leads.iter_mut().for_each(|lead| lead.push(symbol.clone())),
        }
    }
    leads
}

fn remove_epsilon(rules: &Rules, nullable: &BTreeSet<Variable>) -> Rules {
    rules
        .iter()
        .map(|(variable, rewrite)| {
            let mut expanded = Rewrite::new();
            for alternative in rewrite.iter().filter(|alternative| !is_epsilon(alternative)) {
                for lead in drop_nullable(alternative, nullable) {
                    if !lead.is_empty() {
                        push_unique(&mut expanded, lead);
                    }
                }
            }
            (variable.clone(), expanded)
        })
        .collect()
}

// Removes variables without productions, and every alternative that
// mentions one, until none are left.
fn prune_empty(rules: &mut Rules) {
    let limit = rules.len() + 1;
    fixpoint("pruning", limit, || {
        let empty: BTreeSet<Variable> = rules
            .iter()
            .filter(|(_, rewrite)| rewrite.is_empty())
            .map(|(variable, _)| variable.clone())
            .collect();
        if empty.is_empty() {
            return false;
        }
        for variable in &empty {
            trace!("Dropping `{}`: no productions left", variable);
        }
        rules.retain(|variable, _| !empty.contains(variable));
        for rewrite in rules.values_mut() {
            rewrite.retain(|alternative| variables_of(alternative).all(|v| !empty.contains(v)));
        }
        true
    });
}

// Replaces unit productions by the non-unit productions of every variable
// reachable through unit productions. `A -> A` disappears.
fn remove_units(rules: &Rules) -> Rules {
    rules
        .keys()
        .map(|variable| {
            let mut rewrite = Rewrite::new();
            let mut seen = BTreeSet::from([variable]);
            let mut queue = VecDeque::from([variable]);

            while let Some(current) = queue.pop_front() {
                for alternative in rules.get(current).into_iter().flatten() {
                    match alternative.as_slice() {
                        [Symbol::Variable(next)] => {
                            if rules.contains_key(next) && seen.insert(next) {
                                queue.push_back(next);
                            }
                        }
                        _ => {
                            push_unique(&mut rewrite, alternative.clone());
                        }
                    }
                }
            }

            (variable.clone(), rewrite)
        })
        .collect()
}

struct Binarizer<'a> {
    names: &'a mut Names,
    rules: Rules,
    wrappers: BTreeMap<String, Variable>,
    wrapped: BTreeMap<Variable, String>,
}

impl<'a> Binarizer<'a> {
    fn new(names: &'a mut Names) -> Self {
        Binarizer {
            names,
            rules: Rules::new(),
            wrappers: BTreeMap::new(),
            wrapped: BTreeMap::new(),
        }
    }

    fn wrapper_for(&mut self, terminal: &str) -> Variable {
        if let Some(variable) = self.wrappers.get(terminal) {
            return variable.clone();
        }
        let variable = self.names.fresh(Origin::Wrapper);
        trace!("`{}` stands in for `{}`", variable, terminal);
        self.wrappers.insert(terminal.to_string(), variable.clone());
        self.wrapped.insert(variable.clone(), terminal.to_string());
        variable
    }

    fn isolate(&mut self, symbol: &Symbol) -> Symbol {
        match symbol {
            Symbol::Terminal(terminal) => Symbol::Variable(self.wrapper_for(terminal)),
            other => other.clone(),
        }
    }

    fn push(&mut self, variable: &Variable, alternative: Alternative) {
        push_unique(self.rules.entry(variable.clone()).or_default(), alternative);
    }

    fn add(&mut self, variable: &Variable, alternative: &[Symbol]) {
        match alternative {
            [Symbol::Variable(_)] => {
                debug!("Skipping leftover unit production {} -> {}", variable, format_alternative(alternative));
            }
            [single] => self.push(variable, vec![single.clone()]),
            [left, right] => {
                let pair = vec![self.isolate(left), self.isolate(right)];
                self.push(variable, pair);
            }
            [first, rest @ ..] => {
                // Right-factor: A -> s1 X, X -> s2 Y, ... until two remain
                let mut current = variable.clone();
                let mut head = first;
                let mut tail = rest;
                while let [next, remaining @ ..] = tail {
                    if remaining.is_empty() {
                        break;
                    }
                    let left = self.isolate(head);
                    let link = self.names.fresh(Origin::Chain);
                    self.push(&current, vec![left, Symbol::Variable(link.clone())]);
                    current = link;
                    head = next;
                    tail = remaining;
                }
                let pair = vec![self.isolate(head), self.isolate(&tail[0])];
                self.push(&current, pair);
            }
            [] => {}
        }
    }

    fn finish(mut self, start_symbol: Variable) -> CnfGrammar {
        for (terminal, variable) in self.wrappers.clone() {
            self.push(&variable, vec![Symbol::Terminal(terminal)]);
        }

        for rewrite in self.rules.values_mut() {
            rewrite.retain(|alternative| !is_unit(alternative));
        }
        self.rules.retain(|_, rewrite| !rewrite.is_empty());

        CnfGrammar {
            grammar: Grammar {
                start_symbol,
                rules: self.rules,
            },
            wrappers: self.wrappers,
            wrapped: self.wrapped,
        }
    }
}

// Converts a cleaned grammar to Chomsky Normal Form.
//
// Epsilon elimination enumerates every subset of the nullable occurrences
// in a right-hand side, so its cost grows exponentially with the number of
// nullable symbols in a single alternative.
pub fn convert(grammar: &Grammar) -> CnfGrammar {
    let mut names = Names::new(&grammar.rules);
    let mut start = grammar.start_symbol.clone();

    let nullable = nullable_variables(&grammar.rules);
    debug!("Nullable variables: {}", nullable.iter().join(", "));

    let mut rules = remove_epsilon(&grammar.rules, &nullable);
    prune_empty(&mut rules);

    if nullable.contains(&start) {
        let renamed = names.start_for(&start);
        debug!("`{}` derives ε, starting from `{}` instead", start, renamed);
        let mut rewrite = Rewrite::new();
        if rules.contains_key(&start) {
            rewrite.push(vec![Symbol::Variable(start.clone())]);
        }
        rewrite.push(vec![Symbol::Epsilon]);
        rules.insert(renamed.clone(), rewrite);
        start = renamed;
    }

    let mut rules = remove_units(&rules);
    prune_empty(&mut rules);

    let reachable = reachable_variables(&start, &rules);
    rules.retain(|variable, _| reachable.contains(variable));

    let mut binarizer = Binarizer::new(&mut names);
    for (variable, rewrite) in &rules {
        for alternative in rewrite {
            binarizer.add(variable, alternative);
        }
    }
    let cnf = binarizer.finish(start);

    info!(
        "Chomsky normal form has {} variables and {} productions ({} terminal wrappers)",
        cnf.grammar.rules.len(),
        cnf.grammar.production_count(),
        cnf.wrappers.len()
    );
    cnf
}
