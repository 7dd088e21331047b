/*
    This module decides membership with the Cocke–Younger–Kasami algorithm
*/

use std::collections::hash_map;
use std::collections::HashMap;

use itertools::Itertools;
use log::debug;

use crate::cnf::CnfGrammar;
use crate::grammar::Variable;

// How a variable came to derive the span of its cell
#[derive(Debug, Clone, PartialEq)]
pub enum Witness {
    // The single token of a diagonal cell
    Literal(String),
    // `left` derives (i, k) and `right` derives (k + 1, j)
    Split { k: usize, left: Variable, right: Variable },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub variable: Variable,
    pub witness: Witness,
}

// At most one entry per variable: the first witness found is the one kept.
// `index` points each variable at its entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    entries: Vec<Entry>,
    index: HashMap<Variable, usize>,
}

impl Cell {
    pub fn get(&self, variable: &Variable) -> Option<&Entry> {
        self.index.get(variable).map(|&position| &self.entries[position])
    }

    pub fn contains(&self, variable: &Variable) -> bool {
        self.index.contains_key(variable)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    fn offer(&mut self, variable: &Variable, witness: impl FnOnce() -> Witness) {
        if let hash_map::Entry::Vacant(slot) = self.index.entry(variable.clone()) {
            slot.insert(self.entries.len());
            self.entries.push(Entry {
                variable: variable.clone(),
                witness: witness(),
            });
        }
    }
}

// Upper-triangular recognition table; `cell(i, j)` covers tokens `i..=j`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    // Row i holds the cells (i, i) through (i, n - 1)
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, i: usize, j: usize) -> Option<&Cell> {
        self.rows.get(i)?.get(j.checked_sub(i)?)
    }

    pub fn entry(&self, i: usize, j: usize, variable: &Variable) -> Option<&Entry> {
        self.cell(i, j)?.get(variable)
    }

    // Whether `variable` derives the whole input.
    pub fn derives(&self, variable: &Variable) -> bool {
        self.len()
            .checked_sub(1)
            .and_then(|last| self.entry(0, last, variable))
            .is_some()
    }
}

// Fills the recognition table for `tokens`.
//
// Runs in O(n³·|G|) for n tokens and |G| binary productions. Empty input
// yields an empty table that derives nothing; whether ε belongs to the
// language is answered from the grammar instead.
pub fn recognise<S: AsRef<str>>(cnf: &CnfGrammar, tokens: &[S]) -> Table {
    let n = tokens.len();
    let by_terminal: HashMap<&str, Vec<&Variable>> = cnf
        .terminal_rules()
        .map(|(variable, terminal)| (terminal, variable))
        .into_group_map();
    let binary = cnf.binary_rules().collect_vec();

    let mut rows: Vec<Vec<Cell>> = (0..n).map(|i| vec![Cell::default(); n - i]).collect();

    for (i, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        for variable in by_terminal.get(token).into_iter().flatten() {
            rows[i][0].offer(variable, || Witness::Literal(token.to_string()));
        }
    }

    for length in 2..=n {
        for i in 0..=(n - length) {
            let j = i + length - 1;
            let mut cell = Cell::default();

            for k in i..j {
                let left = &rows[i][k - i];
                let right = &rows[k + 1][j - (k + 1)];
                if left.entries.is_empty() || right.entries.is_empty() {
                    continue;
                }
                for &(variable, b, c) in &binary {
                    if left.contains(b) && right.contains(c) {
                        cell.offer(variable, || Witness::Split {
                            k,
                            left: b.clone(),
                            right: c.clone(),
                        });
                    }
                }
            }

            rows[i][j - i] = cell;
        }
    }

    let table = Table { rows };
    debug!(
        "Recognition over {} tokens: `{}` {} the input",
        n,
        cnf.start(),
        if table.derives(cnf.start()) { "derives" } else { "does not derive" }
    );
    table
}
