use std::collections::HashSet;

use crate::grammar::{Origin, Rules, Variable};

// Hands out variable names nobody has used yet. Every candidate is checked
// against the grammar's names and everything handed out before.
pub struct Names {
    taken: HashSet<String>,
    counter: usize,
}

impl Names {
    pub fn new(rules: &Rules) -> Self {
        Names {
            taken: rules.keys().map(|variable| variable.name().to_string()).collect(),
            counter: 0,
        }
    }

    fn claim(&mut self, name: String, origin: Origin) -> Option<Variable> {
        if self.taken.insert(name.clone()) {
            Some(Variable::new(name, origin))
        } else {
            None
        }
    }

    // X1, X2, ...
    pub fn fresh(&mut self, origin: Origin) -> Variable {
        loop {
            self.counter += 1;
            if let Some(variable) = self.claim(format!("X{}", self.counter), origin) {
                return variable;
            }
        }
    }

    // S', then S1', S2', ... so the name still reads as a variable
    pub fn start_for(&mut self, start: &Variable) -> Variable {
        let base = start.name().strip_suffix('\'').unwrap_or(start.name()).to_string();
        if let Some(variable) = self.claim(format!("{}'", base), Origin::Start) {
            return variable;
        }
        (1..)
            .find_map(|n| self.claim(format!("{}{}'", base, n), Origin::Start))
            .unwrap_or_else(|| unreachable!("names are unbounded"))
    }
}
