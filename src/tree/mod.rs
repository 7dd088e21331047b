/*
    This module rebuilds a derivation tree from a recognition table
*/

use std::fmt::Display;

use log::error;

use crate::cnf::CnfGrammar;
use crate::cyk::{Table, Witness};
use crate::grammar::{Variable, EPSILON};

// A derivation tree as handed to whatever draws it.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    Node { label: String, children: Vec<Tree> },
    // A terminal of the input
    Leaf(String),
    // The empty derivation
    Epsilon,
    // No witness was found for this variable; marks a broken subtree
    Missing(String),
}

impl Tree {
    pub fn node(label: &str, children: Vec<Tree>) -> Tree {
        Tree::Node {
            label: label.to_string(),
            children,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Tree::Node { label, .. } => label,
            Tree::Leaf(text) => text,
            Tree::Epsilon => EPSILON,
            Tree::Missing(variable) => variable,
        }
    }

    pub fn children(&self) -> &[Tree] {
        match self {
            Tree::Node { children, .. } => children,
            _ => &[],
        }
    }

    // The terminals at the leaves, left to right.
    pub fn terminals(&self) -> Vec<&str> {
        match self {
            Tree::Leaf(text) => vec![text.as_str()],
            Tree::Node { children, .. } => children.iter().flat_map(Tree::terminals).collect(),
            Tree::Epsilon | Tree::Missing(_) => vec![],
        }
    }

    pub fn is_complete(&self) -> bool {
        match self {
            Tree::Missing(_) => false,
            Tree::Node { children, .. } => children.iter().all(Tree::is_complete),
            Tree::Leaf(_) | Tree::Epsilon => true,
        }
    }

    pub fn relabel(self, label: &str) -> Tree {
        match self {
            Tree::Node { children, .. } => Tree::node(label, children),
            other => other,
        }
    }

    fn caption(&self) -> String {
        match self {
            Tree::Node { label, .. } => label.clone(),
            Tree::Leaf(text) => format!("\"{}\"", text),
            Tree::Epsilon => format!("\"{}\"", EPSILON),
            Tree::Missing(variable) => format!("ERROR:{}", variable),
        }
    }

    fn write_children(&self, f: &mut std::fmt::Formatter<'_>, prefix: &str) -> std::fmt::Result {
        let children = self.children();
        for (index, child) in children.iter().enumerate() {
            let (branch, indent) = if index + 1 == children.len() {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            writeln!(f, "{}{}{}", prefix, branch, child.caption())?;
            child.write_children(f, &format!("{}{}", prefix, indent))?;
        }
        Ok(())
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.caption())?;
        self.write_children(f, "")
    }
}

// Rebuilds the derivation of the whole input from the start symbol.
//
// Terminal wrappers collapse into their terminal and binarization chains are
// spliced into their parent, so the tree follows the productions the user
// wrote rather than their normal form.
pub fn reconstruct(table: &Table, cnf: &CnfGrammar) -> Tree {
    match table.len().checked_sub(1) {
        Some(last) => build(table, cnf, 0, last, cnf.start()),
        None => Tree::Missing(cnf.start().name().to_string()),
    }
}

fn build(table: &Table, cnf: &CnfGrammar, i: usize, j: usize, variable: &Variable) -> Tree {
    let Some(entry) = table.entry(i, j, variable) else {
        error!("No derivation of `{}` over tokens {}..={}", variable, i, j);
        return Tree::Missing(variable.name().to_string());
    };

    match &entry.witness {
        Witness::Literal(token) => match cnf.terminal_of(variable) {
            Some(terminal) => Tree::Leaf(terminal.to_string()),
            None => Tree::node(variable.name(), vec![Tree::Leaf(token.clone())]),
        },
        Witness::Split { k, left, right } => {
            let mut children = Vec::new();
            for (part, subtree) in [
                (left, build(table, cnf, i, *k, left)),
                (right, build(table, cnf, k + 1, j, right)),
            ] {
                match subtree {
                    Tree::Node { children: spliced, .. } if part.is_chain() => children.extend(spliced),
                    other => children.push(other),
                }
            }
            Tree::node(variable.name(), children)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::clean;
    use crate::cnf::convert;
    use crate::cyk::recognise;
    use crate::grammar::Origin;
    use crate::parser::{grammar_from_rows, Row};

    fn cnf_of(start: &str, rows: &[(&str, &str)]) -> CnfGrammar {
        let rows: Vec<Row> = rows.iter().map(|(lhs, rhs)| Row::new(lhs, rhs)).collect();
        convert(&clean(grammar_from_rows(start, &rows).unwrap()).unwrap().grammar)
    }

    fn leaf(text: &str) -> Tree {
        Tree::Leaf(text.to_string())
    }

    #[test]
    fn chains_and_wrappers_disappear() {
        let cnf = cnf_of("E", &[
            ("E", "E + T | T"),
            ("T", "T * F | F"),
            ("F", "( E ) | num"),
        ]);
        let tokens = ["num", "+", "num"];
        let tree = reconstruct(&recognise(&cnf, &tokens), &cnf);

        assert_eq!(tree, Tree::node("E", vec![
            Tree::node("E", vec![leaf("num")]),
            leaf("+"),
            Tree::node("T", vec![leaf("num")]),
        ]));
        assert_eq!(tree.terminals(), tokens);
    }

    #[test]
    fn long_rule_is_flat() {
        let cnf = cnf_of("S", &[("S", "a b c d e")]);
        let tokens = ["a", "b", "c", "d", "e"];
        let tree = reconstruct(&recognise(&cnf, &tokens), &cnf);

        assert_eq!(tree, Tree::node("S", tokens.iter().map(|t| leaf(t)).collect()));
    }

    #[test]
    fn binary_tree_for_repeated_rule() {
        let cnf = cnf_of("S", &[("S", "S S | a")]);
        let tree = reconstruct(&recognise(&cnf, &["a", "a", "a"]), &cnf);

        assert_eq!(tree.label(), "S");
        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.terminals(), vec!["a", "a", "a"]);
        assert!(tree.is_complete());
    }

    #[test]
    fn missing_witness_is_marked() {
        let cnf = cnf_of("S", &[("S", "A B"), ("A", "a"), ("B", "b")]);
        let table = recognise(&cnf, &["b", "a"]);
        let tree = reconstruct(&table, &cnf);

        assert_eq!(tree, Tree::Missing("S".to_string()));
        assert!(!tree.is_complete());
        assert_eq!(tree.to_string(), "ERROR:S\n");
    }

    #[test]
    fn user_variables_named_like_chains_stay() {
        // X1 is the user's own variable, not a binarization link
        let cnf = cnf_of("S", &[("S", "X1 c"), ("X1", "a b")]);
        let tree = reconstruct(&recognise(&cnf, &["a", "b", "c"]), &cnf);

        assert_eq!(tree, Tree::node("S", vec![
            Tree::node("X1", vec![leaf("a"), leaf("b")]),
            leaf("c"),
        ]));
        assert!(cnf.grammar.rules.keys().any(|v| v.name() == "X1" && v.origin() == Origin::Declared));
    }

    #[test]
    fn display_draws_branches() {
        let tree = Tree::node("S", vec![
            Tree::node("A", vec![leaf("a")]),
            leaf("b"),
            Tree::node("C", vec![Tree::Epsilon]),
        ]);

        assert_eq!(tree.to_string(), concat!(
            "S\n",
            "├── A\n",
            "│   └── \"a\"\n",
            "├── \"b\"\n",
            "└── C\n",
            "    └── \"ε\"\n"
        ));
    }
}
