/*
    This module generates sentences
*/

use rand::prelude::*;
use std::collections::BTreeSet;
use std::fmt::Display;

use log::{debug, trace};

use crate::grammar::*;
use crate::error_handling::*;

// Expansions allowed in one attempt, whatever the depth
const EXPANSION_LIMIT: usize = 10_000;

#[derive(Debug, PartialEq)]
pub enum GenerationError {
    // No grammar has been set yet
    NoGrammar,
    // Every attempt was abandoned and the start symbol has no ε rule
    Exhausted { attempts: usize },
}

impl ErrorType for GenerationError {}

impl Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationError::NoGrammar => write!(f, "Grammar is not set"),
            GenerationError::Exhausted { attempts } => write!(f, "No sentence could be generated in {} attempts", attempts),
        }
    }
}

pub type GenResult = Result<BTreeSet<String>, GenerationError>;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    // Distinct sentences wanted
    pub count: usize,
    // Attempts before giving up
    pub attempts: usize,
    // Deepest symbol allowed below the start; deeper attempts are abandoned
    pub max_depth: usize,
    // Longest sentence kept, in terminals
    pub max_tokens: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            count: 10,
            attempts: 50,
            max_depth: 15,
            max_tokens: 30,
        }
    }
}

// Why an attempt was thrown away
#[derive(Debug, PartialEq)]
enum Abandoned {
    TooDeep,
    TooLong,
    Undefined(String),
}

type Step = Result<(), Abandoned>;

struct Attempt<'g, 'r, R: Rng> {
    rules: &'g Rules,
    options: &'r GenerateOptions,
    rng: &'r mut R,
    words: Vec<&'g str>,
    expansions: usize,
}

impl<'g, 'r, R: Rng> Attempt<'g, 'r, R> {
    fn new(rules: &'g Rules, options: &'r GenerateOptions, rng: &'r mut R) -> Self {
        Attempt {
            rules,
            options,
            rng,
            words: Vec::new(),
            expansions: 0,
        }
    }

    fn generate_variable(&mut self, variable: &Variable, depth: usize) -> Step {
        self.expansions += 1;
        if self.expansions > EXPANSION_LIMIT {
            return Err(Abandoned::TooLong);
        }

        let rules = self.rules;
        let rewrite = rules
            .get(variable)
            .ok_or_else(|| Abandoned::Undefined(variable.name().to_string()))?;
        return self.generate_rewrite(rewrite, depth);
    }

    fn generate_rewrite(&mut self, rewrite: &'g Rewrite, depth: usize) -> Step {
        let alternative = match rewrite.choose(&mut *self.rng) {
            Some(a) => a,
            None => return Ok(()),
        };

        for symbol in alternative {
            self.generate_symbol(symbol, depth)?;
        }

        return Ok(());
    }

    // Symbols of an alternative sit one level below its variable, terminals
    // included
    fn generate_symbol(&mut self, symbol: &'g Symbol, depth: usize) -> Step {
        let depth = depth + 1;
        if depth > self.options.max_depth {
            return Err(Abandoned::TooDeep);
        }

        match symbol {
            Symbol::Variable(v) => self.generate_variable(v, depth),
            Symbol::Terminal(t) => {
                self.words.push(t);
                if self.words.len() > self.options.max_tokens {
                    Err(Abandoned::TooLong)
                } else {
                    Ok(())
                }
            }
            Symbol::Epsilon => Ok(()),
        }
    }
}

// Collects up to `options.count` distinct sentences of `grammar` by random
// descent from its start symbol.
//
// Sentences are the terminals joined by single spaces; the empty sentence
// is `""`. Attempts that go too deep or too long are dropped whole.
pub fn generate<R: Rng>(grammar: &Grammar, options: &GenerateOptions, rng: &mut R) -> GenResult {
    let mut generated = BTreeSet::new();
    let mut attempts = 0;

    while attempts < options.attempts && generated.len() < options.count {
        attempts += 1;
        let mut attempt = Attempt::new(&grammar.rules, options, rng);
        match attempt.generate_variable(&grammar.start_symbol, 0) {
            Ok(()) => {
                generated.insert(attempt.words.join(" "));
            }
            Err(reason) => trace!("Attempt {} abandoned: {:?}", attempts, reason),
        }
    }

    if generated.is_empty() {
        if !grammar.has_epsilon_rule(&grammar.start_symbol) {
            return Err(GenerationError::Exhausted { attempts });
        }
        generated.insert(String::new());
    }

    debug!("Generated {} sentences in {} attempts", generated.len(), attempts);
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;

    use super::*;
    use crate::cleaner::clean;
    use crate::parser::{grammar_from_rows, Row};

    fn cleaned(start: &str, rows: &[(&str, &str)]) -> Grammar {
        let rows: Vec<Row> = rows.iter().map(|(lhs, rhs)| Row::new(lhs, rhs)).collect();
        clean(grammar_from_rows(start, &rows).unwrap()).unwrap().grammar
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(17)
    }

    #[test]
    fn balanced_sentences() {
        let grammar = cleaned("S", &[("S", "a S b | ε")]);
        let sentences = generate(&grammar, &GenerateOptions::default(), &mut rng()).unwrap();

        assert!(!sentences.is_empty());
        for sentence in &sentences {
            let words: Vec<&str> = sentence.split_whitespace().collect();
            let half = words.len() / 2;
            assert_eq!(words.len() % 2, 0, "{:?}", sentence);
            assert!(words[..half].iter().all(|w| *w == "a"), "{:?}", sentence);
            assert!(words[half..].iter().all(|w| *w == "b"), "{:?}", sentence);
        }
    }

    #[test]
    fn respects_count() {
        let grammar = cleaned("S", &[("S", "S S | a | b")]);
        let options = GenerateOptions {
            count: 3,
            ..GenerateOptions::default()
        };

        assert!(generate(&grammar, &options, &mut rng()).unwrap().len() <= 3);
    }

    #[test]
    fn respects_token_ceiling() {
        let grammar = cleaned("S", &[("S", "a S | a")]);
        let options = GenerateOptions {
            max_tokens: 4,
            ..GenerateOptions::default()
        };

        for sentence in generate(&grammar, &options, &mut rng()).unwrap() {
            assert!(sentence.split_whitespace().count() <= 4);
        }
    }

    #[test]
    fn too_deep_everywhere_is_exhausted() {
        let grammar = cleaned("S", &[("S", "A"), ("A", "B"), ("B", "C"), ("C", "c")]);
        let options = GenerateOptions {
            max_depth: 2,
            ..GenerateOptions::default()
        };

        assert_eq!(
            generate(&grammar, &options, &mut rng()),
            Err(GenerationError::Exhausted { attempts: 50 })
        );
    }

    #[test]
    fn terminals_count_towards_depth() {
        let grammar = cleaned("S", &[("S", "a")]);
        let shallow = GenerateOptions {
            max_depth: 0,
            attempts: 5,
            ..GenerateOptions::default()
        };
        let deep_enough = GenerateOptions {
            max_depth: 1,
            ..shallow.clone()
        };

        assert_eq!(
            generate(&grammar, &shallow, &mut rng()),
            Err(GenerationError::Exhausted { attempts: 5 })
        );
        assert_eq!(
            generate(&grammar, &deep_enough, &mut rng()).unwrap(),
            BTreeSet::from(["a".to_string()])
        );
    }

    #[test]
    fn too_long_everywhere_is_exhausted() {
        let grammar = cleaned("S", &[("S", "a a a a")]);
        let options = GenerateOptions {
            max_tokens: 3,
            attempts: 5,
            ..GenerateOptions::default()
        };

        assert_eq!(
            generate(&grammar, &options, &mut rng()),
            Err(GenerationError::Exhausted { attempts: 5 })
        );
    }

    #[test]
    fn empty_sentence_when_only_epsilon_survives() {
        let grammar = cleaned("S", &[("S", "ε | A"), ("A", "B"), ("B", "C"), ("C", "c")]);
        let options = GenerateOptions {
            max_depth: 1,
            ..GenerateOptions::default()
        };

        assert_eq!(
            generate(&grammar, &options, &mut rng()).unwrap(),
            BTreeSet::from([String::new()])
        );
    }

    #[test]
    fn same_seed_same_sentences() {
        let grammar = cleaned("S", &[("S", "NP V"), ("NP", "the N | N"), ("N", "cat | dog"), ("V", "runs | eats")]);
        let options = GenerateOptions::default();

        assert_eq!(
            generate(&grammar, &options, &mut rng()),
            generate(&grammar, &options, &mut rng())
        );
    }
}
