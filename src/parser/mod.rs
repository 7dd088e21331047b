/*
    This module turns grammar rows into a validated set of rules
*/

mod lexer;
mod verifier;

use std::fmt::Display;
use std::fs::File;
use std::io::BufRead;
use std::path::PathBuf;

use crate::grammar::*;
use crate::error_handling::*;
use itertools::Itertools;
use lexer::*;
use verifier::verify_rules;
use verifier::IntermediateRuleset;

#[derive(Debug)]
pub enum GrammarErrorType {
    // No start variable was given
    MissingStart,
    // Something that should name a variable does not match the variable rule
    MalformedVariable(String),
    // Every row was blank
    NoProductions,
    // The start variable has no row of its own
    UndeclaredStart(String),
    // A right-hand side uses a variable that has no row
    UndeclaredVariable { name: String, rule: String },
    // The start variable cannot derive any terminal string
    UselessStart(String),
    // A line which should contain a rule has no `->`
    MissingArrow,
    // A rule has more than one `->`
    UnexpectedArrow,
    // A rule line starts with `->`
    MissingVariable,
    // Somehow a full rewrite was parsed as a single alternative
    // This is a problem with chomsky, not the grammar
    UnsplitRewrite,
    // There was an issue with reading a file
    FileError(std::io::Error),
}

impl ErrorType for GrammarErrorType {}

impl PartialEq for GrammarErrorType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (GrammarErrorType::FileError(a), GrammarErrorType::FileError(b)) => a.kind() == b.kind(),
            (GrammarErrorType::MalformedVariable(a), GrammarErrorType::MalformedVariable(b)) => a == b,
            (GrammarErrorType::UndeclaredStart(a), GrammarErrorType::UndeclaredStart(b)) => a == b,
            (GrammarErrorType::UselessStart(a), GrammarErrorType::UselessStart(b)) => a == b,
            (
                GrammarErrorType::UndeclaredVariable { name: a, rule: rule_a },
                GrammarErrorType::UndeclaredVariable { name: b, rule: rule_b }
            ) => a == b && rule_a == rule_b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other)
        }
    }
}

impl Display for GrammarErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarErrorType::MissingStart => write!(f, "Start variable must be a non-empty name"),
            GrammarErrorType::MalformedVariable(name) => write!(f, "`{}` is not a variable name (variables start with an uppercase letter, e.g. S, NP, Det)", name),
            GrammarErrorType::NoProductions => write!(f, "No production rules defined"),
            GrammarErrorType::UndeclaredStart(name) => write!(f, "Start variable `{}` has no rules", name),
            GrammarErrorType::UndeclaredVariable { name, rule } => write!(f, "Undeclared variable `{}` used in rule `{}`", name, rule),
            GrammarErrorType::UselessStart(name) => write!(f, "Start symbol `{}` generates nothing (check for non-terminating recursion or missing terminal rules)", name),
            GrammarErrorType::MissingArrow => write!(f, "Expected `->` after variable"),
            GrammarErrorType::UnexpectedArrow => write!(f, "Unexpected `->` encountered"),
            GrammarErrorType::MissingVariable => write!(f, "Rule has no variable before `->`"),
            GrammarErrorType::UnsplitRewrite => write!(f, "Rewrite was not fully split (this is a problem with chomsky, not the grammar)"),
            GrammarErrorType::FileError(e) => write!(f, "File error: {}", e),
        }
    }
}

pub type GrammarError = Error<GrammarErrorType>;
pub type GrammarErrors = Errors<GrammarErrorType>;

fn io_error(error: std::io::Error, file: PathBuf) -> GrammarError {
    GrammarError {
        location: Location {
            file,
            line: 0
        },
        error: GrammarErrorType::FileError(error)
    }
}

pub type Result<T> = std::result::Result<T, GrammarErrorType>;
pub type LineResult<T> = std::result::Result<T, GrammarError>;
pub type FileResult<T> = std::result::Result<T, GrammarErrors>;

// One `lhs -> rhs` line as the user wrote it. `rhs` holds `|`-separated
// alternatives of space-separated symbols; an empty alternative means ε.
#[derive(PartialEq, Debug, Clone)]
pub struct Row {
    pub lhs: String,
    pub rhs: String,
    pub location: Location
}

impl Row {
    pub fn new(lhs: &str, rhs: &str) -> Self {
        Row {
            lhs: lhs.to_string(),
            rhs: rhs.to_string(),
            location: Location::default()
        }
    }
}

fn parse_alternative(tokens: &[Token]) -> Result<Alternative> {
    let symbols: Alternative = tokens.iter().map(|t| match t {
        Token::Arrow => Err(GrammarErrorType::UnexpectedArrow),
        Token::Or => Err(GrammarErrorType::UnsplitRewrite),
        Token::Word(s) => Ok(Symbol::classify(s))
    }).filter_ok(|symbol| *symbol != Symbol::Epsilon).collect::<Result<_>>()?;

    // Nothing left (blank, or only ε) is the empty derivation
    if symbols.is_empty() {
        Ok(vec![Symbol::Epsilon])
    } else {
        Ok(symbols)
    }
}

pub fn parse_rewrite(rhs: &str) -> Result<Rewrite> {
    lex_rhs(rhs).split(|t| *t == Token::Or).map(parse_alternative).collect()
}

fn parse_line(line: &str, location: Location) -> LineResult<Row> {
    let (lhs, rhs) = line
        .split_once("->")
        .ok_or_else(|| GrammarError::at(&location, GrammarErrorType::MissingArrow))?;

    let lhs = lhs.trim();
    if lhs.is_empty() {
        return Err(GrammarError::at(&location, GrammarErrorType::MissingVariable));
    }

    return Ok(Row {
        lhs: lhs.to_string(),
        rhs: rhs.trim().to_string(),
        location
    });
}

fn is_rule_line(line: &String) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with(';') && !line.starts_with('#')
}

// Returns an iterator over the lines of a file, with the io errors wrapped
// in GrammarError and enumerated
fn file_line_nums<'a>(file: File, path: &'a PathBuf) -> impl Iterator<Item = (usize, LineResult<String>)> + 'a {
    std::io::BufReader::new(file)
        .lines()
        .map(move |line| line.map_err(|e| io_error(e, path.clone())))
        .enumerate()
        .filter(|(_, line)| line.as_ref().is_ok_and(is_rule_line) || line.is_err())
        .map(|(num, line)| (num + 1, line))
}

pub fn parse_file(path: &PathBuf) -> FileResult<Vec<Row>> {
    let file = File::open(path).map_err(|e| vec![io_error(e, path.clone())])?;
    let lines = file_line_nums(file, path);

    let parsed_lines = lines.map(|(num, line_res)| {
        line_res.and_then(|line| parse_line(&line, Location {
            file: path.clone(),
            line: num
        }))
    });

    let (rows, errors): (Vec<_>, Vec<_>) = parsed_lines.partition_result();
    if errors.len() > 0 {
        return Err(errors);
    }

    return Ok(rows);
}

// Merges the rows into one rule per variable and checks every name. The
// result is the raw grammar the cleaner starts from.
pub fn grammar_from_rows(start: &str, rows: &[Row]) -> LineResult<Grammar> {
    let start = start.trim();
    if start.is_empty() {
        return Err(GrammarError::unlocated(GrammarErrorType::MissingStart));
    }
    if !is_variable_name(start) {
        return Err(GrammarError::unlocated(GrammarErrorType::MalformedVariable(start.to_string())));
    }

    let mut ruleset = IntermediateRuleset::new();
    for row in rows {
        let lhs = row.lhs.trim();
        if lhs.is_empty() {
            continue;
        }
        if !is_variable_name(lhs) {
            return Err(GrammarError::at(&row.location, GrammarErrorType::MalformedVariable(lhs.to_string())));
        }

        let rewrite = parse_rewrite(&row.rhs).map_err(|error| GrammarError::at(&row.location, error))?;
        let (existing, _) = ruleset
            .entry(Variable::declared(lhs))
            .or_insert_with(|| (Rewrite::new(), row.location.clone()));
        for alternative in rewrite {
            push_unique(existing, alternative);
        }
    }

    if ruleset.is_empty() {
        return Err(GrammarError::unlocated(GrammarErrorType::NoProductions));
    }

    let start_symbol = Variable::declared(start);
    verify_rules(&start_symbol, &ruleset)?;

    let rules = ruleset.into_iter().map(|(variable, (rewrite, _))| (variable, rewrite)).collect();

    return Ok(Grammar {
        start_symbol,
        rules
    });
}

#[cfg(test)]
mod tests {
    use std::iter::zip;

    use super::*;

    fn s_variable(text: &str) -> Symbol {
        Symbol::Variable(Variable::declared(text))
    }

    fn s_terminal(text: &str) -> Symbol {
        Symbol::Terminal(text.to_string())
    }

    #[test]
    fn parse_normal_rewrite() {
        let lines = vec![
            "Det Adj N | Det N | N",
            "a S b | ε",
            "a S b |",
            "",
            "a ε b"
        ];
        let answers = vec![
            vec![
                vec![s_variable("Det"), s_variable("Adj"), s_variable("N")],
                vec![s_variable("Det"), s_variable("N")],
                vec![s_variable("N")]
            ],
            vec![
                vec![s_terminal("a"), s_variable("S"), s_terminal("b")],
                vec![Symbol::Epsilon]
            ],
            vec![
                vec![s_terminal("a"), s_variable("S"), s_terminal("b")],
                vec![Symbol::Epsilon]
            ],
            vec![vec![Symbol::Epsilon]],
            vec![vec![s_terminal("a"), s_terminal("b")]]
        ];

        for (line, answer) in zip(lines, answers) {
            assert_eq!(parse_rewrite(line).unwrap(), answer);
        }
    }

    #[test]
    fn parse_malformed_rewrite() {
        assert_eq!(parse_rewrite("a -> b"), Err(GrammarErrorType::UnexpectedArrow));
        assert_eq!(parse_alternative(&[Token::Or]), Err(GrammarErrorType::UnsplitRewrite));
    }

    #[test]
    fn parse_normal_line() {
        let location = Location::default();
        let answer = Row {
            lhs: "NP".to_string(),
            rhs: "Det N | N".to_string(),
            location: location.clone()
        };

        assert_eq!(parse_line("  NP ->  Det N | N ", location), Ok(answer));
    }

    #[test]
    fn parse_malformed_line() {
        assert_eq!(
            parse_line("NP Det N", Location::default()).unwrap_err().error,
            GrammarErrorType::MissingArrow
        );
        assert_eq!(
            parse_line("-> Det N", Location::default()).unwrap_err().error,
            GrammarErrorType::MissingVariable
        );
    }

    #[test]
    fn parse_normal_file() {
        let example_path = PathBuf::from("example_data/anbn.cfg");
        let rows = parse_file(&example_path).unwrap();

        assert_eq!(rows, vec![Row {
            lhs: "S".to_string(),
            rhs: "a S b | ε".to_string(),
            location: Location {
                file: example_path.clone(),
                line: 2
            }
        }]);
    }

    #[test]
    fn parse_malformed_file() {
        let example_path = PathBuf::from("example_data/malformed.cfg");
        let errors = parse_file(&example_path).unwrap_err();

        assert_eq!(errors, vec![
            GrammarError {
                location: Location {
                    file: example_path.clone(),
                    line: 3
                },
                error: GrammarErrorType::MissingArrow
            },
            GrammarError {
                location: Location {
                    file: example_path,
                    line: 4
                },
                error: GrammarErrorType::MissingVariable
            }
        ]);
    }

    #[test]
    fn parse_missing_file() {
        let errors = parse_file(&PathBuf::from("example_data/does_not_exist.cfg")).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].error, GrammarErrorType::FileError(_)));
    }

    #[test]
    fn rows_are_merged() {
        let rows = vec![
            Row::new("S", "a S b"),
            Row::new("", "ignored"),
            Row::new("S", "| a S b")
        ];
        let grammar = grammar_from_rows("S", &rows).unwrap();

        assert_eq!(grammar.start_symbol, Variable::declared("S"));
        assert_eq!(grammar.rules[&Variable::declared("S")], vec![
            vec![s_terminal("a"), s_variable("S"), s_terminal("b")],
            vec![Symbol::Epsilon]
        ]);
    }

    #[test]
    fn rows_with_undeclared_variable() {
        let error = grammar_from_rows("S", &[Row::new("S", "A b")]).unwrap_err();

        assert_eq!(error.error, GrammarErrorType::UndeclaredVariable {
            name: "A".to_string(),
            rule: "S -> A b".to_string()
        });
        assert!(error.to_string().contains("`A`"));
    }

    #[test]
    fn rows_with_bad_names() {
        let cases = vec![
            ("", vec![Row::new("S", "a")]),
            ("s", vec![Row::new("S", "a")]),
            ("S", vec![Row::new("S", "a"), Row::new("np", "b")]),
            ("S", vec![Row::new("", "a")]),
            ("T", vec![Row::new("S", "a")]),
            ("S", vec![Row::new("S", "a -> b")])
        ];
        let answers = vec![
            GrammarErrorType::MissingStart,
            GrammarErrorType::MalformedVariable("s".to_string()),
            GrammarErrorType::MalformedVariable("np".to_string()),
            GrammarErrorType::NoProductions,
            GrammarErrorType::UndeclaredStart("T".to_string()),
            GrammarErrorType::UnexpectedArrow
        ];

        for ((start, rows), answer) in zip(cases, answers) {
            assert_eq!(grammar_from_rows(start, &rows).unwrap_err().error, answer);
        }
    }
}
