mod cleaner;
mod cli;
mod cnf;
mod cyk;
mod error_handling;
mod generator;
mod grammar;
mod parser;
mod session;
mod tree;

use std::process::ExitCode;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{thread_rng, SeedableRng};

use cli::Cli;
use error_handling::{Error, ErrorType};
use grammar::EPSILON;
use session::Session;

fn report<T: ErrorType>(error: T) -> ExitCode {
    eprintln!("{}", Error::unlocated(error));
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let rows = match parser::parse_file(&cli.file) {
        Ok(rows) => rows,
        Err(errors) => {
            for error in errors {
                eprintln!("{}", error);
            }
            return ExitCode::FAILURE;
        }
    };

    let start = match (&cli.start, rows.first()) {
        (Some(start), _) => start.clone(),
        (None, Some(row)) => row.lhs.clone(),
        (None, None) => String::new(),
    };

    let mut session = Session::new(cli.limits());
    match session.set_grammar(&start, &rows) {
        Ok(summary) => print!("{}", summary),
        Err(error) => {
            eprintln!("{}", error);
            return ExitCode::FAILURE;
        }
    }

    if cli.cnf {
        if let (Some(grammar), Some(cnf)) = (session.grammar(), session.cnf()) {
            println!("\nCleaned:\n{}", grammar);
            println!("Chomsky normal form:\n{}", cnf);
        }
    }

    let options = cli.generate_options();
    if options.count > 0 {
        let generated = match cli.seed {
            Some(seed) => session.generate(&options, &mut StdRng::seed_from_u64(seed)),
            None => session.generate(&options, &mut thread_rng()),
        };
        match generated {
            Ok(sentences) => {
                println!("\nGenerated:");
                for sentence in sentences {
                    println!("  {}", if sentence.is_empty() { EPSILON } else { sentence.as_str() });
                }
            }
            Err(error) => return report(error),
        }
    }

    for input in &cli.inputs {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        println!("\n> {}", if tokens.is_empty() { EPSILON } else { input.trim() });

        match session.validate(&tokens) {
            Ok(recognition) if recognition.accepted => {
                println!("String is derivable.");
                if let Some(tree) = session.last_tree() {
                    print!("{}", tree);
                }
            }
            Ok(_) if tokens.is_empty() => println!("The empty string is NOT derivable."),
            Ok(_) => println!("String is NOT derivable."),
            Err(error) => return report(error),
        }
    }

    ExitCode::SUCCESS
}
