use std::path::PathBuf;

use clap::Parser;

use crate::generator::GenerateOptions;
use crate::session::Limits;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// File containing the grammar
    pub file: PathBuf,

    /// Start symbol (default: first in the file)
    #[arg(short, long, value_name = "SYMBOL")]
    pub start: Option<String>,

    /// Amount of distinct sentences to generate (default: 10, 0 to skip)
    #[arg(short = 'n', long, value_name = "AMOUNT")]
    pub amount: Option<usize>,

    /// Generation attempts before giving up (default: 50)
    #[arg(long, value_name = "N")]
    pub attempts: Option<usize>,

    /// Deepest expansion while generating (default: 15)
    #[arg(long, value_name = "DEPTH")]
    pub depth: Option<usize>,

    /// Longest sentence generated or validated, in tokens (default: 30)
    #[arg(long, value_name = "N")]
    pub max_tokens: Option<usize>,

    /// Seed for the random generator
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Print the grammar in Chomsky normal form
    #[arg(long)]
    pub cnf: bool,

    /// Sentence to validate, tokens separated by whitespace (repeatable)
    #[arg(short, long = "input", value_name = "SENTENCE")]
    pub inputs: Vec<String>,
}

impl Cli {
    pub fn limits(&self) -> Limits {
        let mut limits = Limits::default();
        if let Some(max_tokens) = self.max_tokens {
            limits.max_tokens = max_tokens;
        }
        limits
    }

    pub fn generate_options(&self) -> GenerateOptions {
        let defaults = GenerateOptions::default();
        GenerateOptions {
            count: self.amount.unwrap_or(defaults.count),
            attempts: self.attempts.unwrap_or(defaults.attempts),
            max_depth: self.depth.unwrap_or(defaults.max_depth),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
        }
    }
}
