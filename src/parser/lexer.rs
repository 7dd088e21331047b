use itertools::{Itertools, PeekingNext};

#[derive(PartialEq, Debug)]
pub enum Token {
    Arrow,
    Or,
    Word(String)
}

pub fn lex_word(line: &mut impl PeekingNext<Item = char>) -> Token {
    let word: String = line.peeking_take_while(|&c| !c.is_whitespace() && c != '|').collect();

    if word == "->" {
        Token::Arrow
    } else {
        Token::Word(word)
    }
}

// Splits a right-hand side into words and `|` separators. Words are only
// broken by whitespace or `|`, so `a+b` stays one terminal.
pub fn lex_rhs(rhs: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    let mut rhs_chars = rhs.chars().peekable();

    while let Some(c) = rhs_chars.peek() {
        if *c == '|' {
            rhs_chars.next();
            tokens.push(Token::Or);
        } else if !c.is_whitespace() {
            tokens.push(lex_word(&mut rhs_chars));
        } else {
            rhs_chars.next();
        }
    }

    return tokens;
}
