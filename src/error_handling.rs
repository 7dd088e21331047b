use std::path::PathBuf;
use std::fmt::Display;

pub trait ErrorType: Display + PartialEq {}

// Where a grammar row came from. Rows built in code have no file and line 0.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize
}

impl Location {
    pub fn is_unknown(&self) -> bool {
        self.line == 0 && self.file.as_os_str().is_empty()
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.file.display())
        } else {
            write!(f, "{}:{}", self.file.display(), self.line)
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Error<T: ErrorType> {
    pub location: Location,
    pub error: T
}

impl<T: ErrorType> Error<T> {
    pub fn at(location: &Location, error: T) -> Self {
        Error {
            location: location.clone(),
            error
        }
    }

    pub fn unlocated(error: T) -> Self {
        Error {
            location: Location::default(),
            error
        }
    }
}

impl<T: ErrorType> Display for Error<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.location.is_unknown() {
            write!(f, "\x1b[31;49;1m[error]\x1b[39;49;1m  {}\x1b[0m", self.error)
        } else {
            write!(f, "\x1b[31;49;1m[{}]\x1b[39;49;1m  {}\x1b[0m", self.location, self.error)
        }
    }
}

pub type Errors<T> = Vec<Error<T>>;
