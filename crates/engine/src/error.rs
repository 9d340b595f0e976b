use core::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The question store has no questions; no meaningful session exists.
    EmptyStore,
    /// An answer was already submitted for the current reveal cycle.
    RevealInProgress,
    /// The session is in the terminal state; only a reset leaves it.
    Completed,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EmptyStore => "The question store is empty.",
            Self::RevealInProgress => "An answer has already been submitted for this question.",
            Self::Completed => "The quiz is already complete.",
        })
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
