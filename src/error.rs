// ABOUTME: The four error kinds raised anywhere in the reader, evaluator, or built-ins

use thiserror::Error;

/// Every failure in this crate is one of exactly four kinds. There is no
/// in-language handler form; a `LispError` always unwinds to the REPL/loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LispError {
    /// Reader failures (unbalanced input, misplaced `.`, unexpected `)`),
    /// plus evaluator failures on non-proper-list application forms and
    /// `apply` called with a non-list second argument.
    #[error("Syntax error")]
    Syntax,
    /// Environment lookup miss.
    #[error("Symbol not bound")]
    Unbound,
    /// Wrong arity, anywhere: special forms, built-ins, closure binding.
    #[error("Wrong number of arguments")]
    Args,
    /// Operand not of the required variant.
    #[error("Wrong type")]
    Type,
}

pub type LispResult<T> = Result<T, LispError>;
