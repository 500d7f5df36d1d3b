use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("not a variable reference: {0:?}")]
    NotAReference(String),

    #[error("invalid name: {0:?}")]
    InvalidName(String),

    #[error("namespace prefix '{0}' is not bound")]
    UnboundPrefix(SmolStr),

    #[error("variable '{0}' is already declared in this scope")]
    AlreadyDeclared(String),
}
