use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("line {line}, col {col}: Unexpected token '{token}'")]
    UnexpectedToken {
        line: usize,
        col: usize,
        token: String,
    },
}
