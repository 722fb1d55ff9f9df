use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IoError {
    #[error("outside of script range => {position} + {needed} / {length}")]
    UnexpectedEof {
        position: usize,
        needed: usize,
        length: usize,
    },
    #[error("input exceeds max: {value} > {max}")]
    VarIntTooLarge { value: u64, max: u64 },
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("cannot seek to {position} in {length} bytes")]
    InvalidSeek { position: usize, length: usize },
}

pub type IoResult<T> = Result<T, IoError>;
