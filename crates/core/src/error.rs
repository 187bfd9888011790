use thiserror::Error;

#[derive(Debug, Error)]
pub enum TracespecError {
    #[error("Trace {0} not found")]
    TraceNotFound(String),

    #[error("Specification '{0}' not found")]
    SpecificationNotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(String),
}

impl TracespecError {
    /// Resolution failures are terminal for the request; a corrected identifier is needed.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TraceNotFound(_) | Self::SpecificationNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, TracespecError>;
