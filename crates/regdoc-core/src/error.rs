use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{operation} failed for {input_size} input(s): {source}")]
    Capability {
        operation: &'static str,
        input_size: usize,
        #[source]
        source: BoxError,
    },

    #[error("Not implemented: {0}")]
    Unimplemented(&'static str),
}

/// Machine-readable classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Config,
    Input,
    Capability,
    Unimplemented,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Config => "CONFIG_ERROR",
            ErrorKind::Input => "INPUT_ERROR",
            ErrorKind::Capability => "CAPABILITY_ERROR",
            ErrorKind::Unimplemented => "NOT_IMPLEMENTED",
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidConfig(_) => ErrorKind::Config,
            Error::InvalidInput(_) => ErrorKind::Input,
            Error::Capability { .. } => ErrorKind::Capability,
            Error::Unimplemented(_) => ErrorKind::Unimplemented,
        }
    }

    /// Wrap a backend failure with the operation name and the size of the input it was given.
    pub fn capability(operation: &'static str, input_size: usize, source: impl Into<BoxError>) -> Self {
        Error::Capability { operation, input_size, source: source.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
