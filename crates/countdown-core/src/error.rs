use thiserror::Error;

#[derive(Debug, Error)]
pub enum CountdownError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CountdownError {
    /// Short error code string, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            CountdownError::Config(_) => "CONFIG_ERROR",
            CountdownError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, CountdownError>;
