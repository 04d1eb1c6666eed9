use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogpulseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown log format: {0}")]
    UnknownFormat(String),

    #[error("State store error: {0}")]
    State(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Analysis failed: {0}")]
    Analysis(String),
}
