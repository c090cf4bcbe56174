use thiserror::Error;

#[derive(Error, Debug)]
pub enum WindfallError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
