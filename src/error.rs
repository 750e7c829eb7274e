use crate::run::CommandError;
use std::path::PathBuf;
use thiserror::Error;

/// errors raised by the core; flows wrap these in `anyhow`
#[derive(Error, Debug)]
pub enum Error {
    #[error("not in a git repository (searched upward from {})", .0.display())]
    NotARepository(PathBuf),

    #[error(
        "no model configured, run `diffweave set-token-model --help` or \
         `diffweave set-browser-model --help` to see setup instructions"
    )]
    NotConfigured,

    /// interrupt or end-of-input at an interactive prompt
    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("git: {0}")]
    Git(#[from] git2::Error),

    #[error("model request failed: {0}")]
    Model(String),

    #[error("failed to parse config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("terminal input failed: {0}")]
    Prompt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// true if anywhere in the chain the user cancelled
pub fn is_cancelled(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| matches!(cause.downcast_ref::<Error>(), Some(Error::Cancelled)))
}
