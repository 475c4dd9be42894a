use aurq_config::error::ConfigError;
use aurq_registry::RegistryError;
use aurq_utils::error::PathError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error("Invalid header `{0}`")]
    #[diagnostic(
        code(aurq_cli::invalid_header),
        help("Headers are passed as `Name: value`")
    )]
    InvalidHeader(String),

    #[error("Invalid proxy `{0}`")]
    #[diagnostic(
        code(aurq_cli::invalid_proxy),
        help("Use a proxy URL such as `socks5://127.0.0.1:1080`")
    )]
    InvalidProxy(String),

    #[error("Failed to serialize output: {0}")]
    #[diagnostic(code(aurq_cli::serialize))]
    Serialize(#[from] serde_json::Error),

    #[error("Query task failed: {0}")]
    #[diagnostic(code(aurq_cli::task))]
    Task(#[from] tokio::task::JoinError),

    #[error("{failed} query unit(s) failed")]
    #[diagnostic(
        code(aurq_cli::incomplete),
        help("The printed results are incomplete; rerun with -v for details")
    )]
    Incomplete { failed: usize },
}

pub type CliResult<T> = std::result::Result<T, CliError>;
