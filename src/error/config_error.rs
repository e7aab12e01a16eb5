use thiserror::Error;

/// Raised while assembling a dispatcher; the only error this crate surfaces to its caller.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("dispatcher requires a {0} handler")]
    MissingHandler(&'static str),

    #[error("invalid diagnostic configuration: {0}")]
    InvalidCfg(#[from] serde_json::Error),
}
