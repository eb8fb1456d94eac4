//! Errors raised while reading or checking `mnemos.toml`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file parsed but something in it could not be interpreted.
    #[error("malformed configuration: {0}")]
    InvalidFormat(String),

    /// A setting is outside the range the store accepts.
    #[error("setting `{field}` rejected: {message}")]
    InvalidValue { field: String, message: String },

    /// A `${VAR}` reference names a variable missing from the environment.
    #[error("configuration references unset variable ${{{0}}}")]
    EnvVarNotSet(String),

    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration is not valid TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}
