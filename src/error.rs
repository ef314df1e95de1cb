use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required config `{0}`")]
    Missing(&'static str),
    #[error("config `{key}` must be {expected}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },
    #[error("config `{key}` out of range: {value}")]
    OutOfRange { key: &'static str, value: i64 },
    #[error("invalid server address `{server}`: {source}")]
    InvalidServer {
        server: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unknown content type `{0}`")]
    UnknownContentType(String),
    #[error("decode measurements: {0}")]
    Decode(#[from] serde_json::Error),
}
