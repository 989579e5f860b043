use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Batch is not parseable as JSON: {0}")]
    BatchParse(String),

    #[error("Record matched no known metric shape")]
    UnrecognizedShape,

    #[error("Missing or invalid field '{field}' for {shape} record")]
    MissingField {
        shape: &'static str,
        field: &'static str,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Pushgateway returned status {status}: {body}")]
    Push { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
