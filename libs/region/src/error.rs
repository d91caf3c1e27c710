use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read region file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed region CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Region CSV is missing column '{0}'")]
    MissingColumn(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
