use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0} was not found in the repository")]
    NotFound(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("operation attempted on a purged object handle")]
    InvalidState,
    #[error("REST action \"{url}\" failed: {status}")]
    Status { url: String, status: StatusCode },
    #[error("transport error talking to the repository")]
    Transport(#[from] reqwest::Error),
    #[error("malformed XML response from the repository")]
    Xml(#[from] roxmltree::Error),
    #[error("error spooling datastream content")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = RepositoryError> = std::result::Result<T, E>;
