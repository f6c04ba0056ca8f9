use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum DistributionError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("no element {0} found in mediapackage")]
    ElementNotFound(String),
    #[error("could not find a parent identifier in the mediapackage")]
    MissingParentId,
    #[error("error logging into the video platform, got status {status}")]
    Login { status: StatusCode },
    #[error("transport error distributing to the video platform")]
    Transport(#[from] reqwest::Error),
    #[error("malformed mediapackage: {0}")]
    MediaPackage(String),
}

pub type Result<T, E = DistributionError> = std::result::Result<T, E>;
