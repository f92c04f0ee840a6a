use hyper::StatusCode;
use thiserror::Error;

type Source = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum LicenseError {
    #[error("Missing Security Token")]
    MissingNonce,
    #[error("Missing License Key")]
    MissingLicenseKey,
    #[error("Unknown License Action {0}")]
    UnknownAction(String),
    #[error("License Request Already In Progress")]
    Busy,
    #[error("License Request Rejected: {0}")]
    Rejected(String),
    #[error("License Transport: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to build the request")]
    BuildingRequest(#[source] Source),
    #[error("sending the request failed")]
    Sending(#[source] Source),
    #[error("request timed out")]
    Timeout,
    #[error("chunking the response failed")]
    ChunkingResponse(#[source] Source),
    #[error("failed with {0}")]
    Status(StatusCode),
    #[error("error deserializing")]
    Deserialize(#[from] serde_json::Error),
}
