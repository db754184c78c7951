use thiserror::Error;

/// Errors that can occur when talking to the remote ontology and model
/// repository services
#[derive(Debug, Error)]
pub enum OntologyError {
    /// The HTTP request to the service failed
    #[error("Request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// A service URL could not be constructed
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    /// The service answered with a non-success status code
    #[error("Service returned status {status} for {url}")]
    ServiceStatus { status: u16, url: String },

    /// An XML payload could not be deserialized
    #[error("Failed to deserialize response: {0}")]
    DeserializeError(#[from] quick_xml::DeError),

    /// A JSON payload could not be deserialized
    #[error("Failed to deserialize response: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The requested entity does not exist on the service
    #[error("No entity found for {0}")]
    MissingEntity(String),
}
