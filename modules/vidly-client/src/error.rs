use thiserror::Error;

pub type Result<T> = std::result::Result<T, VidlyError>;

#[derive(Debug, Error)]
pub enum VidlyError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Request encoding error: {0}")]
    Encode(String),
}

impl From<reqwest::Error> for VidlyError {
    fn from(err: reqwest::Error) -> Self {
        VidlyError::Network(err.to_string())
    }
}

impl From<quick_xml::DeError> for VidlyError {
    fn from(err: quick_xml::DeError) -> Self {
        VidlyError::Parse(err.to_string())
    }
}
