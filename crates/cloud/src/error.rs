/// Errors from the external provider clients.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("{service} API error ({status}): {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Credentials could not be obtained.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The provider answered 2xx with a body we could not interpret.
    #[error("Unexpected {service} response: {detail}")]
    Decode {
        service: &'static str,
        detail: String,
    },

    /// A required setting is missing.
    #[error("Missing configuration: {0}")]
    Config(&'static str),
}

impl From<gcp_auth::Error> for CloudError {
    fn from(err: gcp_auth::Error) -> Self {
        Self::Auth(err.to_string())
    }
}

pub type CloudResult<T> = Result<T, CloudError>;
