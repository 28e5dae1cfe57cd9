//! Auth-specific error types.

/// Broad classification of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The mechanism itself is broken (startup-time, fatal).
    Configuration,
    /// The request's credentials were rejected.
    Validation,
    /// The request's identity could not be confirmed by the lookup service.
    Upstream,
}

/// Errors that can occur during authentication.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// One or more required settings are absent or blank.
    #[error("{mechanism} configuration not set up, missing: {}", missing.join(", "))]
    MissingConfiguration {
        /// Name of the mechanism that could not be built.
        mechanism: &'static str,
        /// Every missing setting, in declaration order.
        missing: Vec<String>,
    },

    /// The credential bundle could not be read from the request at all.
    #[error("error getting headers")]
    MissingHeaders,

    /// A required credential header is absent, blank or `"undefined"`.
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    /// The host header does not match the trusted host.
    #[error("invalid host for cert auth. expected: {expected} actual: {actual}")]
    InvalidHost {
        /// The configured trusted host.
        expected: String,
        /// The host the request carried.
        actual: String,
    },

    /// The issuer header does not match the trusted issuer.
    #[error("invalid issuer")]
    InvalidIssuer,

    /// No registered mechanism recognises the request.
    #[error("missing authentication credentials")]
    NoCredentials,

    /// The identity lookup answered with something other than 200.
    #[error("bad status code from identity lookup: {0}")]
    UpstreamStatus(u16),

    /// The identity lookup body was not the expected JSON.
    #[error("unable to decode JSON from identity lookup: {0}")]
    UpstreamDecode(String),

    /// The identity lookup could not be reached.
    #[error("identity lookup request failed: {0}")]
    UpstreamRequest(String),
}

impl AuthError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MissingConfiguration { .. } => ErrorKind::Configuration,
            AuthError::MissingHeaders
            | AuthError::MissingHeader(_)
            | AuthError::InvalidHost { .. }
            | AuthError::InvalidIssuer
            | AuthError::NoCredentials => ErrorKind::Validation,
            AuthError::UpstreamStatus(_)
            | AuthError::UpstreamDecode(_)
            | AuthError::UpstreamRequest(_) => ErrorKind::Upstream,
        }
    }

    /// Whether this error should result in a 401 (vs. a 5xx).
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}
