/// Convenience result type used across unmark.
pub type UnmarkResult<T> = Result<T, UnmarkError>;

/// Top-level error taxonomy used by editor, rasterizer and client APIs.
#[derive(thiserror::Error, Debug)]
pub enum UnmarkError {
    /// Uploaded or returned bytes are not a valid image.
    #[error("decode error: {0}")]
    Decode(String),

    /// The processing request could not complete (unreachable host, timeout, broken body).
    #[error("network error: {0}")]
    Network(String),

    /// The processing request completed with a non-success status.
    #[error("server error (HTTP {status}): {message}")]
    Server {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Leading part of the response body, if any.
        message: String,
    },

    /// Mask or preview extraction failed to produce pixels.
    #[error("rasterization error: {0}")]
    Rasterization(String),

    /// Invalid caller input or an operation attempted in the wrong session state.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Payload-free discriminant of [`UnmarkError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`UnmarkError::Decode`].
    Decode,
    /// See [`UnmarkError::Network`].
    Network,
    /// See [`UnmarkError::Server`].
    Server,
    /// See [`UnmarkError::Rasterization`].
    Rasterization,
    /// See [`UnmarkError::Validation`].
    Validation,
    /// See [`UnmarkError::Other`].
    Other,
}

impl UnmarkError {
    /// Build a [`UnmarkError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`UnmarkError::Network`] value.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Build a [`UnmarkError::Server`] value.
    pub fn server(status: u16, msg: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: msg.into(),
        }
    }

    /// Build a [`UnmarkError::Rasterization`] value.
    pub fn rasterization(msg: impl Into<String>) -> Self {
        Self::Rasterization(msg.into())
    }

    /// Build a [`UnmarkError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Return the payload-free kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::Network(_) => ErrorKind::Network,
            Self::Server { .. } => ErrorKind::Server,
            Self::Rasterization(_) => ErrorKind::Rasterization,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
