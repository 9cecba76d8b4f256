/// Convenience result type used across focalloop.
pub type FocalResult<T> = Result<T, FocalError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum FocalError {
    /// Invalid user-provided data or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Alignment needs at least two images with a marked focal point.
    #[error("insufficient anchors: alignment needs at least 2 focal points, found {found}")]
    InsufficientAnchors {
        /// Number of images that carried a focal point.
        found: usize,
    },

    /// An image was asked to draw before its raster finished decoding.
    #[error("image {id} skipped: raster not decoded yet")]
    DecodeSkipped {
        /// Raw id of the skipped image.
        id: u64,
    },

    /// No usable encoder/codec for the requested format on this platform.
    #[error("encoder unavailable: {0}")]
    EncoderUnavailable(String),

    /// Export exceeded its wall-clock ceiling.
    #[error("encoding timed out after {elapsed_ms} ms (limit {limit_ms} ms)")]
    EncodingTimeout {
        /// Time spent before the export was stopped.
        elapsed_ms: u64,
        /// Configured ceiling.
        limit_ms: u64,
    },

    /// The underlying encoder reported an internal error.
    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    /// The caller abandoned the export.
    #[error("export cancelled")]
    Cancelled,

    /// Image bytes could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FocalError {
    /// Build a [`FocalError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FocalError::EncoderUnavailable`] value.
    pub fn encoder_unavailable(msg: impl Into<String>) -> Self {
        Self::EncoderUnavailable(msg.into())
    }

    /// Build a [`FocalError::EncodingFailed`] value.
    pub fn encoding_failed(msg: impl Into<String>) -> Self {
        Self::EncodingFailed(msg.into())
    }

    /// Build a [`FocalError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`FocalError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for failures a caller should offer to retry (possibly with other settings).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EncoderUnavailable(_)
                | Self::EncodingTimeout { .. }
                | Self::EncodingFailed(_)
                | Self::Cancelled
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
