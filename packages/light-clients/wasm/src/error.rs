//! Error types for the sandboxed client and the code registry.

use crate::checksum::Checksum;

/// Errors surfaced by a sandbox engine call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine has no code stored for the checksum.
    #[error("no code loaded for checksum {checksum}")]
    CodeNotFound {
        /// The missing checksum.
        checksum: Checksum,
    },

    /// The sandboxed code rejected the call. The message is surfaced to
    /// callers verbatim.
    #[error("{message}")]
    Contract {
        /// The rejection message exactly as the sandboxed code returned it.
        message: String,
    },

    /// The sandboxed code returned bytes that do not decode as the
    /// expected result type.
    #[error("malformed engine response for {context}: {reason}")]
    InvalidResponse {
        /// Which entry point produced the response.
        context: &'static str,
        /// The decode failure.
        reason: String,
    },

    /// The configured engine does not execute sandboxed code at all.
    #[error("this host is not configured with a sandbox engine")]
    Unsupported,
}

/// Errors raised by the content-addressed code registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeRegistryError {
    /// Uploaded code is empty (before or after decompression).
    #[error("uploaded code is empty")]
    EmptyCode,

    /// Uploaded code exceeds the configured size bound.
    #[error("uploaded code is {size} bytes, above the {max} byte limit")]
    TooLarge {
        /// Observed size in bytes.
        size: usize,
        /// Configured bound in bytes.
        max: usize,
    },

    /// Code with this checksum is already stored.
    #[error("code with checksum {checksum} is already stored")]
    Duplicate {
        /// The existing checksum.
        checksum: Checksum,
    },

    /// No code is stored under the checksum.
    #[error("no code stored for checksum {checksum}")]
    NotFound {
        /// The unknown checksum.
        checksum: Checksum,
    },

    /// The upload carried the gzip magic bytes but did not decompress.
    #[error("gzip decompression failed: {reason}")]
    InvalidGzip {
        /// The decoder failure.
        reason: String,
    },
}
