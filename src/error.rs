//! Error types for the resume2json library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`RasterError`] — a document could not be turned into page images
//!   (unsupported format, zero pages, render failure). Raised by the
//!   rasteriser and consumed by the vision tier, which treats any of
//!   these as "vision unavailable" and lets the pipeline move on.
//!
//! * [`TierError`] — one extraction tier failed. Stored in the tier's
//!   [`crate::pipeline::TierOutcome`] and logged; the pipeline driver
//!   recovers by advancing to the next tier, so none of these ever
//!   reaches the entry-point caller.
//!
//! The extraction entry point itself is infallible: every failure path
//! terminates in the deterministic fallback parser, which always returns
//! a structurally complete record.

use crate::providers::ProviderError;
use thiserror::Error;

/// Failure to rasterise a document into page images.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The document is neither a PDF nor a supported raster image.
    #[error("unsupported document format '{media_type}' for '{filename}'")]
    UnsupportedFormat { media_type: String, filename: String },

    /// The document parsed but produced zero renderable pages.
    #[error("document has no renderable pages")]
    NoPages,

    /// A page failed to render or encode; no partial page sets are kept.
    #[error("rasterisation failed: {detail}")]
    RasterizationFailed { detail: String },
}

/// A non-fatal failure of a single extraction tier.
///
/// Always recovered by the pipeline driver; carried here so the attempt
/// log can say *why* a tier was passed over.
#[derive(Debug, Error)]
pub enum TierError {
    /// The vision tier could not obtain page images.
    #[error(transparent)]
    Raster(#[from] RasterError),

    /// A provider call failed at the transport or API level.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The provider answered, but no usable JSON could be recovered
    /// (or the object failed the tier's acceptance check).
    #[error("{provider} returned an unusable response")]
    InvalidResponse { provider: String },

    /// The tier call exceeded its configured deadline.
    #[error("tier timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Every model/attempt budget of the tier was spent without success.
    #[error("tier exhausted all attempts; last error: {last}")]
    Exhausted { last: String },

    /// The surrounding request was cancelled mid-tier.
    #[error("extraction cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_display() {
        let e = RasterError::UnsupportedFormat {
            media_type: "application/zip".into(),
            filename: "resume.zip".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("application/zip"));
        assert!(msg.contains("resume.zip"));
    }

    #[test]
    fn tier_error_wraps_raster() {
        let e = TierError::from(RasterError::NoPages);
        assert!(e.to_string().contains("no renderable pages"));
    }

    #[test]
    fn timeout_display() {
        let e = TierError::Timeout { secs: 45 };
        assert!(e.to_string().contains("45s"));
    }
}
