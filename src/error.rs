use thiserror::Error;

/// Reasons a playlist is judged unplayable
///
/// The `Display` text is what ends up in the `reason` field of a rejected
/// [`crate::PlaylistInfo`].
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("No .ts segments found")]
    NoSegments,

    #[error("Invalid segment: {url} - {status}")]
    InvalidSegment { url: String, status: u16 },

    #[error("Master playlist lists no variants")]
    NoVariants,

    #[error("Variant nesting exceeds {0} levels")]
    TooManyHops(usize),

    #[error("Invalid playlist URL: {0}")]
    InvalidUrl(String),

    #[error("Document is not a valid M3U8 playlist")]
    Parse,

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}
