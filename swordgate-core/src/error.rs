use thiserror::Error;

use crate::uri;

/// Failure taxonomy for deposit negotiation and ingest.
///
/// Rejections ([`Malformed`](SwordError::Malformed),
/// [`UnacceptableContentType`](SwordError::UnacceptableContentType),
/// [`UnacceptablePackaging`](SwordError::UnacceptablePackaging)) are
/// client-request errors and terminal for the current request.
/// [`Storage`](SwordError::Storage) wraps backend persistence faults raised
/// during ingest; [`Dump`](SwordError::Dump) covers failures while writing
/// the forensic dump of a failed deposit.
#[derive(Debug, Error)]
pub enum SwordError {
    /// The `Accept` header was present but contained an unparsable
    /// fragment, e.g. a quality value that is not a number.
    #[error("malformed Accept header: {0}")]
    Malformed(String),

    /// The declared MIME type is not in the policy's acceptable set for
    /// the target container.
    #[error("unacceptable content type in deposit request: {mime_type} for object {target}")]
    UnacceptableContentType { mime_type: String, target: String },

    /// The declared packaging identifier is not accepted for the target
    /// container.
    #[error("unacceptable packaging type in deposit request: {packaging} for object {target}")]
    UnacceptablePackaging { packaging: String, target: String },

    /// A persistence or I/O fault from the repository backend while
    /// archiving originals. Not retried; partial writes performed before
    /// the failure are not rolled back.
    #[error("storage failure during ingest")]
    Storage(#[source] anyhow::Error),

    /// The fallback directory is missing or a dump file could not be
    /// written.
    #[error("failure dump error: {0}")]
    Dump(#[from] std::io::Error),
}

impl SwordError {
    /// The protocol error URI for this failure, where one is defined.
    ///
    /// Storage and dump failures are server-side faults with no protocol
    /// error document, so they return `None`.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Malformed(_) => Some(uri::ERROR_BAD_REQUEST),
            Self::UnacceptableContentType { .. } | Self::UnacceptablePackaging { .. } => {
                Some(uri::ERROR_CONTENT)
            }
            Self::Storage(_) | Self::Dump(_) => None,
        }
    }
}
