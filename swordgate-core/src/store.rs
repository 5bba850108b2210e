use std::fmt;
use std::future::Future;

use tokio::io::AsyncRead;

/// Identity of the repository object a deposit is being added to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A known file format, resolved from a MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRecord {
    pub mime_type: String,
    pub description: String,
    /// File extensions for this format, most canonical first.
    pub extensions: Vec<String>,
}

/// Per-request record of what ingest has produced so far.
///
/// Carries the optional reference to the payload designated as the
/// original deposit. `P` is the backend's payload handle type.
#[derive(Debug, Clone)]
pub struct IngestResult<P> {
    original_deposit: Option<P>,
}

impl<P> IngestResult<P> {
    pub fn new() -> Self {
        Self {
            original_deposit: None,
        }
    }

    /// The payload designated as the original deposit, if any.
    pub fn original_deposit(&self) -> Option<&P> {
        self.original_deposit.as_ref()
    }

    /// Designates `payload` as the original deposit unless a payload has
    /// already been designated — an existing reference is never
    /// overwritten.
    pub fn record_original_deposit(&mut self, payload: P) {
        if self.original_deposit.is_none() {
            self.original_deposit = Some(payload);
        }
    }
}

impl<P> Default for IngestResult<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Contract the repository backend must provide for originals archiving.
///
/// The engine is generic over this trait so production backends and
/// in-memory test stores plug in the same way. All mutating calls may be
/// subject to the backend's authorization checks;
/// [`suspend_authorization`](RepositoryStore::suspend_authorization)
/// brackets the archiver's storage sequence.
///
/// Serialization of concurrent modifications to the same container is the
/// backend's responsibility; the engine introduces no locks of its own.
pub trait RepositoryStore: Send + Sync + 'static {
    /// Handle to a named payload grouping inside a container.
    type Bundle: Send + Sync;
    /// Handle to a persisted binary artifact.
    type Payload: Clone + Send + Sync;
    /// Scoped suspension of authorization checks; enforcement resumes
    /// when the guard is dropped, on every exit path.
    type Guard: Send;

    /// Looks up the bundle named `name` on `container`, if present.
    fn find_bundle<'a>(
        &'a self,
        container: &'a ContainerId,
        name: &'a str,
    ) -> impl Future<Output = anyhow::Result<Option<Self::Bundle>>> + Send + 'a;

    /// Creates a new bundle named `name` on `container`.
    fn create_bundle<'a>(
        &'a self,
        container: &'a ContainerId,
        name: &'a str,
    ) -> impl Future<Output = anyhow::Result<Self::Bundle>> + Send + 'a;

    /// Streams `content` into a new payload inside `bundle`.
    fn create_payload<'a>(
        &'a self,
        bundle: &'a Self::Bundle,
        content: impl AsyncRead + Send + Unpin + 'a,
    ) -> impl Future<Output = anyhow::Result<Self::Payload>> + Send + 'a;

    /// Applies name, description and an optional format tag to `payload`.
    fn describe_payload<'a>(
        &'a self,
        payload: &'a Self::Payload,
        name: &'a str,
        description: &'a str,
        format: Option<&'a FormatRecord>,
    ) -> impl Future<Output = anyhow::Result<()>> + Send + 'a;

    /// Resolves a format record by MIME type. An unknown MIME type is
    /// `Ok(None)`, not an error.
    fn resolve_format<'a>(
        &'a self,
        mime_type: &'a str,
    ) -> impl Future<Output = anyhow::Result<Option<FormatRecord>>> + Send + 'a;

    /// Persists pending updates to `bundle`.
    fn commit_bundle<'a>(
        &'a self,
        bundle: &'a Self::Bundle,
    ) -> impl Future<Output = anyhow::Result<()>> + Send + 'a;

    /// Persists pending updates to `container`.
    fn commit_container<'a>(
        &'a self,
        container: &'a ContainerId,
    ) -> impl Future<Output = anyhow::Result<()>> + Send + 'a;

    /// Suspends authorization checks for the lifetime of the returned
    /// guard.
    fn suspend_authorization(&self) -> Self::Guard;
}
