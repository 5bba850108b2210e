use std::path::PathBuf;

use anyhow::{Context, bail};
use bytes::Bytes;
use tokio::io::AsyncRead;

/// The serialized metadata-entry document accompanying a deposit.
///
/// Entry documents are always XML; the transport layer hands the engine
/// the document in its serialized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwordEntry {
    document: String,
}

impl SwordEntry {
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
        }
    }

    /// The serialized XML document.
    pub fn as_xml(&self) -> &str {
        &self.document
    }

    /// The document as a byte payload for storage.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.document.as_bytes())
    }
}

/// Where the binary content of a deposit lives.
#[derive(Debug, Clone)]
pub enum DepositContent {
    /// No binary part (entry-only deposits).
    None,
    /// Small payloads the transport already buffered in memory.
    Bytes(Bytes),
    /// Larger payloads spooled to a temp file by the transport layer.
    TempFile(PathBuf),
}

/// One inbound submission to be ingested as or added to a repository
/// object.
///
/// Immutable once received; owned by the request lifecycle. The deposit
/// carries a metadata-entry document, binary content, or both — the mode
/// queries ([`is_entry_only`](Deposit::is_entry_only),
/// [`is_binary_only`](Deposit::is_binary_only),
/// [`is_multipart`](Deposit::is_multipart)) derive from which parts are
/// present.
#[derive(Debug, Clone)]
pub struct Deposit {
    mime_type: String,
    packaging: String,
    filename: Option<String>,
    slug: Option<String>,
    entry: Option<SwordEntry>,
    content: DepositContent,
}

impl Deposit {
    /// Creates a deposit with the declared MIME type and packaging
    /// identifier and no parts attached yet.
    pub fn new(mime_type: impl Into<String>, packaging: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            packaging: packaging.into(),
            filename: None,
            slug: None,
            entry: None,
            content: DepositContent::None,
        }
    }

    /// Attaches the client-supplied filename.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Attaches the client-supplied slug.
    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Attaches the metadata-entry document.
    #[must_use]
    pub fn with_entry(mut self, entry: SwordEntry) -> Self {
        self.entry = Some(entry);
        self
    }

    /// Attaches the binary content source.
    #[must_use]
    pub fn with_content(mut self, content: DepositContent) -> Self {
        self.content = content;
        self
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn packaging(&self) -> &str {
        &self.packaging
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    pub fn entry(&self) -> Option<&SwordEntry> {
        self.entry.as_ref()
    }

    /// Whether the deposit carries only a metadata-entry document.
    pub fn is_entry_only(&self) -> bool {
        self.entry.is_some() && !self.has_binary_content()
    }

    /// Whether the deposit carries only binary content.
    pub fn is_binary_only(&self) -> bool {
        self.entry.is_none() && self.has_binary_content()
    }

    /// Whether the deposit carries both an entry document and binary
    /// content.
    pub fn is_multipart(&self) -> bool {
        self.entry.is_some() && self.has_binary_content()
    }

    fn has_binary_content(&self) -> bool {
        !matches!(self.content, DepositContent::None)
    }

    /// Opens the binary content for streaming.
    ///
    /// # Errors
    ///
    /// Returns an error when the deposit has no binary part, or when a
    /// spooled temp file cannot be opened.
    pub async fn open(&self) -> anyhow::Result<Box<dyn AsyncRead + Send + Unpin>> {
        match &self.content {
            DepositContent::None => bail!("deposit has no binary content"),
            DepositContent::Bytes(bytes) => Ok(Box::new(std::io::Cursor::new(bytes.clone()))),
            DepositContent::TempFile(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("failed to open spooled deposit {}", path.display()))?;
                Ok(Box::new(file))
            }
        }
    }
}

/// Resolved identity of the depositor, plus an optional "on behalf of"
/// identity for mediated deposits. Read-only during ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    username: String,
    on_behalf_of: Option<String>,
}

impl AuthContext {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            on_behalf_of: None,
        }
    }

    /// Marks the deposit as mediated on behalf of another identity.
    #[must_use]
    pub fn with_on_behalf_of(mut self, identity: impl Into<String>) -> Self {
        self.on_behalf_of = Some(identity.into());
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn on_behalf_of(&self) -> Option<&str> {
        self.on_behalf_of.as_deref()
    }
}
