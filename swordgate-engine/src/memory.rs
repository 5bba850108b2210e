use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::bail;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

use swordgate_core::store::{ContainerId, FormatRecord, RepositoryStore};

/// Handle to a bundle held by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleHandle {
    container: ContainerId,
    name: String,
}

/// Handle to a payload held by a [`MemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PayloadHandle(u64);

/// Snapshot of a stored payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadRecord {
    pub name: String,
    pub description: String,
    pub format: Option<FormatRecord>,
    pub content: Bytes,
    pub size_bytes: u64,
    pub sha256_hex: String,
}

#[derive(Default)]
struct Inner {
    formats: Vec<FormatRecord>,
    /// Payload membership per (container, bundle name).
    bundles: HashMap<(ContainerId, String), Vec<u64>>,
    payloads: HashMap<u64, PayloadRecord>,
    next_payload: u64,
    auth_suspensions: u32,
    enforcing: bool,
    bundle_commits: u32,
    container_commits: u32,
    fail_next_payload: bool,
}

impl Inner {
    fn check_write(&self, operation: &str) -> anyhow::Result<()> {
        if self.enforcing && self.auth_suspensions == 0 {
            bail!("authorization denied: {operation} requires suspended authorization checks");
        }
        Ok(())
    }
}

/// An in-memory repository store.
///
/// Implements [`RepositoryStore`] for tests and embedding, the way an
/// in-memory transport stands in for TCP. Interior mutability mirrors a
/// backend's own concurrency control; the engine adds no locks.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

/// Restores authorization enforcement when dropped.
pub struct AuthGuard {
    inner: Arc<Mutex<Inner>>,
}

impl Drop for AuthGuard {
    fn drop(&mut self) {
        let mut inner = lock(&self.inner);
        inner.auth_suspensions = inner.auth_suspensions.saturating_sub(1);
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that denies mutating calls unless authorization
    /// checks are suspended, like a real repository backend would.
    pub fn enforcing() -> Self {
        let store = Self::default();
        lock(&store.inner).enforcing = true;
        store
    }

    /// Registers a known format for MIME-type resolution.
    pub fn register_format(&self, format: FormatRecord) {
        lock(&self.inner).formats.push(format);
    }

    /// Makes the next `create_payload` call fail. Test hook for
    /// exercising mid-sequence storage faults.
    pub fn fail_next_payload(&self) {
        lock(&self.inner).fail_next_payload = true;
    }

    /// Names of the bundles present on `container`.
    pub fn bundle_names(&self, container: &ContainerId) -> Vec<String> {
        lock(&self.inner)
            .bundles
            .keys()
            .filter(|(owner, _)| owner == container)
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Snapshots of the payloads inside the named bundle, in storage
    /// order.
    pub fn payloads_in(&self, container: &ContainerId, bundle: &str) -> Vec<PayloadRecord> {
        let inner = lock(&self.inner);
        inner
            .bundles
            .get(&(container.clone(), bundle.to_string()))
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.payloads.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Snapshot of a single payload, if present.
    pub fn payload(&self, handle: PayloadHandle) -> Option<PayloadRecord> {
        lock(&self.inner).payloads.get(&handle.0).cloned()
    }

    /// Total number of payloads across all bundles.
    pub fn payload_count(&self) -> usize {
        lock(&self.inner).payloads.len()
    }

    pub fn bundle_commit_count(&self) -> u32 {
        lock(&self.inner).bundle_commits
    }

    pub fn container_commit_count(&self) -> u32 {
        lock(&self.inner).container_commits
    }

    /// Whether at least one authorization suspension is active.
    pub fn authorization_suspended(&self) -> bool {
        lock(&self.inner).auth_suspensions > 0
    }
}

impl RepositoryStore for MemoryStore {
    type Bundle = BundleHandle;
    type Payload = PayloadHandle;
    type Guard = AuthGuard;

    fn find_bundle<'a>(
        &'a self,
        container: &'a ContainerId,
        name: &'a str,
    ) -> impl Future<Output = anyhow::Result<Option<BundleHandle>>> + Send + 'a {
        async move {
            let inner = lock(&self.inner);
            let key = (container.clone(), name.to_string());
            Ok(inner.bundles.contains_key(&key).then(|| BundleHandle {
                container: container.clone(),
                name: name.to_string(),
            }))
        }
    }

    fn create_bundle<'a>(
        &'a self,
        container: &'a ContainerId,
        name: &'a str,
    ) -> impl Future<Output = anyhow::Result<BundleHandle>> + Send + 'a {
        async move {
            let mut inner = lock(&self.inner);
            inner.check_write("create_bundle")?;
            let key = (container.clone(), name.to_string());
            if inner.bundles.contains_key(&key) {
                bail!("bundle {name} already exists on {container}");
            }
            inner.bundles.insert(key, Vec::new());
            debug!(container = %container, bundle = %name, "Bundle created");
            Ok(BundleHandle {
                container: container.clone(),
                name: name.to_string(),
            })
        }
    }

    fn create_payload<'a>(
        &'a self,
        bundle: &'a BundleHandle,
        content: impl AsyncRead + Send + Unpin + 'a,
    ) -> impl Future<Output = anyhow::Result<PayloadHandle>> + Send + 'a {
        async move {
            {
                let mut inner = lock(&self.inner);
                inner.check_write("create_payload")?;
                if inner.fail_next_payload {
                    inner.fail_next_payload = false;
                    bail!("injected payload creation failure");
                }
            }

            // Bounded-buffer copy: hash and accumulate chunk by chunk
            // rather than waiting on one large read.
            let mut content = content;
            let mut hasher = Sha256::new();
            let mut data = Vec::new();
            let mut buf = [0u8; 8192];
            loop {
                let n = content.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
                data.extend_from_slice(&buf[..n]);
            }

            let mut inner = lock(&self.inner);
            let key = (bundle.container.clone(), bundle.name.clone());
            let id = inner.next_payload;
            {
                let Some(members) = inner.bundles.get_mut(&key) else {
                    bail!(
                        "bundle {} not found on {} while storing payload",
                        bundle.name,
                        bundle.container
                    );
                };
                members.push(id);
            }
            inner.next_payload += 1;

            let size_bytes = data.len() as u64;
            let record = PayloadRecord {
                name: String::new(),
                description: String::new(),
                format: None,
                content: Bytes::from(data),
                size_bytes,
                sha256_hex: format!("{:x}", hasher.finalize()),
            };
            inner.payloads.insert(id, record);
            debug!(bundle = %bundle.name, payload = id, size = size_bytes, "Payload stored");
            Ok(PayloadHandle(id))
        }
    }

    fn describe_payload<'a>(
        &'a self,
        payload: &'a PayloadHandle,
        name: &'a str,
        description: &'a str,
        format: Option<&'a FormatRecord>,
    ) -> impl Future<Output = anyhow::Result<()>> + Send + 'a {
        async move {
            let mut inner = lock(&self.inner);
            inner.check_write("describe_payload")?;
            let Some(record) = inner.payloads.get_mut(&payload.0) else {
                bail!("payload {} not found", payload.0);
            };
            record.name = name.to_string();
            record.description = description.to_string();
            record.format = format.cloned();
            Ok(())
        }
    }

    fn resolve_format<'a>(
        &'a self,
        mime_type: &'a str,
    ) -> impl Future<Output = anyhow::Result<Option<FormatRecord>>> + Send + 'a {
        async move {
            let inner = lock(&self.inner);
            Ok(inner
                .formats
                .iter()
                .find(|format| format.mime_type.eq_ignore_ascii_case(mime_type))
                .cloned())
        }
    }

    fn commit_bundle<'a>(
        &'a self,
        bundle: &'a BundleHandle,
    ) -> impl Future<Output = anyhow::Result<()>> + Send + 'a {
        async move {
            let mut inner = lock(&self.inner);
            inner.check_write("commit_bundle")?;
            let key = (bundle.container.clone(), bundle.name.clone());
            if !inner.bundles.contains_key(&key) {
                bail!("bundle {} not found on {}", bundle.name, bundle.container);
            }
            inner.bundle_commits += 1;
            Ok(())
        }
    }

    fn commit_container<'a>(
        &'a self,
        container: &'a ContainerId,
    ) -> impl Future<Output = anyhow::Result<()>> + Send + 'a {
        async move {
            let mut inner = lock(&self.inner);
            inner.check_write("commit_container")?;
            inner.container_commits += 1;
            debug!(container = %container, "Container committed");
            Ok(())
        }
    }

    fn suspend_authorization(&self) -> AuthGuard {
        lock(&self.inner).auth_suspensions += 1;
        AuthGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}
